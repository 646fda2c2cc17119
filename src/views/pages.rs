use std::fmt::Write;

use axum::http::StatusCode;

use super::{error_banner, escape, escape_attr, layout};
use crate::{
    auth::UserContext,
    models::{Asset, Node, ScanDetailResponse, ScanListResponse},
    services::DashboardSummary,
};

pub fn login_page(error: Option<&str>, email: Option<&str>) -> String {
    let body = format!(
        "{}<form method=\"post\" action=\"/login\">\
         <label>Email <input type=\"email\" name=\"email\" value=\"{}\" required></label>\
         <label>Password <input type=\"password\" name=\"password\" required></label>\
         <p><button type=\"submit\">Log in</button></p></form>",
        error_banner(error),
        escape_attr(email.unwrap_or_default())
    );
    layout("Log in", None, &body)
}

pub fn error_page(status: StatusCode, message: &str, user: Option<&UserContext>) -> String {
    let body = format!(
        "<div class=\"error\">{} {}</div><p><a href=\"/\">Back to the dashboard</a></p>",
        status.as_u16(),
        escape(message)
    );
    layout(status.canonical_reason().unwrap_or("Error"), user, &body)
}

fn scan_rows(html: &mut String, scans: &[ScanListResponse]) {
    html.push_str(
        "<table><tr><th>Created</th><th>Description</th><th>Task</th><th>Status</th>\
         <th>Progress</th><th>Issues</th></tr>",
    );
    for entry in scans {
        let scan = &entry.scan;
        let _ = write!(
            html,
            "<tr><td>{}</td><td><a href=\"/scans/{}\">{}</a></td><td>{}</td><td>{}</td>\
             <td>{}% {}</td><td>{}</td></tr>",
            escape(&entry.created),
            scan.id,
            escape(&scan.description),
            escape(&scan.task_id),
            escape(&scan.scan_status),
            scan.crawl_and_audit_progress,
            escape(&scan.crawl_and_audit_caption),
            scan.issue_events
        );
    }
    html.push_str("</table>");
}

pub fn dashboard_page(user: &UserContext, summary: &DashboardSummary) -> String {
    let mut body = format!(
        "<table><tr><th>Nodes</th><th>Assets</th><th>Scans</th></tr>\
         <tr><td><a href=\"/nodes\">{}</a></td><td><a href=\"/assets\">{}</a></td>\
         <td><a href=\"/scans\">{}</a></td></tr></table><h2>Recent scans</h2>",
        summary.nodes, summary.assets, summary.scans
    );
    if summary.recent_scans.is_empty() {
        body.push_str("<p>No scans yet.</p>");
    } else {
        scan_rows(&mut body, &summary.recent_scans);
    }
    layout("Dashboard", Some(user), &body)
}

pub fn nodes_page(
    user: &UserContext,
    nodes: &[Node],
    can_manage: bool,
    error: Option<&str>,
) -> String {
    let mut body = error_banner(error);
    body.push_str(
        "<table><tr><th>Created</th><th>Description</th><th>URL</th><th>Key</th><th></th></tr>",
    );
    for node in nodes {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>",
            escape(&node.created_as_string()),
            escape(&node.description),
            escape(&node.display_url()),
            if node.has_key() { "yes" } else { "no" }
        );
        if can_manage {
            let _ = write!(
                body,
                "<form class=\"inline\" method=\"post\" action=\"/nodes/{}/delete\">\
                 <button type=\"submit\">Delete</button></form>",
                node.id
            );
        }
        body.push_str("</td></tr>");
    }
    body.push_str("</table>");

    if can_manage {
        body.push_str(
            "<h2>Add node</h2><form method=\"post\" action=\"/nodes\">\
             <label>Description <input name=\"description\" required></label>\
             <label>Protocol <select name=\"protocol\"><option>http</option>\
             <option>https</option></select></label>\
             <label>Hostname <input name=\"hostname\" required></label>\
             <label>Port <input name=\"port\" type=\"number\" min=\"1\" max=\"65535\" value=\"1337\" required></label>\
             <label>API key <input name=\"api_key\"></label>\
             <p><button type=\"submit\">Add node</button></p></form>",
        );
    }
    layout("Nodes", Some(user), &body)
}

pub fn assets_page(user: &UserContext, assets: &[Asset], error: Option<&str>) -> String {
    let mut body = error_banner(error);
    body.push_str("<table><tr><th>Created</th><th>URL</th><th>Description</th><th></th></tr>");
    for asset in assets {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>\
             <form class=\"inline\" method=\"post\" action=\"/assets/{}/delete\">\
             <button type=\"submit\">Delete</button></form></td></tr>",
            escape(&asset.created_as_string()),
            escape(&asset.url),
            escape(&asset.description),
            asset.id
        );
    }
    body.push_str(
        "</table><h2>Add asset</h2><form method=\"post\" action=\"/assets\">\
         <label>URL <input name=\"url\" type=\"url\" required></label>\
         <label>Description <input name=\"description\"></label>\
         <p><button type=\"submit\">Add asset</button></p></form>",
    );
    layout("Assets", Some(user), &body)
}

pub fn scans_page(
    user: &UserContext,
    scans: &[ScanListResponse],
    nodes: &[Node],
    assets: &[Asset],
    error: Option<&str>,
) -> String {
    let mut body = error_banner(error);
    if scans.is_empty() {
        body.push_str("<p>No scans yet.</p>");
    } else {
        scan_rows(&mut body, scans);
    }

    body.push_str("<h2>Launch scan</h2>");
    if nodes.is_empty() || assets.is_empty() {
        body.push_str("<p>Register a node and at least one asset to launch scans.</p>");
        return layout("Scans", Some(user), &body);
    }

    body.push_str(
        "<form method=\"post\" action=\"/scans\">\
         <label>Description <input name=\"description\" required></label>\
         <label>Node <select name=\"node_id\">",
    );
    for node in nodes {
        let _ = write!(
            body,
            "<option value=\"{}\">{} ({})</option>",
            node.id,
            escape(&node.description),
            escape(&node.display_url())
        );
    }
    body.push_str("</select></label><fieldset><legend>Assets</legend>");
    for asset in assets {
        let _ = write!(
            body,
            "<label><input type=\"checkbox\" name=\"asset_ids\" value=\"{}\"> {}</label>",
            asset.id,
            escape(&asset.url)
        );
    }
    body.push_str(
        "</fieldset>\
         <label>Credentials (username:password, whitespace separated) \
         <textarea name=\"credentials\"></textarea></label>\
         <label>Named configurations <textarea name=\"configurations\"></textarea></label>\
         <label>Scope includes <textarea name=\"scope_includes\"></textarea></label>\
         <label>Scope excludes <textarea name=\"scope_excludes\"></textarea></label>\
         <p><button type=\"submit\">Launch</button></p></form>",
    );
    layout("Scans", Some(user), &body)
}

pub fn scan_detail_page(
    user: &UserContext,
    detail: &ScanDetailResponse,
    error: Option<&str>,
) -> String {
    let scan = &detail.scan;
    let configuration =
        serde_json::to_string_pretty(&scan.masked_configuration()).unwrap_or_default();

    let mut body = error_banner(error);
    let _ = write!(
        body,
        "<table>\
         <tr><th>Description</th><td>{}</td></tr>\
         <tr><th>Created</th><td>{}</td></tr>\
         <tr><th>Node</th><td>{} ({})</td></tr>\
         <tr><th>Task</th><td>{}</td></tr>\
         <tr><th>Status</th><td>{}</td></tr>\
         <tr><th>Progress</th><td>{}% {}</td></tr>\
         <tr><th>Crawl requests</th><td>{}</td></tr>\
         <tr><th>Audit requests</th><td>{}</td></tr>\
         <tr><th>Issue events</th><td>{}</td></tr>\
         <tr><th>Elapsed</th><td>{}s</td></tr>\
         </table>",
        escape(&scan.description),
        escape(&detail.created),
        escape(&detail.node.description),
        escape(&detail.node.url),
        escape(&scan.task_id),
        escape(&scan.scan_status),
        scan.crawl_and_audit_progress,
        escape(&scan.crawl_and_audit_caption),
        scan.crawl_requests_made,
        scan.audit_requests_made,
        scan.issue_events,
        scan.total_elapsed_time
    );

    body.push_str("<h2>Assets</h2><ul>");
    for asset in &detail.assets {
        let _ = write!(body, "<li>{}</li>", escape(&asset.url));
    }
    let _ = write!(
        body,
        "</ul><h2>Configuration</h2><pre>{}</pre>\
         <form class=\"inline\" method=\"post\" action=\"/scans/{id}/refresh\">\
         <button type=\"submit\">Refresh</button></form> \
         <form class=\"inline\" method=\"post\" action=\"/scans/{id}/delete\">\
         <button type=\"submit\">Delete</button></form>",
        escape(&configuration),
        id = scan.id
    );
    layout("Scan", Some(user), &body)
}
