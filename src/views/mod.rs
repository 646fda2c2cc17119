//! Server-side HTML rendering for the dashboard pages.
//!
//! Dynamic text passes through [`escape`], attribute values through
//! [`escape_attr`].

mod pages;

pub use pages::*;

use std::fmt::Write;

use crate::auth::UserContext;

/// Escape text placed in element content
pub fn escape(input: &str) -> String {
    html_escape::encode_text(input).into_owned()
}

/// Escape a value placed inside a double-quoted attribute
pub fn escape_attr(input: &str) -> String {
    html_escape::encode_double_quoted_attribute(input).into_owned()
}

const STYLE: &str = "body{font-family:sans-serif;margin:0;color:#222}\
nav{background:#ff6633;padding:.6em 1em}nav a{color:#fff;margin-right:1em;text-decoration:none}\
nav .user{float:right;color:#fff}main{padding:1em 2em}\
table{border-collapse:collapse;width:100%;margin-bottom:1.5em}\
th,td{border-bottom:1px solid #ddd;padding:.4em;text-align:left;vertical-align:top}\
.error{background:#fdd;border:1px solid #c00;padding:.6em;margin-bottom:1em}\
.notice{background:#dfd;border:1px solid #0a0;padding:.6em;margin-bottom:1em}\
form.inline{display:inline}label{display:block;margin-top:.5em}\
textarea{width:30em;height:4em}pre{background:#f6f6f6;padding:1em;overflow:auto}";

/// Wrap page content in the common document shell
pub fn layout(title: &str, user: Option<&UserContext>, body: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{} | Burp Enterprize</title><style>{}</style></head><body>",
        escape(title),
        STYLE
    );

    if let Some(user) = user {
        let _ = write!(
            html,
            "<nav><a href=\"/\">Dashboard</a><a href=\"/nodes\">Nodes</a>\
             <a href=\"/assets\">Assets</a><a href=\"/scans\">Scans</a>\
             <span class=\"user\">{} ({}) <a href=\"/logout\">Log out</a></span></nav>",
            escape(user.display_name()),
            user.role
        );
    }

    let _ = write!(html, "<main><h1>{}</h1>{}</main></body></html>", escape(title), body);
    html
}

pub(crate) fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(msg) => format!("<div class=\"error\">{}</div>", escape(msg)),
        None => String::new(),
    }
}
