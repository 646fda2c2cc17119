//! Server-rendered dashboard pages.
//!
//! Form posts redirect on success. Failures re-render the page with the
//! error message and the status the JSON API would have used.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::{cookie::PrivateCookieJar, Form as MultiForm};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{rbac::Permission, UserContext},
    error::ApiError,
    handlers::auth_handlers::{clear_session_cookie, session_cookie},
    middleware::resolve_user_context,
    models::{AssetCreate, NodeCreate, ScanLaunch},
    views, AppState,
};

const RECENT_SCANS: i64 = 10;

/// Error rendered as an HTML page instead of a JSON body
pub struct PageError {
    error: ApiError,
    user: Option<UserContext>,
}

impl PageError {
    fn for_user(error: ApiError, user: &UserContext) -> Self {
        Self {
            error,
            user: Some(user.clone()),
        }
    }
}

impl From<ApiError> for PageError {
    fn from(error: ApiError) -> Self {
        Self { error, user: None }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        self.error.log(&error_id);
        let (status, _) = self.error.status_and_code();
        let page = views::error_page(status, &self.error.public_message(), self.user.as_ref());
        (status, Html(page)).into_response()
    }
}

type PageResult = Result<Response, PageError>;

/// Render `page` with the status of a failed form submission
fn rejected(error: &ApiError, page: String) -> Response {
    let error_id = Uuid::new_v4();
    error.log(&error_id);
    (error.status_and_code().0, Html(page)).into_response()
}

fn see_other(location: &str) -> Response {
    Redirect::to(location).into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub async fn login_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: PrivateCookieJar,
) -> Response {
    if resolve_user_context(&state, &headers, &jar).is_some() {
        return see_other("/");
    }
    Html(views::login_page(None, None)).into_response()
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> PageResult {
    match state
        .auth_service
        .login_local(&form.email, &form.password)
        .await
    {
        Ok(session) => {
            let jar = session_cookie(&state, jar, &session)?;
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(e @ ApiError::Authentication(_)) => Ok(rejected(
            &e,
            views::login_page(Some(&e.public_message()), Some(&form.email)),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(jar: PrivateCookieJar) -> Response {
    (clear_session_cookie(jar), Redirect::to("/login")).into_response()
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
) -> PageResult {
    let summary = state
        .scan_service
        .dashboard(RECENT_SCANS)
        .await
        .map_err(|e| PageError::for_user(e, &user))?;
    Ok(Html(views::dashboard_page(&user, &summary)).into_response())
}

async fn render_nodes(
    state: &AppState,
    user: &UserContext,
    error: Option<&str>,
) -> Result<String, PageError> {
    let nodes = state
        .node_service
        .list()
        .await
        .map_err(|e| PageError::for_user(e, user))?;
    Ok(views::nodes_page(
        user,
        &nodes,
        user.has_permission(Permission::ManageNodes),
        error,
    ))
}

pub async fn nodes(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
) -> PageResult {
    Ok(Html(render_nodes(&state, &user, None).await?).into_response())
}

#[derive(Debug, Deserialize)]
pub struct NodeForm {
    pub description: String,
    pub protocol: String,
    pub hostname: String,
    pub port: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl NodeForm {
    fn into_create(self) -> Result<NodeCreate, ApiError> {
        let port = self
            .port
            .trim()
            .parse::<i32>()
            .map_err(|_| ApiError::validation(format!("Invalid port '{}'", self.port)))?;
        Ok(NodeCreate {
            description: self.description,
            protocol: self.protocol,
            hostname: self.hostname,
            port,
            api_key: self.api_key,
        })
    }
}

pub async fn create_node(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Form(form): Form<NodeForm>,
) -> PageResult {
    let result = match user.require(Permission::ManageNodes) {
        Ok(()) => match form.into_create() {
            Ok(create) => state.node_service.create(create).await.map(|_| ()),
            Err(e) => Err(e),
        },
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(see_other("/nodes")),
        Err(e) => {
            let page = render_nodes(&state, &user, Some(&e.public_message())).await?;
            Ok(rejected(&e, page))
        }
    }
}

pub async fn delete_node(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> PageResult {
    let result = match user.require(Permission::ManageNodes) {
        Ok(()) => state.node_service.delete(&id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(see_other("/nodes")),
        Err(e) => {
            let page = render_nodes(&state, &user, Some(&e.public_message())).await?;
            Ok(rejected(&e, page))
        }
    }
}

async fn render_assets(
    state: &AppState,
    user: &UserContext,
    error: Option<&str>,
) -> Result<String, PageError> {
    let assets = state
        .asset_service
        .list()
        .await
        .map_err(|e| PageError::for_user(e, user))?;
    Ok(views::assets_page(user, &assets, error))
}

pub async fn assets(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
) -> PageResult {
    Ok(Html(render_assets(&state, &user, None).await?).into_response())
}

pub async fn create_asset(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Form(form): Form<AssetCreate>,
) -> PageResult {
    let result = match user.require(Permission::ManageAssets) {
        Ok(()) => state.asset_service.create(form).await.map(|_| ()),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(see_other("/assets")),
        Err(e) => {
            let page = render_assets(&state, &user, Some(&e.public_message())).await?;
            Ok(rejected(&e, page))
        }
    }
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> PageResult {
    let result = match user.require(Permission::ManageAssets) {
        Ok(()) => state.asset_service.delete(&id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(see_other("/assets")),
        Err(e) => {
            let page = render_assets(&state, &user, Some(&e.public_message())).await?;
            Ok(rejected(&e, page))
        }
    }
}

async fn render_scans(
    state: &AppState,
    user: &UserContext,
    error: Option<&str>,
) -> Result<String, PageError> {
    let load = async {
        let scans = state.scan_service.list().await?;
        let nodes = state.node_service.list().await?;
        let assets = state.asset_service.list().await?;
        Ok::<_, ApiError>(views::scans_page(user, &scans, &nodes, &assets, error))
    };
    load.await.map_err(|e| PageError::for_user(e, user))
}

pub async fn scans(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
) -> PageResult {
    Ok(Html(render_scans(&state, &user, None).await?).into_response())
}

/// Launch form; `asset_ids` repeats once per ticked checkbox
#[derive(Debug, Deserialize)]
pub struct ScanLaunchForm {
    pub description: String,
    pub node_id: Uuid,
    #[serde(default)]
    pub asset_ids: Vec<Uuid>,
    #[serde(default)]
    pub credentials: Option<String>,
    #[serde(default)]
    pub configurations: Option<String>,
    #[serde(default)]
    pub scope_includes: Option<String>,
    #[serde(default)]
    pub scope_excludes: Option<String>,
}

impl From<ScanLaunchForm> for ScanLaunch {
    fn from(form: ScanLaunchForm) -> Self {
        ScanLaunch {
            description: form.description,
            node_id: form.node_id,
            asset_ids: form.asset_ids,
            credentials: form.credentials,
            configurations: form.configurations,
            scope_includes: form.scope_includes,
            scope_excludes: form.scope_excludes,
        }
    }
}

pub async fn launch_scan(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    MultiForm(form): MultiForm<ScanLaunchForm>,
) -> PageResult {
    let result = match user.require(Permission::LaunchScans) {
        Ok(()) => state.scan_service.launch(form.into()).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(scan) => Ok(see_other(&format!("/scans/{}", scan.id))),
        Err(e) => {
            let page = render_scans(&state, &user, Some(&e.public_message())).await?;
            Ok(rejected(&e, page))
        }
    }
}

pub async fn scan_detail(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> PageResult {
    let detail = state
        .scan_service
        .get(&id)
        .await
        .map_err(|e| PageError::for_user(e, &user))?;
    Ok(Html(views::scan_detail_page(&user, &detail, None)).into_response())
}

pub async fn refresh_scan(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> PageResult {
    match state.scan_service.refresh(&id).await {
        Ok(_) => Ok(see_other(&format!("/scans/{}", id))),
        Err(e) => {
            let detail = state
                .scan_service
                .get(&id)
                .await
                .map_err(|e| PageError::for_user(e, &user))?;
            let page = views::scan_detail_page(&user, &detail, Some(&e.public_message()));
            Ok(rejected(&e, page))
        }
    }
}

pub async fn delete_scan(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> PageResult {
    let result = match user.require(Permission::LaunchScans) {
        Ok(()) => state.scan_service.delete(&id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => Ok(see_other("/scans")),
        Err(e) => Err(PageError::for_user(e, &user)),
    }
}
