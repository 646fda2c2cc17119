use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use super::ApiJson;
use crate::{
    auth::{rbac::Permission, UserContext},
    error::ApiError,
    models::{Scan, ScanDetailResponse, ScanLaunch, ScanListResponse},
    services::external::ScanProgress,
    AppState,
};

pub async fn list_scans(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<ScanListResponse>>, ApiError> {
    user.require(Permission::ViewScans)?;
    Ok(Json(state.scan_service.list().await?))
}

pub async fn launch_scan(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiJson(payload): ApiJson<ScanLaunch>,
) -> Result<(StatusCode, Json<Scan>), ApiError> {
    user.require(Permission::LaunchScans)?;
    let scan = state.scan_service.launch(payload).await?;
    Ok((StatusCode::CREATED, Json(scan)))
}

pub async fn get_scan(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<ScanDetailResponse>, ApiError> {
    user.require(Permission::ViewScans)?;
    Ok(Json(state.scan_service.get(&id).await?))
}

pub async fn delete_scan(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::LaunchScans)?;
    state.scan_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pull the current scan state from the node
pub async fn refresh_scan(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Scan>, ApiError> {
    user.require(Permission::ViewScans)?;
    Ok(Json(state.scan_service.refresh(&id).await?))
}

/// Progress report pushed by a scan node. The node is identified by the
/// callback URL it was handed at launch.
pub async fn scan_callback(
    State(state): State<AppState>,
    Path(node_id): Path<Uuid>,
    ApiJson(progress): ApiJson<ScanProgress>,
) -> Result<StatusCode, ApiError> {
    state.scan_service.apply_progress(&node_id, progress).await?;
    Ok(StatusCode::NO_CONTENT)
}
