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
    models::{NodeCreate, NodeResponse, NodeStatusResponse, NodeUpdate},
    AppState,
};

pub async fn list_nodes(
    State(state): State<AppState>,
) -> Result<Json<Vec<NodeResponse>>, ApiError> {
    let nodes = state.node_service.list().await?;
    Ok(Json(nodes.iter().map(NodeResponse::from).collect()))
}

pub async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NodeResponse>, ApiError> {
    let node = state.node_service.get(&id).await?;
    Ok(Json(NodeResponse::from(&node)))
}

pub async fn create_node(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiJson(payload): ApiJson<NodeCreate>,
) -> Result<(StatusCode, Json<NodeResponse>), ApiError> {
    user.require(Permission::ManageNodes)?;
    let node = state.node_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(NodeResponse::from(&node))))
}

pub async fn update_node(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<NodeUpdate>,
) -> Result<Json<NodeResponse>, ApiError> {
    user.require(Permission::ManageNodes)?;
    let node = state.node_service.update(&id, payload).await?;
    Ok(Json(NodeResponse::from(&node)))
}

pub async fn delete_node(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::ManageNodes)?;
    state.node_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check that the node's REST API answers
pub async fn node_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NodeStatusResponse>, ApiError> {
    Ok(Json(state.node_service.status(&id).await?))
}
