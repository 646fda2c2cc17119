use axum::{extract::State, http::StatusCode, Extension, Json};

use super::ApiJson;
use crate::{
    auth::{rbac::Permission, UserContext},
    error::ApiError,
    models::{User, UserCreate},
    AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<User>>, ApiError> {
    user.require(Permission::ManageUsers)?;
    Ok(Json(state.auth_service.list_users().await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiJson(payload): ApiJson<UserCreate>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    user.require(Permission::ManageUsers)?;
    let created = state.auth_service.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
