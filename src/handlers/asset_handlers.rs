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
    models::{Asset, AssetCreate, AssetUpdate},
    AppState,
};

pub async fn list_assets(State(state): State<AppState>) -> Result<Json<Vec<Asset>>, ApiError> {
    Ok(Json(state.asset_service.list().await?))
}

pub async fn get_asset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Asset>, ApiError> {
    Ok(Json(state.asset_service.get(&id).await?))
}

pub async fn create_asset(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiJson(payload): ApiJson<AssetCreate>,
) -> Result<(StatusCode, Json<Asset>), ApiError> {
    user.require(Permission::ManageAssets)?;
    let asset = state.asset_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

pub async fn update_asset(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<AssetUpdate>,
) -> Result<Json<Asset>, ApiError> {
    user.require(Permission::ManageAssets)?;
    Ok(Json(state.asset_service.update(&id, payload).await?))
}

pub async fn delete_asset(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::ManageAssets)?;
    state.asset_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
