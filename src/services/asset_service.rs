use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{Asset, AssetCreate, AssetUpdate},
    repositories::AssetRepository,
};

pub struct AssetService {
    asset_repo: Arc<dyn AssetRepository + Send + Sync>,
}

impl AssetService {
    pub fn new(asset_repo: Arc<dyn AssetRepository + Send + Sync>) -> Self {
        Self { asset_repo }
    }

    pub async fn list(&self) -> Result<Vec<Asset>, ApiError> {
        self.asset_repo.list().await
    }

    pub async fn get(&self, id: &Uuid) -> Result<Asset, ApiError> {
        self.asset_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Asset {} not found", id)))
    }

    pub async fn create(&self, asset: AssetCreate) -> Result<Asset, ApiError> {
        let asset = asset.normalized();
        asset.validate()?;

        let created = self.asset_repo.create(&asset).await?;
        tracing::info!(asset_id = %created.id, url = %created.url, "asset created");
        Ok(created)
    }

    pub async fn update(&self, id: &Uuid, update: AssetUpdate) -> Result<Asset, ApiError> {
        let existing = self.get(id).await?;
        let merged = update.apply_to(&existing)?;
        self.asset_repo.update(id, &merged).await
    }

    pub async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        self.asset_repo.delete(id).await?;
        tracing::info!(asset_id = %id, "asset deleted");
        Ok(())
    }
}
