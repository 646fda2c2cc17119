use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{Asset, AssetCreate},
};

#[async_trait]
pub trait AssetRepository {
    async fn create(&self, asset: &AssetCreate) -> Result<Asset, ApiError>;
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Asset>, ApiError>;
    /// Fetch the given assets; ids that do not exist are silently skipped
    async fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Asset>, ApiError>;
    async fn list(&self) -> Result<Vec<Asset>, ApiError>;
    async fn list_by_scan(&self, scan_id: &Uuid) -> Result<Vec<Asset>, ApiError>;
    async fn update(&self, id: &Uuid, asset: &AssetCreate) -> Result<Asset, ApiError>;
    async fn delete(&self, id: &Uuid) -> Result<(), ApiError>;
    async fn count(&self) -> Result<i64, ApiError>;
}

pub struct SqlxAssetRepository {
    pool: DatabasePool,
}

impl SqlxAssetRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetRepository for SqlxAssetRepository {
    async fn create(&self, asset: &AssetCreate) -> Result<Asset, ApiError> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let result = sqlx::query_as::<_, Asset>(
            r#"
            INSERT INTO assets (id, url, description, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, url, description, created_at
            "#,
        )
        .bind(id)
        .bind(&asset.url)
        .bind(&asset.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Asset>, ApiError> {
        let result = sqlx::query_as::<_, Asset>(
            "SELECT id, url, description, created_at FROM assets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Asset>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = sqlx::query_as::<_, Asset>(
            r#"
            SELECT id, url, description, created_at
            FROM assets
            WHERE id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn list(&self) -> Result<Vec<Asset>, ApiError> {
        let results = sqlx::query_as::<_, Asset>(
            r#"
            SELECT id, url, description, created_at
            FROM assets
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn list_by_scan(&self, scan_id: &Uuid) -> Result<Vec<Asset>, ApiError> {
        let results = sqlx::query_as::<_, Asset>(
            r#"
            SELECT a.id, a.url, a.description, a.created_at
            FROM assets a
            JOIN assets_scans link ON link.asset_id = a.id
            WHERE link.scan_id = $1
            ORDER BY a.created_at ASC
            "#,
        )
        .bind(scan_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn update(&self, id: &Uuid, asset: &AssetCreate) -> Result<Asset, ApiError> {
        let result = sqlx::query_as::<_, Asset>(
            r#"
            UPDATE assets
            SET url = $1, description = $2
            WHERE id = $3
            RETURNING id, url, description, created_at
            "#,
        )
        .bind(&asset.url)
        .bind(&asset.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.ok_or_else(|| ApiError::NotFound(format!("Asset with id {} not found", id)))
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        // Scan links go with the asset (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM assets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Asset with id {} not found", id)));
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assets")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
