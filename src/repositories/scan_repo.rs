use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{Scan, ScanMetrics, ScanRecordCreate},
};

const SCAN_COLUMNS: &str = "id, description, configuration, audit_requests_made, \
    crawl_and_audit_caption, crawl_and_audit_progress, crawl_requests_made, issue_events, \
    total_elapsed_time, scan_status, task_id, node_id, created_at, updated_at";

#[async_trait]
pub trait ScanRepository {
    /// Insert the scan together with its asset links
    async fn create(&self, scan: &ScanRecordCreate) -> Result<Scan, ApiError>;
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Scan>, ApiError>;
    /// Newest scan a node started under `task_id`. Nodes reuse task ids
    /// after a restart.
    async fn get_by_node_and_task(
        &self,
        node_id: &Uuid,
        task_id: &str,
    ) -> Result<Option<Scan>, ApiError>;
    async fn list(&self) -> Result<Vec<Scan>, ApiError>;
    async fn list_recent(&self, limit: i64) -> Result<Vec<Scan>, ApiError>;
    async fn update_metrics(&self, id: &Uuid, metrics: &ScanMetrics) -> Result<Scan, ApiError>;
    async fn delete(&self, id: &Uuid) -> Result<(), ApiError>;
    async fn count(&self) -> Result<i64, ApiError>;
    async fn count_by_node(&self, node_id: &Uuid) -> Result<i64, ApiError>;
}

pub struct SqlxScanRepository {
    pool: DatabasePool,
}

impl SqlxScanRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScanRepository for SqlxScanRepository {
    async fn create(&self, scan: &ScanRecordCreate) -> Result<Scan, ApiError> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();
        let metrics = &scan.metrics;

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO scans (id, description, configuration, audit_requests_made,
                crawl_and_audit_caption, crawl_and_audit_progress, crawl_requests_made,
                issue_events, total_elapsed_time, scan_status, task_id, node_id,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {}
            "#,
            SCAN_COLUMNS
        );

        let created = sqlx::query_as::<_, Scan>(&sql)
            .bind(id)
            .bind(&scan.description)
            .bind(&scan.configuration)
            .bind(metrics.audit_requests_made)
            .bind(&metrics.crawl_and_audit_caption)
            .bind(metrics.crawl_and_audit_progress)
            .bind(metrics.crawl_requests_made)
            .bind(metrics.issue_events)
            .bind(metrics.total_elapsed_time)
            .bind(&metrics.scan_status)
            .bind(&scan.task_id)
            .bind(scan.node_id)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        for asset_id in &scan.asset_ids {
            sqlx::query(
                "INSERT INTO assets_scans (asset_id, scan_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(asset_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Scan>, ApiError> {
        let sql = format!("SELECT {} FROM scans WHERE id = $1", SCAN_COLUMNS);
        let result = sqlx::query_as::<_, Scan>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    async fn get_by_node_and_task(
        &self,
        node_id: &Uuid,
        task_id: &str,
    ) -> Result<Option<Scan>, ApiError> {
        let sql = format!(
            "SELECT {} FROM scans WHERE node_id = $1 AND task_id = $2 \
             ORDER BY created_at DESC LIMIT 1",
            SCAN_COLUMNS
        );
        let result = sqlx::query_as::<_, Scan>(&sql)
            .bind(node_id)
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    async fn list(&self) -> Result<Vec<Scan>, ApiError> {
        let sql = format!("SELECT {} FROM scans ORDER BY created_at DESC", SCAN_COLUMNS);
        let results = sqlx::query_as::<_, Scan>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Scan>, ApiError> {
        let sql = format!(
            "SELECT {} FROM scans ORDER BY created_at DESC LIMIT $1",
            SCAN_COLUMNS
        );
        let results = sqlx::query_as::<_, Scan>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn update_metrics(&self, id: &Uuid, metrics: &ScanMetrics) -> Result<Scan, ApiError> {
        let now = chrono::Utc::now();
        let sql = format!(
            r#"
            UPDATE scans
            SET audit_requests_made = $1, crawl_and_audit_caption = $2,
                crawl_and_audit_progress = $3, crawl_requests_made = $4,
                issue_events = $5, total_elapsed_time = $6, scan_status = $7,
                updated_at = $8
            WHERE id = $9
            RETURNING {}
            "#,
            SCAN_COLUMNS
        );

        let result = sqlx::query_as::<_, Scan>(&sql)
            .bind(metrics.audit_requests_made)
            .bind(&metrics.crawl_and_audit_caption)
            .bind(metrics.crawl_and_audit_progress)
            .bind(metrics.crawl_requests_made)
            .bind(metrics.issue_events)
            .bind(metrics.total_elapsed_time)
            .bind(&metrics.scan_status)
            .bind(now)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result.ok_or_else(|| ApiError::NotFound(format!("Scan with id {} not found", id)))
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM scans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Scan with id {} not found", id)));
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scans")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_node(&self, node_id: &Uuid) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scans WHERE node_id = $1")
            .bind(node_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
