use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{Node, NodeCreate},
};

#[async_trait]
pub trait NodeRepository {
    async fn create(&self, node: &NodeCreate) -> Result<Node, ApiError>;
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Node>, ApiError>;
    async fn list(&self) -> Result<Vec<Node>, ApiError>;
    /// Replace every editable column of the node
    async fn update(&self, id: &Uuid, node: &NodeCreate) -> Result<Node, ApiError>;
    async fn delete(&self, id: &Uuid) -> Result<(), ApiError>;
    async fn count(&self) -> Result<i64, ApiError>;
}

pub struct SqlxNodeRepository {
    pool: DatabasePool,
}

impl SqlxNodeRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NodeRepository for SqlxNodeRepository {
    async fn create(&self, node: &NodeCreate) -> Result<Node, ApiError> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let result = sqlx::query_as::<_, Node>(
            r#"
            INSERT INTO nodes (id, description, protocol, hostname, port, api_key, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, description, protocol, hostname, port, api_key, created_at
            "#,
        )
        .bind(id)
        .bind(&node.description)
        .bind(&node.protocol)
        .bind(&node.hostname)
        .bind(node.port)
        .bind(&node.api_key)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(result)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Node>, ApiError> {
        let result = sqlx::query_as::<_, Node>(
            r#"
            SELECT id, description, protocol, hostname, port, api_key, created_at
            FROM nodes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn list(&self) -> Result<Vec<Node>, ApiError> {
        let results = sqlx::query_as::<_, Node>(
            r#"
            SELECT id, description, protocol, hostname, port, api_key, created_at
            FROM nodes
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }

    async fn update(&self, id: &Uuid, node: &NodeCreate) -> Result<Node, ApiError> {
        let result = sqlx::query_as::<_, Node>(
            r#"
            UPDATE nodes
            SET description = $1, protocol = $2, hostname = $3, port = $4, api_key = $5
            WHERE id = $6
            RETURNING id, description, protocol, hostname, port, api_key, created_at
            "#,
        )
        .bind(&node.description)
        .bind(&node.protocol)
        .bind(&node.hostname)
        .bind(node.port)
        .bind(&node.api_key)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.ok_or_else(|| ApiError::NotFound(format!("Node with id {} not found", id)))
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM nodes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    ApiError::Conflict(format!("Node {} still has scans", id))
                }
                _ => ApiError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Node with id {} not found", id)));
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM nodes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
