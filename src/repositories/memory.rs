//! Process-local repositories with the same constraint behaviour as the
//! PostgreSQL schema. Used by router tests and for running without a database.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    auth::Role,
    error::ApiError,
    models::{Asset, AssetCreate, Node, NodeCreate, Scan, ScanMetrics, ScanRecordCreate, User},
};

use super::{AssetRepository, NodeRepository, Repositories, ScanRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    nodes: Vec<Node>,
    assets: Vec<Asset>,
    scans: Vec<Scan>,
    // (asset_id, scan_id)
    assets_scans: Vec<(Uuid, Uuid)>,
}

/// One shared set of tables behind every repository trait
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            nodes: Arc::new(self.clone()),
            assets: Arc::new(self.clone()),
            scans: Arc::new(self.clone()),
            users: Arc::new(self.clone()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, ApiError> {
        self.tables
            .lock()
            .map_err(|_| ApiError::internal("In-memory store lock poisoned"))
    }
}

fn newest_first<T: Clone>(rows: &[T]) -> Vec<T> {
    rows.iter().rev().cloned().collect()
}

#[async_trait]
impl NodeRepository for MemoryStore {
    async fn create(&self, node: &NodeCreate) -> Result<Node, ApiError> {
        let created = Node {
            id: Uuid::new_v4(),
            description: node.description.clone(),
            protocol: node.protocol.clone(),
            hostname: node.hostname.clone(),
            port: node.port,
            api_key: node.api_key.clone(),
            created_at: Utc::now(),
        };
        self.lock()?.nodes.push(created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Node>, ApiError> {
        Ok(self.lock()?.nodes.iter().find(|n| n.id == *id).cloned())
    }

    async fn list(&self) -> Result<Vec<Node>, ApiError> {
        Ok(newest_first(&self.lock()?.nodes))
    }

    async fn update(&self, id: &Uuid, node: &NodeCreate) -> Result<Node, ApiError> {
        let mut tables = self.lock()?;
        let existing = tables
            .nodes
            .iter_mut()
            .find(|n| n.id == *id)
            .ok_or_else(|| ApiError::NotFound(format!("Node with id {} not found", id)))?;

        existing.description = node.description.clone();
        existing.protocol = node.protocol.clone();
        existing.hostname = node.hostname.clone();
        existing.port = node.port;
        existing.api_key = node.api_key.clone();
        Ok(existing.clone())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let mut tables = self.lock()?;
        if tables.scans.iter().any(|s| s.node_id == *id) {
            return Err(ApiError::conflict("Node still has scans"));
        }
        let before = tables.nodes.len();
        tables.nodes.retain(|n| n.id != *id);
        if tables.nodes.len() == before {
            return Err(ApiError::NotFound(format!("Node with id {} not found", id)));
        }
        Ok(())
    }

    async fn count(&self) -> Result<i64, ApiError> {
        Ok(self.lock()?.nodes.len() as i64)
    }
}

#[async_trait]
impl AssetRepository for MemoryStore {
    async fn create(&self, asset: &AssetCreate) -> Result<Asset, ApiError> {
        let created = Asset {
            id: Uuid::new_v4(),
            url: asset.url.clone(),
            description: asset.description.clone(),
            created_at: Utc::now(),
        };
        self.lock()?.assets.push(created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Asset>, ApiError> {
        Ok(self.lock()?.assets.iter().find(|a| a.id == *id).cloned())
    }

    async fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Asset>, ApiError> {
        Ok(self
            .lock()?
            .assets
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Asset>, ApiError> {
        Ok(newest_first(&self.lock()?.assets))
    }

    async fn list_by_scan(&self, scan_id: &Uuid) -> Result<Vec<Asset>, ApiError> {
        let tables = self.lock()?;
        Ok(tables
            .assets
            .iter()
            .filter(|a| tables.assets_scans.contains(&(a.id, *scan_id)))
            .cloned()
            .collect())
    }

    async fn update(&self, id: &Uuid, asset: &AssetCreate) -> Result<Asset, ApiError> {
        let mut tables = self.lock()?;
        let existing = tables
            .assets
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or_else(|| ApiError::NotFound(format!("Asset with id {} not found", id)))?;

        existing.url = asset.url.clone();
        existing.description = asset.description.clone();
        Ok(existing.clone())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let mut tables = self.lock()?;
        let before = tables.assets.len();
        tables.assets.retain(|a| a.id != *id);
        if tables.assets.len() == before {
            return Err(ApiError::NotFound(format!("Asset with id {} not found", id)));
        }
        tables.assets_scans.retain(|(asset_id, _)| asset_id != id);
        Ok(())
    }

    async fn count(&self) -> Result<i64, ApiError> {
        Ok(self.lock()?.assets.len() as i64)
    }
}

#[async_trait]
impl ScanRepository for MemoryStore {
    async fn create(&self, scan: &ScanRecordCreate) -> Result<Scan, ApiError> {
        let mut tables = self.lock()?;
        if !tables.nodes.iter().any(|n| n.id == scan.node_id) {
            return Err(ApiError::NotFound(format!(
                "Node with id {} not found",
                scan.node_id
            )));
        }
        let now = Utc::now();
        let metrics = &scan.metrics;
        let created = Scan {
            id: Uuid::new_v4(),
            description: scan.description.clone(),
            configuration: scan.configuration.clone(),
            audit_requests_made: metrics.audit_requests_made,
            crawl_and_audit_caption: metrics.crawl_and_audit_caption.clone(),
            crawl_and_audit_progress: metrics.crawl_and_audit_progress,
            crawl_requests_made: metrics.crawl_requests_made,
            issue_events: metrics.issue_events,
            total_elapsed_time: metrics.total_elapsed_time,
            scan_status: metrics.scan_status.clone(),
            task_id: scan.task_id.clone(),
            node_id: scan.node_id,
            created_at: now,
            updated_at: now,
        };

        tables.scans.push(created.clone());
        for asset_id in &scan.asset_ids {
            if !tables.assets_scans.contains(&(*asset_id, created.id)) {
                tables.assets_scans.push((*asset_id, created.id));
            }
        }
        Ok(created)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Scan>, ApiError> {
        Ok(self.lock()?.scans.iter().find(|s| s.id == *id).cloned())
    }

    async fn get_by_node_and_task(
        &self,
        node_id: &Uuid,
        task_id: &str,
    ) -> Result<Option<Scan>, ApiError> {
        Ok(self
            .lock()?
            .scans
            .iter()
            .rev()
            .find(|s| s.node_id == *node_id && s.task_id == task_id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Scan>, ApiError> {
        Ok(newest_first(&self.lock()?.scans))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Scan>, ApiError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .lock()?
            .scans
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update_metrics(&self, id: &Uuid, metrics: &ScanMetrics) -> Result<Scan, ApiError> {
        let mut tables = self.lock()?;
        let scan = tables
            .scans
            .iter_mut()
            .find(|s| s.id == *id)
            .ok_or_else(|| ApiError::NotFound(format!("Scan with id {} not found", id)))?;

        scan.audit_requests_made = metrics.audit_requests_made;
        scan.crawl_and_audit_caption = metrics.crawl_and_audit_caption.clone();
        scan.crawl_and_audit_progress = metrics.crawl_and_audit_progress;
        scan.crawl_requests_made = metrics.crawl_requests_made;
        scan.issue_events = metrics.issue_events;
        scan.total_elapsed_time = metrics.total_elapsed_time;
        scan.scan_status = metrics.scan_status.clone();
        scan.updated_at = Utc::now();
        Ok(scan.clone())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let mut tables = self.lock()?;
        let before = tables.scans.len();
        tables.scans.retain(|s| s.id != *id);
        if tables.scans.len() == before {
            return Err(ApiError::NotFound(format!("Scan with id {} not found", id)));
        }
        tables.assets_scans.retain(|(_, scan_id)| scan_id != id);
        Ok(())
    }

    async fn count(&self) -> Result<i64, ApiError> {
        Ok(self.lock()?.scans.len() as i64)
    }

    async fn count_by_node(&self, node_id: &Uuid) -> Result<i64, ApiError> {
        Ok(self
            .lock()?
            .scans
            .iter()
            .filter(|s| s.node_id == *node_id)
            .count() as i64)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, ApiError> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|u| u.email == email) {
            return Err(ApiError::conflict("User with this email already exists"));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash: password_hash.to_string(),
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.lock()?.users.iter().find(|u| u.id == *id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, ApiError> {
        Ok(self.lock()?.users.clone())
    }

    async fn count(&self) -> Result<i64, ApiError> {
        Ok(self.lock()?.users.len() as i64)
    }
}
