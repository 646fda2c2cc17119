pub mod asset_repo;
pub mod memory;
pub mod node_repo;
pub mod scan_repo;
pub mod user_repo;

pub use asset_repo::AssetRepository;
pub use node_repo::NodeRepository;
pub use scan_repo::ScanRepository;
pub use user_repo::UserRepository;

use std::sync::Arc;

use crate::database::DatabasePool;

/// The repository set injected into the application state
#[derive(Clone)]
pub struct Repositories {
    pub nodes: Arc<dyn NodeRepository + Send + Sync>,
    pub assets: Arc<dyn AssetRepository + Send + Sync>,
    pub scans: Arc<dyn ScanRepository + Send + Sync>,
    pub users: Arc<dyn UserRepository + Send + Sync>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool
    pub fn sqlx(pool: DatabasePool) -> Self {
        Self {
            nodes: Arc::new(node_repo::SqlxNodeRepository::new(pool.clone())),
            assets: Arc::new(asset_repo::SqlxAssetRepository::new(pool.clone())),
            scans: Arc::new(scan_repo::SqlxScanRepository::new(pool.clone())),
            users: Arc::new(user_repo::SqlxUserRepository::new(pool)),
        }
    }

    /// Repositories backed by a process-local store
    pub fn in_memory() -> Self {
        memory::MemoryStore::new().repositories()
    }
}

/// Map a unique-constraint violation to a conflict, anything else passes through
pub(crate) fn map_unique_violation(err: sqlx::Error, what: &str) -> crate::error::ApiError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            crate::error::ApiError::Conflict(format!("{} already exists", what))
        }
        _ => crate::error::ApiError::Database(err),
    }
}
