use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::{
    config::Settings,
    database::DatabasePool,
    error::ApiError,
    middleware::IpRateLimiter,
    repositories::Repositories,
    services::{AssetService, AuthService, NodeService, ScanService},
};

pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod utils;
pub mod views;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    /// Absent when running on in-memory repositories
    pub db_pool: Option<DatabasePool>,
    pub repositories: Repositories,
    pub node_service: Arc<NodeService>,
    pub asset_service: Arc<AssetService>,
    pub scan_service: Arc<ScanService>,
    pub auth_service: Arc<AuthService>,
    pub rate_limiter: Arc<IpRateLimiter>,
    pub key: Key,
}

// Implement FromRef to allow extracting Key from AppState
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

impl AppState {
    /// Connect to the configured database, migrate it and build the state
    pub async fn new(config: Settings) -> Result<Self, ApiError> {
        let db_pool = crate::database::create_connection_pool(&config.database_url).await?;
        Self::new_with_pool(config, db_pool)
    }

    /// Create new application state with existing database pool
    pub fn new_with_pool(config: Settings, db_pool: DatabasePool) -> Result<Self, ApiError> {
        let repositories = Repositories::sqlx(db_pool.clone());
        Self::from_repositories(config, repositories, Some(db_pool))
    }

    /// Wire services on top of an arbitrary repository set
    pub fn from_repositories(
        config: Settings,
        repositories: Repositories,
        db_pool: Option<DatabasePool>,
    ) -> Result<Self, ApiError> {
        let config = Arc::new(config);

        let key = match &config.auth_secret {
            Some(secret) => Key::try_from(secret.as_bytes())
                .map_err(|e| ApiError::internal(format!("Invalid AUTH_SECRET: {}", e)))?,
            None => {
                tracing::warn!(
                    "AUTH_SECRET not set, using a random cookie key; sessions end on restart"
                );
                Key::generate()
            }
        };

        let node_service = Arc::new(NodeService::new(
            repositories.nodes.clone(),
            repositories.scans.clone(),
            config.clone(),
        ));
        let asset_service = Arc::new(AssetService::new(repositories.assets.clone()));
        let scan_service = Arc::new(ScanService::new(
            repositories.scans.clone(),
            repositories.nodes.clone(),
            repositories.assets.clone(),
            config.clone(),
        ));
        let auth_service = Arc::new(AuthService::new(
            config.clone(),
            repositories.users.clone(),
        ));
        let rate_limiter = Arc::new(IpRateLimiter::new(&config));

        Ok(Self {
            config,
            db_pool,
            repositories,
            node_service,
            asset_service,
            scan_service,
            auth_service,
            rate_limiter,
            key,
        })
    }
}
