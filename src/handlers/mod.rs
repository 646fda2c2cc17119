pub mod asset_handlers;
pub mod auth_handlers;
pub mod health_handlers;
pub mod node_handlers;
pub mod scan_handlers;
pub mod ui_handlers;
pub mod user_handlers;

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON body extractor that reports malformed input as an [`ApiError`]
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub use health_handlers::{health_check, health_check_simple, liveness_check, readiness_check};
