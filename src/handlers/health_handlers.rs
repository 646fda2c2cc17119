use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::time::Instant;

use crate::{error::ApiError, AppState};

/// Health check with a database connectivity check
pub async fn health_check(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let database = check_database_health(&app_state).await;
    let healthy = database["healthy"].as_bool().unwrap_or(false);

    if !healthy {
        return Err(ApiError::internal("Service is unhealthy"));
    }

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "enterprize",
        "checks": {
            "database": database
        }
    })))
}

/// Simple health check endpoint for load balancers
pub async fn health_check_simple() -> &'static str {
    "OK"
}

async fn check_database_health(app_state: &AppState) -> Value {
    let Some(pool) = &app_state.db_pool else {
        return json!({
            "healthy": true,
            "message": "In-memory storage"
        });
    };

    let started = Instant::now();
    match crate::database::health_check(pool).await {
        Ok(()) => json!({
            "healthy": true,
            "message": "Database connection successful",
            "response_time_ms": started.elapsed().as_millis() as u64
        }),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            json!({
                "healthy": false,
                "message": "Database connection failed"
            })
        }
    }
}

/// Readiness check endpoint for Kubernetes
pub async fn readiness_check(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let database = check_database_health(&app_state).await;
    let ready = database["healthy"].as_bool().unwrap_or(false);

    if !ready {
        return Err(ApiError::internal("Service is not ready"));
    }

    Ok(Json(json!({
        "ready": ready,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "checks": {
            "database": database
        }
    })))
}

/// Liveness check; answering at all means the process is alive
pub async fn liveness_check() -> Json<Value> {
    Json(json!({
        "alive": true,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
