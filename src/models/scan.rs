use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::{Asset, NodeResponse};

/// Status recorded for a scan the node has accepted but not yet reported on
pub const INITIAL_SCAN_STATUS: &str = "queued";

/// Shown in place of application login passwords outside the launch request
pub const MASKED_PASSWORD: &str = "********";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Scan {
    pub id: Uuid,
    pub description: String,
    /// Launch document sent to the node. Serialized with passwords masked.
    #[serde(serialize_with = "serialize_masked")]
    pub configuration: Value,
    pub audit_requests_made: i32,
    pub crawl_and_audit_caption: String,
    pub crawl_and_audit_progress: i32,
    pub crawl_requests_made: i32,
    pub issue_events: i32,
    pub total_elapsed_time: i32,
    pub scan_status: String,
    pub task_id: String,
    pub node_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scan {
    pub fn created_as_string(&self) -> String {
        crate::utils::format_local(&self.created_at)
    }

    pub fn masked_configuration(&self) -> Value {
        mask_credentials(&self.configuration)
    }

    pub fn metrics(&self) -> ScanMetrics {
        ScanMetrics {
            audit_requests_made: self.audit_requests_made,
            crawl_and_audit_caption: self.crawl_and_audit_caption.clone(),
            crawl_and_audit_progress: self.crawl_and_audit_progress,
            crawl_requests_made: self.crawl_requests_made,
            issue_events: self.issue_events,
            total_elapsed_time: self.total_elapsed_time,
            scan_status: self.scan_status.clone(),
        }
    }
}

/// Copy of a launch document with every application login password replaced
pub fn mask_credentials(configuration: &Value) -> Value {
    let mut masked = configuration.clone();
    if let Some(logins) = masked
        .get_mut("application_logins")
        .and_then(Value::as_array_mut)
    {
        for login in logins {
            if let Some(password) = login.get_mut("password") {
                *password = Value::String(MASKED_PASSWORD.to_string());
            }
        }
    }
    masked
}

fn serialize_masked<S>(configuration: &Value, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    mask_credentials(configuration).serialize(serializer)
}

/// Progress figures reported by the node, copied onto the scan record as-is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanMetrics {
    pub audit_requests_made: i32,
    pub crawl_and_audit_caption: String,
    pub crawl_and_audit_progress: i32,
    pub crawl_requests_made: i32,
    pub issue_events: i32,
    pub total_elapsed_time: i32,
    pub scan_status: String,
}

impl ScanMetrics {
    pub fn initial() -> Self {
        Self {
            scan_status: INITIAL_SCAN_STATUS.to_string(),
            ..Default::default()
        }
    }
}

/// Request to launch a scan. List-like fields are whitespace separated.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanLaunch {
    pub description: String,
    pub node_id: Uuid,
    #[serde(default)]
    pub asset_ids: Vec<Uuid>,
    #[serde(default)]
    pub credentials: Option<String>,
    #[serde(default)]
    pub configurations: Option<String>,
    #[serde(default)]
    pub scope_includes: Option<String>,
    #[serde(default)]
    pub scope_excludes: Option<String>,
}

/// Row data for a scan the node has accepted
#[derive(Debug, Clone)]
pub struct ScanRecordCreate {
    pub description: String,
    pub configuration: serde_json::Value,
    pub task_id: String,
    pub node_id: Uuid,
    pub asset_ids: Vec<Uuid>,
    pub metrics: ScanMetrics,
}

/// Response DTO for scan list endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ScanListResponse {
    #[serde(flatten)]
    pub scan: Scan,
    pub created: String,
}

/// Response DTO for scan get endpoint with node and targets
#[derive(Debug, Clone, Serialize)]
pub struct ScanDetailResponse {
    #[serde(flatten)]
    pub scan: Scan,
    pub created: String,
    pub node: NodeResponse,
    pub assets: Vec<Asset>,
}
