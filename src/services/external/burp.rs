use reqwest::{header::LOCATION, Client, ClientBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    error::ApiError,
    models::{Node, ScanMetrics},
    services::scan_builder::ScanConfiguration,
};

/// Scan state as reported by a node, either pushed to the callback route or
/// fetched from `{node}/scan/{task_id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanProgress {
    #[serde(default, deserialize_with = "deserialize_task_id")]
    pub task_id: Option<String>,
    #[serde(default)]
    pub scan_status: String,
    #[serde(default)]
    pub scan_metrics: RemoteScanMetrics,
}

/// Metrics block of a node report. Missing figures default to zero and
/// fields not listed here are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteScanMetrics {
    #[serde(default)]
    pub crawl_requests_made: i64,
    #[serde(default)]
    pub audit_requests_made: i64,
    #[serde(default)]
    pub issue_events: i64,
    #[serde(default)]
    pub crawl_and_audit_caption: String,
    #[serde(default)]
    pub crawl_and_audit_progress: i64,
    #[serde(default)]
    pub total_elapsed_time: i64,
}

// Nodes report the task id as a string, some as a bare number
fn deserialize_task_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn clamp(value: i64) -> i32 {
    value.clamp(0, i32::MAX as i64) as i32
}

impl From<ScanProgress> for ScanMetrics {
    fn from(progress: ScanProgress) -> Self {
        let m = progress.scan_metrics;
        ScanMetrics {
            audit_requests_made: clamp(m.audit_requests_made),
            crawl_and_audit_caption: m.crawl_and_audit_caption,
            crawl_and_audit_progress: clamp(m.crawl_and_audit_progress),
            crawl_requests_made: clamp(m.crawl_requests_made),
            issue_events: clamp(m.issue_events),
            total_elapsed_time: clamp(m.total_elapsed_time),
            scan_status: progress.scan_status,
        }
    }
}

/// REST client bound to a single scan node
pub struct BurpClient {
    client: Client,
    base_url: String,
    display_url: String,
}

impl BurpClient {
    pub fn for_node(node: &Node, settings: &Settings) -> Result<Self, ApiError> {
        let client = ClientBuilder::new()
            .timeout(settings.burp_timeout())
            .danger_accept_invalid_certs(settings.burp_accept_invalid_certs)
            .user_agent(concat!("enterprize/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: node.api_url(),
            display_url: node.display_url(),
        })
    }

    /// REST API base URL, ending in `/`
    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub async fn is_alive(&self) -> bool {
        match self.client.get(&self.base_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(node = %self.display_url, error = %e, "scan node unreachable");
                false
            }
        }
    }

    /// Start a scan and return the task id the node assigned to it
    pub async fn launch_scan(&self, configuration: &ScanConfiguration) -> Result<String, ApiError> {
        let url = format!("{}scan", self.base_url);
        tracing::debug!(node = %self.display_url, "launching scan");

        let response = self.client.post(&url).json(configuration).send().await?;
        let response = self.check_status(response).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().trim_end_matches('/'))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::external_service(format!(
                    "Scan node {} did not return a task location",
                    self.display_url
                ))
            })?;

        // The header carries the bare task id, but accept a full URL too
        let task_id = location.rsplit('/').next().unwrap_or(location).to_string();

        tracing::info!(node = %self.display_url, task_id = %task_id, "scan launched");
        Ok(task_id)
    }

    pub async fn scan_progress(&self, task_id: &str) -> Result<ScanProgress, ApiError> {
        let url = format!("{}scan/{}", self.base_url, task_id);

        let response = self.client.get(&url).send().await?;
        let response = self.check_status(response).await?;
        let text = response.text().await?;

        let mut progress: ScanProgress = serde_json::from_str(&text).map_err(|e| {
            ApiError::external_service(format!("Failed to parse scan node response: {}", e))
        })?;
        if progress.task_id.is_none() {
            progress.task_id = Some(task_id.to_string());
        }

        Ok(progress)
    }

    async fn check_status(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::external_service(format!(
            "Scan node {} returned HTTP {}: {}",
            self.display_url,
            status.as_u16(),
            body.chars().take(200).collect::<String>()
        )))
    }
}
