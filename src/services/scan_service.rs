use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::Settings,
    error::ApiError,
    models::{
        NodeResponse, Scan, ScanDetailResponse, ScanLaunch, ScanListResponse, ScanMetrics,
        ScanRecordCreate,
    },
    repositories::{AssetRepository, NodeRepository, ScanRepository},
    services::{external::BurpClient, external::ScanProgress, scan_builder},
};

/// Counts and latest scans shown on the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub nodes: i64,
    pub assets: i64,
    pub scans: i64,
    pub recent_scans: Vec<ScanListResponse>,
}

pub struct ScanService {
    scan_repo: Arc<dyn ScanRepository + Send + Sync>,
    node_repo: Arc<dyn NodeRepository + Send + Sync>,
    asset_repo: Arc<dyn AssetRepository + Send + Sync>,
    settings: Arc<Settings>,
}

impl ScanService {
    pub fn new(
        scan_repo: Arc<dyn ScanRepository + Send + Sync>,
        node_repo: Arc<dyn NodeRepository + Send + Sync>,
        asset_repo: Arc<dyn AssetRepository + Send + Sync>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            scan_repo,
            node_repo,
            asset_repo,
            settings,
        }
    }

    /// Build the launch document, start the scan on the node and record it.
    ///
    /// Nothing is stored when the node rejects the launch.
    pub async fn launch(&self, launch: ScanLaunch) -> Result<Scan, ApiError> {
        let description = launch.description.trim().to_string();
        if description.is_empty() {
            return Err(ApiError::validation("Scan description cannot be empty"));
        }

        let node = self
            .node_repo
            .get_by_id(&launch.node_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Node {} not found", launch.node_id)))?;

        let mut asset_ids: Vec<Uuid> = Vec::with_capacity(launch.asset_ids.len());
        for id in launch.asset_ids {
            if !asset_ids.contains(&id) {
                asset_ids.push(id);
            }
        }
        if asset_ids.is_empty() {
            return Err(ApiError::validation("Select at least one asset to scan"));
        }

        let assets = self.asset_repo.get_by_ids(&asset_ids).await?;
        let mut asset_urls = Vec::with_capacity(asset_ids.len());
        for id in &asset_ids {
            let asset = assets
                .iter()
                .find(|a| a.id == *id)
                .ok_or_else(|| ApiError::not_found(format!("Asset {} not found", id)))?;
            asset_urls.push(asset.url.clone());
        }

        let configuration = scan_builder::build_scan_configuration(
            &self.settings.callback_url(&node.id),
            launch.credentials.as_deref(),
            launch.configurations.as_deref(),
            launch.scope_includes.as_deref(),
            launch.scope_excludes.as_deref(),
            &asset_urls,
        )?;

        let client = BurpClient::for_node(&node, &self.settings)?;
        let task_id = client.launch_scan(&configuration).await?;

        let scan = self
            .scan_repo
            .create(&ScanRecordCreate {
                description,
                configuration: serde_json::to_value(&configuration)?,
                task_id,
                node_id: node.id,
                asset_ids,
                metrics: ScanMetrics::initial(),
            })
            .await?;

        tracing::info!(
            scan_id = %scan.id,
            node_id = %node.id,
            task_id = %scan.task_id,
            assets = asset_urls.len(),
            "scan recorded"
        );
        Ok(scan)
    }

    /// Apply a progress report pushed by a node to the matching scan
    pub async fn apply_progress(
        &self,
        node_id: &Uuid,
        progress: ScanProgress,
    ) -> Result<Scan, ApiError> {
        let task_id = progress
            .task_id
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ApiError::validation("Scan report is missing task_id"))?;

        let scan = self
            .scan_repo
            .get_by_node_and_task(node_id, &task_id)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(format!(
                    "No scan for task {} on node {}",
                    task_id, node_id
                ))
            })?;

        let updated = self
            .scan_repo
            .update_metrics(&scan.id, &ScanMetrics::from(progress))
            .await?;

        tracing::debug!(
            scan_id = %updated.id,
            status = %updated.scan_status,
            progress = updated.crawl_and_audit_progress,
            "scan progress applied"
        );
        Ok(updated)
    }

    /// Poll the node for the current state of a scan
    pub async fn refresh(&self, scan_id: &Uuid) -> Result<Scan, ApiError> {
        let scan = self.get_scan(scan_id).await?;
        let node = self
            .node_repo
            .get_by_id(&scan.node_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Node {} not found", scan.node_id)))?;

        let client = BurpClient::for_node(&node, &self.settings)?;
        let progress = client.scan_progress(&scan.task_id).await?;

        self.scan_repo
            .update_metrics(&scan.id, &ScanMetrics::from(progress))
            .await
    }

    pub async fn list(&self) -> Result<Vec<ScanListResponse>, ApiError> {
        let scans = self.scan_repo.list().await?;
        Ok(scans.into_iter().map(list_entry).collect())
    }

    pub async fn get_scan(&self, id: &Uuid) -> Result<Scan, ApiError> {
        self.scan_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Scan {} not found", id)))
    }

    pub async fn get(&self, id: &Uuid) -> Result<ScanDetailResponse, ApiError> {
        let scan = self.get_scan(id).await?;
        let node = self
            .node_repo
            .get_by_id(&scan.node_id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Node {} not found", scan.node_id)))?;
        let assets = self.asset_repo.list_by_scan(&scan.id).await?;

        Ok(ScanDetailResponse {
            created: scan.created_as_string(),
            node: NodeResponse::from(&node),
            assets,
            scan,
        })
    }

    pub async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        self.scan_repo.delete(id).await?;
        tracing::info!(scan_id = %id, "scan deleted");
        Ok(())
    }

    pub async fn dashboard(&self, recent: i64) -> Result<DashboardSummary, ApiError> {
        Ok(DashboardSummary {
            nodes: self.node_repo.count().await?,
            assets: self.asset_repo.count().await?,
            scans: self.scan_repo.count().await?,
            recent_scans: self
                .scan_repo
                .list_recent(recent)
                .await?
                .into_iter()
                .map(list_entry)
                .collect(),
        })
    }
}

fn list_entry(scan: Scan) -> ScanListResponse {
    ScanListResponse {
        created: scan.created_as_string(),
        scan,
    }
}
