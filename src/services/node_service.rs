use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::Settings,
    error::ApiError,
    models::{Node, NodeCreate, NodeStatusResponse, NodeUpdate},
    repositories::{NodeRepository, ScanRepository},
    services::external::BurpClient,
};

pub struct NodeService {
    node_repo: Arc<dyn NodeRepository + Send + Sync>,
    scan_repo: Arc<dyn ScanRepository + Send + Sync>,
    settings: Arc<Settings>,
}

impl NodeService {
    pub fn new(
        node_repo: Arc<dyn NodeRepository + Send + Sync>,
        scan_repo: Arc<dyn ScanRepository + Send + Sync>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            node_repo,
            scan_repo,
            settings,
        }
    }

    pub async fn list(&self) -> Result<Vec<Node>, ApiError> {
        self.node_repo.list().await
    }

    pub async fn get(&self, id: &Uuid) -> Result<Node, ApiError> {
        self.node_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Node {} not found", id)))
    }

    pub async fn create(&self, node: NodeCreate) -> Result<Node, ApiError> {
        let node = node.normalized();
        node.validate()?;

        let created = self.node_repo.create(&node).await?;
        tracing::info!(node_id = %created.id, url = %created.display_url(), "node registered");
        Ok(created)
    }

    pub async fn update(&self, id: &Uuid, update: NodeUpdate) -> Result<Node, ApiError> {
        let existing = self.get(id).await?;
        let merged = update.apply_to(&existing)?;
        self.node_repo.update(id, &merged).await
    }

    /// Remove a node. Nodes that still own scans are kept.
    pub async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let scans = self.scan_repo.count_by_node(id).await?;
        if scans > 0 {
            return Err(ApiError::conflict(format!(
                "Node {} still has {} scan(s); delete them first",
                id, scans
            )));
        }

        self.node_repo.delete(id).await?;
        tracing::info!(node_id = %id, "node deleted");
        Ok(())
    }

    pub fn client(&self, node: &Node) -> Result<BurpClient, ApiError> {
        BurpClient::for_node(node, &self.settings)
    }

    pub async fn status(&self, id: &Uuid) -> Result<NodeStatusResponse, ApiError> {
        let node = self.get(id).await?;
        let alive = self.client(&node)?.is_alive().await;

        Ok(NodeStatusResponse {
            id: node.id,
            url: node.display_url(),
            alive,
        })
    }
}
