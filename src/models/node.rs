use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;

/// Version segment of the scan node REST API
pub const NODE_API_VERSION: &str = "v0.1";

/// A remote scan engine reachable over its REST API
#[derive(Debug, Clone, FromRow)]
pub struct Node {
    pub id: Uuid,
    pub description: String,
    pub protocol: String,
    pub hostname: String,
    pub port: i32,
    pub api_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Node {
    pub fn has_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Base URL of the node's REST API, always ending in `/`.
    ///
    /// The API key, when present, is a path segment in front of the version.
    pub fn api_url(&self) -> String {
        let mut url = format!("{}://{}:{}/", self.protocol, self.hostname, self.port);
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            url.push_str(key);
            url.push('/');
        }
        url.push_str(NODE_API_VERSION);
        url.push('/');
        url
    }

    /// Same as `api_url` with the key masked, safe for display and logs
    pub fn display_url(&self) -> String {
        let mut url = format!("{}://{}:{}/", self.protocol, self.hostname, self.port);
        if self.has_key() {
            url.push_str("****/");
        }
        url.push_str(NODE_API_VERSION);
        url.push('/');
        url
    }

    pub fn created_as_string(&self) -> String {
        crate::utils::format_local(&self.created_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeCreate {
    pub description: String,
    pub protocol: String,
    pub hostname: String,
    pub port: i32,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl NodeCreate {
    /// Trim inputs, lowercase the protocol and drop an empty key
    pub fn normalized(self) -> Self {
        Self {
            description: self.description.trim().to_string(),
            protocol: self.protocol.trim().to_lowercase(),
            hostname: self.hostname.trim().to_string(),
            port: self.port,
            api_key: self
                .api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if self.description.is_empty() {
            return Err(ApiError::validation("Node description cannot be empty"));
        }
        validate_protocol(&self.protocol)?;
        validate_hostname(&self.hostname)?;
        validate_port(self.port)?;
        if let Some(key) = &self.api_key {
            validate_api_key(key)?;
        }
        Ok(())
    }
}

/// Partial update; an empty `api_key` string clears the stored key
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeUpdate {
    pub description: Option<String>,
    pub protocol: Option<String>,
    pub hostname: Option<String>,
    pub port: Option<i32>,
    pub api_key: Option<String>,
}

impl NodeUpdate {
    /// Merge the update into an existing node, validating the result
    pub fn apply_to(self, node: &Node) -> Result<NodeCreate, ApiError> {
        let merged = NodeCreate {
            description: self.description.unwrap_or_else(|| node.description.clone()),
            protocol: self.protocol.unwrap_or_else(|| node.protocol.clone()),
            hostname: self.hostname.unwrap_or_else(|| node.hostname.clone()),
            port: self.port.unwrap_or(node.port),
            api_key: match self.api_key {
                Some(key) => Some(key),
                None => node.api_key.clone(),
            },
        }
        .normalized();
        merged.validate()?;
        Ok(merged)
    }
}

/// Node as exposed over the API; the key itself never leaves the server
#[derive(Debug, Clone, Serialize)]
pub struct NodeResponse {
    pub id: Uuid,
    pub description: String,
    pub protocol: String,
    pub hostname: String,
    pub port: i32,
    pub has_key: bool,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub created: String,
}

impl From<&Node> for NodeResponse {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            description: node.description.clone(),
            protocol: node.protocol.clone(),
            hostname: node.hostname.clone(),
            port: node.port,
            has_key: node.has_key(),
            url: node.display_url(),
            created_at: node.created_at,
            created: node.created_as_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatusResponse {
    pub id: Uuid,
    pub url: String,
    pub alive: bool,
}

fn validate_protocol(protocol: &str) -> Result<(), ApiError> {
    match protocol {
        "http" | "https" => Ok(()),
        other => Err(ApiError::validation(format!(
            "Unsupported protocol '{}', expected http or https",
            other
        ))),
    }
}

fn validate_hostname(hostname: &str) -> Result<(), ApiError> {
    if hostname.is_empty() {
        return Err(ApiError::validation("Node hostname cannot be empty"));
    }
    if hostname
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '@' | '?' | '#'))
    {
        return Err(ApiError::validation(format!(
            "Invalid node hostname '{}'",
            hostname
        )));
    }
    Ok(())
}

fn validate_port(port: i32) -> Result<(), ApiError> {
    if (1..=65535).contains(&port) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "Port {} is out of range (1-65535)",
            port
        )))
    }
}

fn validate_api_key(key: &str) -> Result<(), ApiError> {
    if key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Ok(())
    } else {
        Err(ApiError::validation(
            "API key may only contain letters, digits, '-' and '_'",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(api_key: Option<&str>) -> Node {
        Node {
            id: Uuid::new_v4(),
            description: "lab".to_string(),
            protocol: "http".to_string(),
            hostname: "10.0.0.5".to_string(),
            port: 1337,
            api_key: api_key.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_api_url_without_key() {
        let node = node(None);
        assert!(!node.has_key());
        assert_eq!(node.api_url(), "http://10.0.0.5:1337/v0.1/");
    }

    #[test]
    fn test_api_url_with_key() {
        let node = node(Some("s3cr3t"));
        assert!(node.has_key());
        assert_eq!(node.api_url(), "http://10.0.0.5:1337/s3cr3t/v0.1/");
        assert_eq!(node.display_url(), "http://10.0.0.5:1337/****/v0.1/");
    }

    #[test]
    fn test_empty_key_counts_as_missing() {
        let node = node(Some(""));
        assert!(!node.has_key());
        assert_eq!(node.api_url(), "http://10.0.0.5:1337/v0.1/");
    }

    #[test]
    fn test_node_create_normalization_and_validation() {
        let create = NodeCreate {
            description: "  primary  ".to_string(),
            protocol: "HTTPS".to_string(),
            hostname: " burp.internal ".to_string(),
            port: 8443,
            api_key: Some("   ".to_string()),
        }
        .normalized();

        assert_eq!(create.description, "primary");
        assert_eq!(create.protocol, "https");
        assert_eq!(create.hostname, "burp.internal");
        assert!(create.api_key.is_none());
        assert!(create.validate().is_ok());
    }

    #[test]
    fn test_node_create_rejects_bad_input() {
        let base = NodeCreate {
            description: "node".to_string(),
            protocol: "http".to_string(),
            hostname: "localhost".to_string(),
            port: 1337,
            api_key: None,
        };

        let mut bad = base.clone();
        bad.protocol = "ftp".to_string();
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.port = 70000;
        assert!(bad.validate().is_err());

        let mut bad = base.clone();
        bad.hostname = "evil.com/path".to_string();
        assert!(bad.validate().is_err());

        let mut bad = base;
        bad.api_key = Some("key/../../".to_string());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_update_clears_key_with_empty_string() {
        let existing = node(Some("abc"));
        let update = NodeUpdate {
            api_key: Some(String::new()),
            ..Default::default()
        };

        let merged = update.apply_to(&existing).unwrap();
        assert!(merged.api_key.is_none());
        assert_eq!(merged.hostname, "10.0.0.5");
    }
}
