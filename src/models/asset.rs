use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: Uuid,
    pub url: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    pub fn created_as_string(&self) -> String {
        crate::utils::format_local(&self.created_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetCreate {
    pub url: String,
    #[serde(default)]
    pub description: String,
}

impl AssetCreate {
    pub fn normalized(self) -> Self {
        Self {
            url: self.url.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        validate_asset_url(&self.url)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetUpdate {
    pub url: Option<String>,
    pub description: Option<String>,
}

impl AssetUpdate {
    pub fn apply_to(self, asset: &Asset) -> Result<AssetCreate, ApiError> {
        let merged = AssetCreate {
            url: self.url.unwrap_or_else(|| asset.url.clone()),
            description: self
                .description
                .unwrap_or_else(|| asset.description.clone()),
        }
        .normalized();
        merged.validate()?;
        Ok(merged)
    }
}

/// Assets are handed to the scan engine verbatim, so only absolute web URLs
/// without embedded whitespace are accepted.
pub fn validate_asset_url(url: &str) -> Result<(), ApiError> {
    if url.is_empty() {
        return Err(ApiError::validation("Asset URL cannot be empty"));
    }
    if url.chars().any(char::is_whitespace) {
        return Err(ApiError::validation("Asset URL cannot contain whitespace"));
    }
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ApiError::validation(format!("Invalid asset URL '{}': {}", url, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::validation(format!(
            "Asset URL '{}' must use http or https",
            url
        )));
    }
    if parsed.host_str().is_none() {
        return Err(ApiError::validation(format!(
            "Asset URL '{}' has no host",
            url
        )));
    }
    Ok(())
}
