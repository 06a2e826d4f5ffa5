use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::KnowledgeBaseConfig;
use crate::error::{KbError, KbResult};

/// Metadata for an external knowledge-base resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbResource {
    /// Resource identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Source URL, if the resource has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Resource type as reported by the knowledge base.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    /// Ingestion status as reported by the knowledge base.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Client for the knowledge-base resource lookup API
#[derive(Clone)]
pub struct KbClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl KbClient {
    /// Create a new knowledge-base client
    pub fn new(config: &KnowledgeBaseConfig) -> KbResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(KbError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout_ms: config.timeout_ms,
        })
    }

    /// Look up a resource by id. Returns None for an unknown id (404).
    pub async fn get_resource(&self, resource_id: &str) -> KbResult<Option<KbResource>> {
        let url = format!("{}/resources/{}", self.base_url, resource_id);
        debug!(resource_id = %resource_id, "Looking up knowledge-base resource");

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                KbError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                KbError::Http(e)
            }
        })?;

        let status = response.status();

        if status.as_u16() == 404 {
            return Ok(None);
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(KbError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let resource: KbResource = response.json().await.map_err(|e| KbError::InvalidResponse {
            message: format!("Failed to parse resource: {}", e),
        })?;

        Ok(Some(resource))
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
