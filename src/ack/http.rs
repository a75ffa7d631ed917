//! HTTP acknowledgment channel
//!
//! Primary update path for remote sessions: PUT `/api/notifications`
//! against a herald instance. A non-2xx response reports non-success,
//! which sends the tracker to its direct-store fallback.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use crate::ack::AckChannel;
use crate::types::{HeraldError, Result};

/// Default request timeout for acknowledgment calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Acknowledgment channel over the notifications API
pub struct HttpAckChannel {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAckChannel {
    /// `base_url` is the herald instance root, e.g. `http://localhost:8080`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HeraldError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/notifications", base_url.trim_end_matches('/')),
        })
    }

    async fn put(&self, body: serde_json::Value) -> Result<bool> {
        let response = self
            .client
            .put(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| HeraldError::Http(format!("Acknowledge request failed: {}", e)))?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl AckChannel for HttpAckChannel {
    async fn acknowledge(&self, id: &str) -> Result<bool> {
        self.put(json!({ "id": id, "acknowledged": true })).await
    }

    async fn acknowledge_all(&self) -> Result<bool> {
        self.put(json!({ "acknowledgeAll": true })).await
    }
}
