//! Webhook delivery.
//!
//! The rendered report is POSTed exactly once. A transport failure or a
//! non-2xx answer is returned to the caller, which treats it as fatal.

use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::report::WebhookPayload;

const USER_AGENT: &str = concat!("server-status/", env!("CARGO_PKG_VERSION"));
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to serialize webhook payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Webhook request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("Webhook at {url} answered HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },
}

impl DeliveryError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Posts payloads to a single webhook endpoint.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookClient {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn deliver(&self, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        let body = serde_json::to_vec(payload)?;

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .timeout(self.timeout)
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Request {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(url = %self.url, status = status.as_u16(), "Webhook delivered");
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        truncate_on_char_boundary(&mut body, MAX_ERROR_BODY);
        warn!(url = %self.url, status = status.as_u16(), "Webhook rejected the report");
        Err(DeliveryError::Status {
            url: self.url.clone(),
            status: status.as_u16(),
            body,
        })
    }
}

fn truncate_on_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
