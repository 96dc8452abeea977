use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{Probe, ProbeError, Prober};

/// GET-based prober backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Self::build_client(timeout),
        }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &crate::config::ReporterConfig) -> Self {
        Self::new(config.request_timeout)
    }

    pub fn build_client(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .gzip(true)
            .build()
            .expect("Failed to build HTTP client")
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> Result<Probe, ProbeError> {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                // Only the status line matters; dropping the response hands
                // the connection back without reading the body.
                drop(response);
                debug!(url, status, "Probe answered");
                Ok(Probe { status })
            }
            Err(e) if e.is_timeout() => {
                warn!(url, "Probe timed out");
                Err(ProbeError::Timeout {
                    url: url.to_string(),
                })
            }
            Err(e) => {
                warn!(url, error = %e, "Probe network error");
                Err(ProbeError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
