mod http;

pub use http::HttpProber;

use async_trait::async_trait;
use thiserror::Error;

/// What a server answered. Any status code counts, including 4xx and 5xx.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub status: u16,
}

/// The GET never produced a response.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Timeout requesting {url}")]
    Timeout { url: String },
    #[error("Network error requesting {url}: {reason}")]
    Network { url: String, reason: String },
}

impl ProbeError {
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url } | Self::Network { url, .. } => url,
        }
    }
}

/// Issues a single request against a server and reports the status code.
///
/// Object-safe and Send + Sync so checks can run on any tokio task and tests
/// can swap in canned responses.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> Result<Probe, ProbeError>;
}
