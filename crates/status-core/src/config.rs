use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::report::DescriptionFormat;

/// Runtime settings for a status run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Timeout for each server GET, covering connect through response headers.
    pub request_timeout: Duration,
    /// Timeout for the webhook POST.
    pub webhook_timeout: Duration,
    /// Maximum number of server checks in flight. 1 checks servers one by one.
    pub max_concurrent_checks: usize,
    pub description_format: DescriptionFormat,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            webhook_timeout: Duration::from_secs(10),
            max_concurrent_checks: 1,
            description_format: DescriptionFormat::default(),
        }
    }
}

impl ReporterConfig {
    pub fn with_request_timeout(mut self, ms: u64) -> Self {
        self.request_timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_webhook_timeout(mut self, ms: u64) -> Self {
        self.webhook_timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_max_concurrent_checks(mut self, max: usize) -> Self {
        self.max_concurrent_checks = max.max(1);
        self
    }

    pub fn with_description_format(mut self, format: DescriptionFormat) -> Self {
        self.description_format = format;
        self
    }
}
