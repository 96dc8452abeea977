//! Configuration file schema and parsing.
//!
//! JSON is the primary format:
//!
//! ```json
//! {
//!   "WebhookUrl": "https://discord.com/api/webhooks/...",
//!   "Servers": [
//!     { "Url": "https://example.com", "ExpectedStatusCode": 200 },
//!     { "Url": "https://example.com/missing", "ExpectedStatusCode": 404 }
//!   ],
//!   "Settings": { "timeout_ms": 5000, "description": "plain" }
//! }
//! ```
//!
//! Files ending in `.toml` are parsed as TOML with snake_case keys:
//!
//! ```toml
//! webhook_url = "https://discord.com/api/webhooks/..."
//!
//! [settings]
//! concurrency = 4
//! log_format = "json"
//!
//! [[servers]]
//! url = "https://example.com"
//! expected_status_code = 200
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use status_core::{DescriptionFormat, ReporterConfig, ServerSpec};

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(rename = "WebhookUrl", alias = "webhook_url", alias = "webhookUrl")]
    pub webhook_url: String,

    #[serde(rename = "Servers", alias = "servers", default)]
    pub servers: Vec<ServerDef>,

    #[serde(rename = "Settings", alias = "settings", default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerDef {
    #[serde(rename = "Url", alias = "url")]
    pub url: String,

    #[serde(
        rename = "ExpectedStatusCode",
        alias = "expected_status_code",
        alias = "expectedStatusCode"
    )]
    pub expected_status_code: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(default)]
    pub concurrency: Option<usize>,

    #[serde(default)]
    pub description: Option<DescriptionFormat>,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            concurrency: None,
            description: None,
            log_format: default_log_format(),
        }
    }
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Settings {
    pub fn to_reporter_config(&self) -> ReporterConfig {
        let mut c = ReporterConfig::default();
        if let Some(ms) = self.timeout_ms {
            c = c.with_request_timeout(ms).with_webhook_timeout(ms);
        }
        if let Some(n) = self.concurrency {
            c = c.with_max_concurrent_checks(n);
        }
        if let Some(f) = self.description {
            c = c.with_description_format(f);
        }
        c
    }
}

/// Pick the config file: explicit flag first, then `CONFIG_PATH`, then
/// `config.json` in the working directory.
pub fn resolve_path(flag: Option<PathBuf>, env_value: Option<String>) -> PathBuf {
    flag.or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        let config = if is_toml {
            Self::from_toml(&content)
        } else {
            Self::from_json(&content)
        }
        .map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self, String> {
        serde_json::from_str(content).map_err(|e| e.to_string())
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn server_specs(&self) -> Vec<ServerSpec> {
        self.servers
            .iter()
            .map(|s| ServerSpec::new(s.url.clone(), s.expected_status_code))
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_http_url(&self.webhook_url)
            .map_err(|e| ConfigError::Invalid(format!("webhook URL {}: {}", self.webhook_url, e)))?;

        for (i, s) in self.servers.iter().enumerate() {
            check_http_url(&s.url).map_err(|e| {
                ConfigError::Invalid(format!("server URL at index {}: {} ({})", i, s.url, e))
            })?;
            if !(100..=599).contains(&s.expected_status_code) {
                return Err(ConfigError::Invalid(format!(
                    "expected status {} for {} is not an HTTP status code",
                    s.expected_status_code, s.url
                )));
            }
        }

        match self.settings.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "log_format '{}' must be 'pretty' or 'json'",
                    other
                )));
            }
        }

        Ok(())
    }
}

fn check_http_url(raw: &str) -> Result<(), String> {
    let parsed = url::Url::parse(raw).map_err(|e| e.to_string())?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("scheme '{}' is not http or https", other)),
    }
}
