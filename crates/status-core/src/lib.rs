#![forbid(unsafe_code)]

pub mod check;
pub mod config;
pub mod probe;
pub mod report;
pub mod reporter;
pub mod webhook;

pub use check::{check_all, check_all_with, check_server, CheckResult, ServerSpec};
pub use config::ReporterConfig;
pub use probe::{HttpProber, Probe, ProbeError, Prober};
pub use report::{render, DescriptionFormat, Embed, EmbedField, WebhookPayload};
pub use reporter::{Reporter, RunReport};
pub use webhook::{DeliveryError, WebhookClient};
