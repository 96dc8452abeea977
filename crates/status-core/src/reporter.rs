use std::sync::Arc;

use chrono::Local;
use tracing::info;

use crate::check::{check_all_with, CheckResult, ServerSpec};
use crate::config::ReporterConfig;
use crate::probe::{HttpProber, Prober};
use crate::report::{render, WebhookPayload};
use crate::webhook::{DeliveryError, WebhookClient};

/// Results of one run together with the message that was sent for them.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub results: Vec<CheckResult>,
    pub payload: WebhookPayload,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.matched).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.passed()
    }
}

/// Check servers, render the report, post it to the webhook.
pub struct Reporter {
    prober: Arc<dyn Prober>,
    webhook: WebhookClient,
    config: ReporterConfig,
}

impl Reporter {
    pub fn new(prober: Arc<dyn Prober>, webhook: WebhookClient, config: ReporterConfig) -> Self {
        Self {
            prober,
            webhook,
            config,
        }
    }

    /// Reporter with an HTTP prober and webhook client built from `config`.
    pub fn http(webhook_url: impl Into<String>, config: ReporterConfig) -> Self {
        let prober = Arc::new(HttpProber::from_config(&config));
        let webhook = WebhookClient::new(
            HttpProber::build_client(config.webhook_timeout),
            webhook_url,
            config.webhook_timeout,
        );
        Self::new(prober, webhook, config)
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.config
    }

    pub async fn collect(&self, servers: &[ServerSpec]) -> Vec<CheckResult> {
        self.collect_with(servers, |_| {}).await
    }

    pub async fn collect_with<F>(&self, servers: &[ServerSpec], on_result: F) -> Vec<CheckResult>
    where
        F: FnMut(&CheckResult),
    {
        info!(
            servers = servers.len(),
            concurrency = self.config.max_concurrent_checks,
            "Checking servers"
        );
        check_all_with(
            self.prober.as_ref(),
            servers,
            self.config.max_concurrent_checks,
            on_result,
        )
        .await
    }

    pub fn build_payload(&self, results: &[CheckResult]) -> WebhookPayload {
        render(results, self.config.description_format, &Local::now())
    }

    pub async fn run(&self, servers: &[ServerSpec]) -> Result<RunReport, DeliveryError> {
        self.run_with(servers, |_| {}).await
    }

    pub async fn run_with<F>(
        &self,
        servers: &[ServerSpec],
        on_result: F,
    ) -> Result<RunReport, DeliveryError>
    where
        F: FnMut(&CheckResult),
    {
        let results = self.collect_with(servers, on_result).await;
        let payload = self.build_payload(&results);
        self.webhook.deliver(&payload).await?;

        let report = RunReport { results, payload };
        info!(
            url = %self.webhook.url(),
            passed = report.passed(),
            failed = report.failed(),
            "Status report delivered"
        );
        Ok(report)
    }
}
