mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{fmt, EnvFilter};

use status_core::{CheckResult, DescriptionFormat, Reporter};

use crate::config::{resolve_path, AppConfig, CONFIG_PATH_ENV};

const EXIT_DELIVERY_FAILED: u8 = 1;
const EXIT_BAD_CONFIG: u8 = 2;

/// Check configured HTTP servers and post a status summary to a chat webhook.
#[derive(Parser)]
#[command(name = "server-status", version, about)]
struct Cli {
    /// Config file path. Falls back to $CONFIG_PATH, then ./config.json.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Per-request timeout in milliseconds. Overrides the config file.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Number of servers checked at once. Overrides the config file.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Embed description wording. Overrides the config file.
    #[arg(long, value_enum)]
    description: Option<DescriptionArg>,

    /// Log output format. Overrides the config file.
    #[arg(long, value_parser = ["pretty", "json"])]
    log_format: Option<String>,

    /// Print the webhook payload instead of posting it.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum DescriptionArg {
    Timestamped,
    Plain,
}

impl From<DescriptionArg> for DescriptionFormat {
    fn from(arg: DescriptionArg) -> Self {
        match arg {
            DescriptionArg::Timestamped => DescriptionFormat::Timestamped,
            DescriptionArg::Plain => DescriptionFormat::Plain,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let path = resolve_path(cli.config.clone(), std::env::var(CONFIG_PATH_ENV).ok());

    let app_config = match AppConfig::load(&path) {
        Ok(c) => {
            init_tracing(cli.log_format.as_deref().unwrap_or(&c.settings.log_format));
            tracing::info!(path = %path.display(), "Read config");
            c
        }
        Err(e) => {
            init_tracing(cli.log_format.as_deref().unwrap_or("pretty"));
            tracing::error!("{}", e);
            return ExitCode::from(EXIT_BAD_CONFIG);
        }
    };

    let mut config = app_config.settings.to_reporter_config();
    if let Some(ms) = cli.timeout_ms {
        config = config.with_request_timeout(ms).with_webhook_timeout(ms);
    }
    if let Some(n) = cli.concurrency {
        config = config.with_max_concurrent_checks(n);
    }
    if let Some(d) = cli.description {
        config = config.with_description_format(d.into());
    }

    let servers = app_config.server_specs();
    if servers.is_empty() {
        tracing::warn!("No servers configured, reporting an empty status");
    }

    let reporter = Reporter::http(app_config.webhook_url.clone(), config);

    let progress = ProgressBar::new(servers.len() as u64).with_style(
        ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")
            .expect("valid template"),
    );
    let on_result = |r: &CheckResult| {
        progress.set_message(r.url.clone());
        progress.inc(1);
    };

    if cli.dry_run {
        let results = reporter.collect_with(&servers, on_result).await;
        progress.finish_and_clear();
        print_summary(&results);
        let payload = reporter.build_payload(&results);
        match serde_json::to_string_pretty(&payload) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize payload");
                return ExitCode::from(EXIT_DELIVERY_FAILED);
            }
        }
        return ExitCode::SUCCESS;
    }

    match reporter.run_with(&servers, on_result).await {
        Ok(report) => {
            progress.finish_and_clear();
            print_summary(&report.results);
            println!(
                "\n{} {} passed, {} failed",
                style("Report sent.").green().bold(),
                report.passed(),
                report.failed()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            progress.finish_and_clear();
            tracing::error!(error = %e, "Webhook delivery failed");
            ExitCode::from(EXIT_DELIVERY_FAILED)
        }
    }
}

fn print_summary(results: &[CheckResult]) {
    for r in results {
        let mark = if r.matched {
            style("UP  ").green().bold()
        } else {
            style("DOWN").red().bold()
        };
        let status = match r.observed_status {
            Some(code) if r.matched => code.to_string(),
            Some(code) => format!("{} (expected {})", code, r.expected_status),
            None => format!("unreachable (expected {})", r.expected_status),
        };
        println!(
            "  {}  {:<48} {:>6}ms  {}",
            mark,
            r.url,
            r.response_time_ms,
            style(status).dim()
        );
    }
}

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_format {
        "json" => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
