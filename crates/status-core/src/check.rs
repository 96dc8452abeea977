//! Per-server checks.
//!
//! A check issues one probe, times it, and compares the observed status code
//! against the expected one. Transport failures become failed results instead
//! of errors, so one unreachable server never stops the rest of the batch.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::probe::Prober;

/// A server to check and the status code it should answer with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    pub url: String,
    pub expected_status: u16,
}

impl ServerSpec {
    pub fn new(url: impl Into<String>, expected_status: u16) -> Self {
        Self {
            url: url.into(),
            expected_status,
        }
    }
}

/// Outcome of probing one server once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub url: String,
    pub expected_status: u16,
    /// `None` when the request never got a response.
    pub observed_status: Option<u16>,
    pub matched: bool,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckResult {
    pub fn is_unreachable(&self) -> bool {
        self.observed_status.is_none()
    }
}

pub async fn check_server<P: Prober + ?Sized>(prober: &P, spec: &ServerSpec) -> CheckResult {
    let started = Instant::now();
    let outcome = prober.probe(&spec.url).await;
    let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(probe) => {
            let matched = probe.status == spec.expected_status;
            if matched {
                debug!(url = %spec.url, status = probe.status, response_time_ms, "Server is up");
            } else {
                warn!(
                    url = %spec.url,
                    expected = spec.expected_status,
                    observed = probe.status,
                    "Server is down"
                );
            }
            CheckResult {
                url: spec.url.clone(),
                expected_status: spec.expected_status,
                observed_status: Some(probe.status),
                matched,
                response_time_ms,
                error: None,
            }
        }
        Err(e) => {
            warn!(url = %spec.url, error = %e, "Server is unreachable");
            CheckResult {
                url: spec.url.clone(),
                expected_status: spec.expected_status,
                observed_status: None,
                matched: false,
                response_time_ms,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Check every server, returning results in the same order as `servers`.
pub async fn check_all<P: Prober + ?Sized>(
    prober: &P,
    servers: &[ServerSpec],
    concurrency: usize,
) -> Vec<CheckResult> {
    check_all_with(prober, servers, concurrency, |_| {}).await
}

/// Like [`check_all`], calling `on_result` for each result as it becomes
/// available. Calls happen in configuration order, not completion order.
pub async fn check_all_with<P, F>(
    prober: &P,
    servers: &[ServerSpec],
    concurrency: usize,
    mut on_result: F,
) -> Vec<CheckResult>
where
    P: Prober + ?Sized,
    F: FnMut(&CheckResult),
{
    let mut checks = stream::iter(servers)
        .map(|spec| check_server(prober, spec))
        .buffered(concurrency.max(1));

    let mut results = Vec::with_capacity(servers.len());
    while let Some(result) = checks.next().await {
        on_result(&result);
        results.push(result);
    }
    results
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::probe::{Probe, ProbeError};

    /// Answers from a fixed table, optionally after a delay. Unknown URLs fail
    /// like a refused connection.
    struct CannedProber {
        answers: HashMap<&'static str, (u16, u64)>,
        calls: Arc<AtomicUsize>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl CannedProber {
        fn new(answers: &[(&'static str, u16, u64)]) -> Self {
            Self {
                answers: answers.iter().map(|(u, s, d)| (*u, (*s, *d))).collect(),
                calls: Arc::new(AtomicUsize::new(0)),
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Prober for CannedProber {
        async fn probe(&self, url: &str) -> Result<Probe, ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let answer = self.answers.get(url).copied();
            if let Some((_, delay_ms)) = answer {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match answer {
                Some((status, _)) => Ok(Probe { status }),
                None => Err(ProbeError::Network {
                    url: url.to_string(),
                    reason: "connection refused".into(),
                }),
            }
        }
    }

    #[tokio::test]
    async fn matching_status_passes() {
        let prober = CannedProber::new(&[("http://ok", 200, 0)]);
        let r = check_server(&prober, &ServerSpec::new("http://ok", 200)).await;
        assert!(r.matched);
        assert_eq!(r.observed_status, Some(200));
        assert_eq!(r.expected_status, 200);
        assert!(r.error.is_none());
    }

    #[tokio::test]
    async fn mismatched_status_fails() {
        let prober = CannedProber::new(&[("http://bad", 500, 0)]);
        let r = check_server(&prober, &ServerSpec::new("http://bad", 200)).await;
        assert!(!r.matched);
        assert_eq!(r.observed_status, Some(500));
    }

    #[tokio::test]
    async fn expecting_an_error_status_can_pass() {
        let prober = CannedProber::new(&[("http://gone", 404, 0)]);
        let r = check_server(&prober, &ServerSpec::new("http://gone", 404)).await;
        assert!(r.matched);
    }

    #[tokio::test]
    async fn transport_failure_is_recorded_not_raised() {
        let prober = CannedProber::new(&[]);
        let r = check_server(&prober, &ServerSpec::new("http://nowhere", 200)).await;
        assert!(!r.matched);
        assert!(r.is_unreachable());
        assert!(r.error.as_deref().unwrap().contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn response_time_covers_the_delay() {
        let prober = CannedProber::new(&[("http://slow", 200, 50)]);
        let r = check_server(&prober, &ServerSpec::new("http://slow", 200)).await;
        assert!(r.response_time_ms >= 50, "{}", r.response_time_ms);
    }

    #[tokio::test]
    async fn failure_does_not_stop_later_servers() {
        let prober = CannedProber::new(&[("http://a", 200, 0), ("http://c", 200, 0)]);
        let servers = vec![
            ServerSpec::new("http://a", 200),
            ServerSpec::new("http://b", 200),
            ServerSpec::new("http://c", 200),
        ];
        let results = check_all(&prober, &servers, 1).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].matched);
        assert!(results[1].is_unreachable());
        assert!(results[2].matched);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_by_default() {
        let prober = CannedProber::new(&[("http://a", 200, 30), ("http://b", 200, 10)]);
        let servers = vec![ServerSpec::new("http://a", 200), ServerSpec::new("http://b", 200)];
        check_all(&prober, &servers, 1).await;
        assert_eq!(prober.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_checks_keep_configuration_order() {
        let prober = CannedProber::new(&[
            ("http://slowest", 200, 90),
            ("http://middle", 500, 40),
            ("http://fastest", 200, 5),
        ]);
        let servers = vec![
            ServerSpec::new("http://slowest", 200),
            ServerSpec::new("http://middle", 200),
            ServerSpec::new("http://fastest", 200),
        ];

        let mut seen = Vec::new();
        let results = check_all_with(&prober, &servers, 3, |r| seen.push(r.url.clone())).await;

        let urls: Vec<_> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["http://slowest", "http://middle", "http://fastest"]);
        assert_eq!(seen, urls);
        assert_eq!(prober.max_in_flight.load(Ordering::SeqCst), 3);
        assert!(!results[1].matched);
    }

    #[tokio::test]
    async fn empty_server_list_yields_no_results() {
        let prober = CannedProber::new(&[]);
        let results = check_all(&prober, &[], 4).await;
        assert!(results.is_empty());
    }
}
