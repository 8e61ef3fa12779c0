//! On-demand health aggregation.
//!
//! # Responsibilities
//! - Probe every configured service concurrently
//! - Wait for every probe to settle before aggregating
//! - Publish per-service health gauges

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use futures_util::future::join_all;

use crate::config::ServiceConfig;
use crate::health::state::{HealthReport, ServiceHealth};
use crate::observability::metrics;

struct ProbeTarget {
    name: String,
    probe_url: String,
}

pub struct HealthAggregator {
    client: reqwest::Client,
    targets: Vec<ProbeTarget>,
    version: String,
}

impl HealthAggregator {
    /// Each probe gets its own `probe_timeout`.
    pub fn new(
        services: &[ServiceConfig],
        probe_timeout: Duration,
        version: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(probe_timeout)
            // A redirect from a health endpoint counts against the service.
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("api-gateway-health/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let targets = services
            .iter()
            .map(|s| ProbeTarget {
                name: s.name.clone(),
                probe_url: format!("{}{}", s.url.trim_end_matches('/'), s.health_path),
            })
            .collect();

        Ok(Self {
            client,
            targets,
            version: version.into(),
        })
    }

    /// Probe all services and aggregate. Never fails: probe errors become
    /// per-service entries.
    pub async fn check_all(&self) -> HealthReport {
        let probes = self.targets.iter().map(|target| async move {
            let health = self.probe(target).await;
            metrics::record_service_health(&target.name, health.is_healthy());
            (target.name.clone(), health)
        });

        let services: BTreeMap<_, _> = join_all(probes).await.into_iter().collect();
        let report = HealthReport::new(self.version.clone(), services);

        if !report.is_healthy() {
            let failing: Vec<_> = report
                .services
                .iter()
                .filter(|(_, h)| !h.is_healthy())
                .map(|(name, _)| name.as_str())
                .collect();
            tracing::warn!(failing = ?failing, "Gateway degraded");
        }
        report
    }

    async fn probe(&self, target: &ProbeTarget) -> ServiceHealth {
        let start = Instant::now();
        match self.client.get(&target.probe_url).send().await {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    tracing::warn!(service = %target.name, status = %status, "Health probe failed: non-success status");
                }
                ServiceHealth::responded(
                    target.probe_url.clone(),
                    status.as_u16(),
                    start.elapsed().as_secs_f64(),
                )
            }
            Err(e) => {
                tracing::warn!(service = %target.name, error = %e, "Health probe failed: unreachable");
                ServiceHealth::unreachable(target.probe_url.clone(), e.to_string())
            }
        }
    }
}
