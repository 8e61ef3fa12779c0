//! Health report model.
//!
//! # States
//! - Healthy: probe answered 200
//! - Unhealthy: probe answered with another status
//! - Unreachable: probe failed (timeout, refused, DNS)
//!
//! # Aggregation
//! ```text
//! all services Healthy  → overall Healthy  → HTTP 200
//! anything else         → overall Degraded → HTTP 503
//! ```
//!
//! The gateway's own status is always `healthy`: a process that cannot run
//! this code cannot answer the request either.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: ServiceStatus,
    /// Health endpoint that was probed.
    pub url: String,
    /// Probe round trip in seconds, healthy services only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceHealth {
    pub fn responded(url: String, status_code: u16, elapsed_secs: f64) -> Self {
        if status_code == 200 {
            Self {
                status: ServiceStatus::Healthy,
                url,
                response_time: Some(elapsed_secs),
                error: None,
            }
        } else {
            Self {
                status: ServiceStatus::Unhealthy,
                url,
                response_time: None,
                error: Some(format!("HTTP {}", status_code)),
            }
        }
    }

    pub fn unreachable(url: String, error: String) -> Self {
        Self {
            status: ServiceStatus::Unreachable,
            url,
            response_time: None,
            error: Some(error),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayHealth {
    pub status: ServiceStatus,
    pub version: String,
    pub overall_status: OverallStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub gateway: GatewayHealth,
    pub services: BTreeMap<String, ServiceHealth>,
}

impl HealthReport {
    pub fn new(version: String, services: BTreeMap<String, ServiceHealth>) -> Self {
        let overall_status = if services.values().all(ServiceHealth::is_healthy) {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        };
        Self {
            gateway: GatewayHealth {
                status: ServiceStatus::Healthy,
                version,
                overall_status,
            },
            services,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.gateway.overall_status == OverallStatus::Healthy
    }
}
