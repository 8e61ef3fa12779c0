//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Assemble the shared handler state
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::GatewayConfig;
use crate::health::HealthAggregator;
use crate::http::forwarder::Forwarder;
use crate::http::server::AppState;
use crate::routing::{Resolver, RouteTable};
use crate::security::{AuthGate, AuthSetupError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("authentication setup failed: {0}")]
    Auth(#[from] AuthSetupError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Build the handler state: route table, resolver, auth gate, forwarder
/// pools, health aggregator.
pub fn build_state(config: &GatewayConfig) -> Result<AppState, StartupError> {
    let table = RouteTable::build(&config.services, &config.legacy_routes);
    let resolver = Resolver::new(table, config.routing.cache_capacity);

    let auth = AuthGate::from_config(&config.auth)?;
    tracing::info!(algorithm = %config.auth.jwt_algorithm, "Auth gate ready");

    let forwarder = Forwarder::new(
        &config.services,
        Duration::from_secs(config.timeouts.upstream_secs),
        Duration::from_secs(config.timeouts.connect_secs),
    )?;

    let health = HealthAggregator::new(
        &config.services,
        Duration::from_secs(config.timeouts.health_probe_secs),
        config.gateway.version.clone(),
    )?;

    let service_names: Vec<String> = config.services.iter().map(|s| s.name.clone()).collect();

    Ok(AppState {
        resolver: Arc::new(resolver),
        auth: Arc::new(auth),
        forwarder: Arc::new(forwarder),
        health: Arc::new(health),
        version: Arc::from(config.gateway.version.as_str()),
        service_names: service_names.into(),
        max_body_bytes: config.limits.max_body_bytes,
    })
}
