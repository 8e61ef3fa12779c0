//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (legacy routes reference existing services)
//! - Validate value ranges (timeouts > 0, cache capacity > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("auth.jwt_secret must be set")]
    MissingJwtSecret,

    #[error("auth.jwt_algorithm '{0}' is not supported")]
    UnsupportedAlgorithm(String),

    #[error("service '{0}' is declared more than once")]
    DuplicateService(String),

    #[error("service '{service}' has an invalid url '{url}': {reason}")]
    InvalidServiceUrl {
        service: String,
        url: String,
        reason: String,
    },

    #[error("service '{service}' route '{route}' must start with '/'")]
    InvalidServiceRoute { service: String, route: String },

    #[error("legacy route '{path}' must start with '/'")]
    InvalidLegacyPath { path: String },

    #[error("legacy route '{path}' references unknown service '{service}'")]
    UnknownService { path: String, service: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("timeouts.upstream_secs ({upstream}) must be lower than timeouts.request_secs ({request})")]
    UpstreamOutlivesRequest { upstream: u64, request: u64 },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.jwt_secret.trim().is_empty() {
        errors.push(ValidationError::MissingJwtSecret);
    }
    if Algorithm::from_str(&config.auth.jwt_algorithm).is_err() {
        errors.push(ValidationError::UnsupportedAlgorithm(
            config.auth.jwt_algorithm.clone(),
        ));
    }

    let mut names = HashSet::new();
    for service in &config.services {
        if !names.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }

        if let Err(reason) = check_service_url(&service.url) {
            errors.push(ValidationError::InvalidServiceUrl {
                service: service.name.clone(),
                url: service.url.clone(),
                reason,
            });
        }

        for route in service.routes.iter().chain(std::iter::once(&service.health_path)) {
            if !route.starts_with('/') {
                errors.push(ValidationError::InvalidServiceRoute {
                    service: service.name.clone(),
                    route: route.clone(),
                });
            }
        }
    }

    for legacy in &config.legacy_routes {
        if !legacy.path.starts_with('/') {
            errors.push(ValidationError::InvalidLegacyPath {
                path: legacy.path.clone(),
            });
        }
        if !names.contains(legacy.service.as_str()) {
            errors.push(ValidationError::UnknownService {
                path: legacy.path.clone(),
                service: legacy.service.clone(),
            });
        }
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.upstream_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.connect_secs"));
    }
    if config.timeouts.health_probe_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.health_probe_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    // The request deadline must leave room for the upstream 504.
    if config.timeouts.upstream_secs >= config.timeouts.request_secs {
        errors.push(ValidationError::UpstreamOutlivesRequest {
            upstream: config.timeouts.upstream_secs,
            request: config.timeouts.request_secs,
        });
    }
    if config.routing.cache_capacity == 0 {
        errors.push(ValidationError::ZeroValue("routing.cache_capacity"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_service_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() {
        return Err("query strings are not allowed".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LegacyRouteConfig, ServiceConfig};

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret = "secret".into();
        config
    }

    #[test]
    fn test_default_config_with_secret_is_valid() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn test_missing_secret_rejected() {
        let config = GatewayConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::MissingJwtSecret));
    }

    #[test]
    fn test_unknown_service_rejected() {
        let mut config = valid_config();
        config
            .legacy_routes
            .push(LegacyRouteConfig::new("/old/", "billing", "/api/billing/"));

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnknownService {
                path: "/old/".into(),
                service: "billing".into(),
            }]
        );
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.auth.jwt_algorithm = "NOPE".into();
        config.services.push(ServiceConfig::new("tenant", "ftp://x", &["api/"]));
        config.routing.cache_capacity = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::UnsupportedAlgorithm("NOPE".into())));
        assert!(errors.contains(&ValidationError::DuplicateService("tenant".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidServiceUrl { service, .. } if service == "tenant")));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidServiceRoute { route, .. } if route == "api/")));
        assert!(errors.contains(&ValidationError::ZeroValue("routing.cache_capacity")));
    }

    #[test]
    fn test_upstream_timeout_must_fit_request_deadline() {
        let mut config = valid_config();
        config.timeouts.upstream_secs = 30;
        config.timeouts.request_secs = 30;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UpstreamOutlivesRequest {
                upstream: 30,
                request: 30,
            }]
        );

        config.timeouts.request_secs = 31;
        assert_eq!(validate_config(&config), Ok(()));
    }
}
