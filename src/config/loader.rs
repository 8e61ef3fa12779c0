//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment override {name}={value}")]
    Env { name: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the process environment, and validate configuration
/// from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    finalize(config)
}

/// Like [`load_config`], but falls back to built-in defaults when the file
/// does not exist.
pub fn load_config_or_default(path: &Path) -> Result<GatewayConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::warn!(path = %path.display(), "Config file not found, using defaults");
        finalize(GatewayConfig::default())
    }
}

/// Parse configuration text without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

fn finalize(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
///
/// Recognized: `JWT_SECRET_KEY`, `JWT_ALGORITHM`, `GATEWAY_HOST`,
/// `GATEWAY_PORT`, and each service's `url_env`.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup("JWT_SECRET_KEY") {
        config.auth.jwt_secret = secret;
    }
    if let Some(algorithm) = lookup("JWT_ALGORITHM") {
        config.auth.jwt_algorithm = algorithm;
    }

    let host = lookup("GATEWAY_HOST");
    let port = lookup("GATEWAY_PORT");
    if host.is_some() || port.is_some() {
        let (current_host, current_port) = split_bind_address(&config.listener.bind_address);
        let port = match port {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Env {
                    name: "GATEWAY_PORT",
                    value: raw.clone(),
                })?
                .to_string(),
            None => current_port.to_string(),
        };
        let host = host.unwrap_or_else(|| current_host.to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }

    for service in &mut config.services {
        if let Some(url) = service.url_env.as_deref().and_then(&lookup) {
            tracing::debug!(service = %service.name, url = %url, "Service URL overridden from environment");
            service.url = url;
        }
    }

    Ok(())
}

fn split_bind_address(addr: &str) -> (&str, &str) {
    match addr.rsplit_once(':') {
        Some((host, port)) => (host, port),
        None => (addr, "8000"),
    }
}
