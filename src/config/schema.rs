//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the API gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend services fronted by the gateway.
    pub services: Vec<ServiceConfig>,

    /// Legacy client paths mapped onto a service and its current path.
    pub legacy_routes: Vec<LegacyRouteConfig>,

    /// Bearer token authentication.
    pub auth: AuthConfig,

    /// Route resolution tuning.
    pub routing: RoutingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Cross-origin policy for the browser client.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoints.
    pub admin: AdminConfig,

    /// Gateway metadata reported by the info and health endpoints.
    pub gateway: GatewayInfoConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            services: default_services(),
            legacy_routes: Vec::new(),
            auth: AuthConfig::default(),
            routing: RoutingConfig::default(),
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            cors: CorsConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
            gateway: GatewayInfoConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Look up a service by name.
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// A backend service and the path prefixes it owns.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Unique service name, referenced by legacy routes.
    pub name: String,

    /// Base URL (scheme + authority, e.g. "http://localhost:8001").
    pub url: String,

    /// Path probed by the health aggregator.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Path prefixes forwarded to this service unchanged.
    #[serde(default)]
    pub routes: Vec<String>,

    /// Environment variable that overrides `url` when set.
    #[serde(default)]
    pub url_env: Option<String>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>, routes: &[&str]) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            health_path: default_health_path(),
            routes: routes.iter().map(|r| r.to_string()).collect(),
            url_env: None,
        }
    }
}

fn default_health_path() -> String {
    "/health/".to_string()
}

fn default_services() -> Vec<ServiceConfig> {
    let service = |name: &str, port: u16, env: &str, routes: &[&str]| ServiceConfig {
        url_env: Some(env.to_string()),
        ..ServiceConfig::new(name, format!("http://localhost:{}", port), routes)
    };

    vec![
        service("tenant", 8001, "TENANT_SERVICE_URL", &["/api/tenants/"]),
        service("auth", 8002, "AUTH_SERVICE_URL", &["/api/auth/"]),
        service("crm", 8003, "CRM_SERVICE_URL", &["/api/crm/"]),
        service(
            "documents",
            8004,
            "DOCUMENT_SERVICE_URL",
            &[
                "/api/quotes/",
                "/api/invoices/",
                "/api/projects/",
                "/api/devis/",
                "/api/factures/",
                "/quotes/",
                "/invoices/",
            ],
        ),
        service(
            "library",
            8005,
            "LIBRARY_SERVICE_URL",
            &[
                "/api/library/",
                "/api/categories/",
                "/api/fournitures/",
                "/api/main-oeuvre/",
                "/api/ouvrages/",
                "/api/ingredients/",
            ],
        ),
    ]
}

/// Legacy client path rewritten onto a service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LegacyRouteConfig {
    /// Path as sent by older clients.
    pub path: String,

    /// Name of the service that now serves it.
    pub service: String,

    /// Path on the target service.
    pub target: String,
}

impl LegacyRouteConfig {
    pub fn new(path: impl Into<String>, service: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            service: service.into(),
            target: target.into(),
        }
    }
}

/// Bearer token authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret (HMAC) or PEM public key (RSA/EC).
    pub jwt_secret: String,

    /// JWT algorithm name (e.g. "HS256").
    pub jwt_algorithm: String,

    /// Paths starting with any of these never require a token.
    pub public_prefixes: Vec<String>,

    /// GET requests under this prefix never require a token.
    pub public_read_prefix: String,

    /// Paths that are public when matched exactly.
    pub public_exact_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_algorithm: "HS256".to_string(),
            public_prefixes: [
                "/health/",
                "/docs",
                "/redoc",
                "/openapi.json",
                "/api/auth/login/",
                "/api/auth/register/",
                "/auth/login/",
                "/auth/register/",
                "/api/tenants/",
                "/tenants/",
                "/vat-rates/",
                "/api/quotes/vat-rates/",
                "/api/library/health/",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            public_read_prefix: "/api/tenants/".to_string(),
            public_exact_paths: vec![
                "/api/quotes/vat-rates/".to_string(),
                "/vat-rates/".to_string(),
            ],
        }
    }
}

/// Route resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Maximum number of memoized prefix resolutions.
    pub cache_capacity: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 10_000,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one upstream call, in seconds.
    pub upstream_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Timeout for each health probe in seconds.
    pub health_probe_secs: u64,

    /// Deadline for a whole inbound request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 15,
            connect_secs: 5,
            health_probe_secs: 5,
            request_secs: 30,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to call the gateway from a browser.
    pub allowed_origins: Vec<String>,

    /// Whether cookies and auth headers may be sent cross-origin.
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            allow_credentials: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin endpoints under /admin.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

/// Gateway metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayInfoConfig {
    /// Version string reported by `/` and `/health/`.
    pub version: String,
}

impl Default for GatewayInfoConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
        }
    }
}
