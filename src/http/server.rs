//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the static, health and catch-all handlers
//! - Wire up middleware (request ID, tracing, CORS, limits, deadline)
//! - Bind server to listener and drain on shutdown
//! - Dispatch catch-all requests through auth, resolution and forwarding

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::{schema::CorsConfig, GatewayConfig};
use crate::health::HealthAggregator;
use crate::http::endpoints;
use crate::http::forwarder::{Forwarder, ProxyEnvelope};
use crate::http::request::{self, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::GatewayError;
use crate::lifecycle::startup::{self, StartupError};
use crate::observability::metrics;
use crate::routing::Resolver;
use crate::security::AuthGate;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
    pub auth: Arc<AuthGate>,
    pub forwarder: Arc<Forwarder>,
    pub health: Arc<HealthAggregator>,
    pub version: Arc<str>,
    pub service_names: Arc<[String]>,
    pub max_body_bytes: usize,
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Build every subsystem and the router. `config` is expected to be
    /// validated already.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let state = startup::build_state(&config)?;
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/health/", get(health_handler).fallback(proxy_handler))
            .route("/", get(endpoints::gateway_info).fallback(proxy_handler))
            .route(
                "/api/quotes/vat-rates/",
                get(endpoints::vat_rates).fallback(proxy_handler),
            )
            .route(
                "/vat-rates/default/",
                get(endpoints::vat_rate_default).fallback(proxy_handler),
            )
            .route("/{*path}", any(proxy_handler));

        if config.admin.enabled {
            tracing::info!("Admin endpoints mounted under /admin");
            router = router.merge(admin::routes(&config.admin));
        }

        router
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(cors_layer(&config.cors))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request::request_id(req.headers()),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.config.services.len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            // A wildcard cannot be combined with an explicit origin list.
            Ok(v) if v != "*" => Some(v),
            _ => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(config.allow_credentials)
}

/// `GET /health/`: 200 when every service is healthy, 503 otherwise.
async fn health_handler(State(state): State<AppState>) -> Response {
    let report = state.health.check_all().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

/// Catch-all handler: authenticate, resolve, forward.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match proxy(&state, request).await {
        Ok((service, response)) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), &service, start);
            response
        }
        Err((service, err)) => {
            let status = err.status();
            tracing::debug!(method = %method, path = %path, status = status.as_u16(), error = %err, "Request rejected");
            metrics::record_request(method.as_str(), status.as_u16(), service.as_deref().unwrap_or("none"), start);
            err.into_response()
        }
    }
}

type ProxyFailure = (Option<Arc<str>>, GatewayError);

async fn proxy(state: &AppState, request: Request<Body>) -> Result<(Arc<str>, Response), ProxyFailure> {
    let path = request.uri().path().to_string();

    // Authentication short-circuits before resolution.
    let identity = state
        .auth
        .authorize(&path, request.method(), request.headers().get(axum::http::header::AUTHORIZATION))
        .map_err(|e| (None::<Arc<str>>, GatewayError::from(e)))?;

    let route = state
        .resolver
        .resolve(&path)
        .map_err(|e| (None::<Arc<str>>, GatewayError::from(e)))?;
    let service = route.service.clone();

    let envelope = ProxyEnvelope::from_request(request, state.max_body_bytes)
        .await
        .map_err(|e| (Some(service.clone()), e))?;

    let upstream = state
        .forwarder
        .forward(envelope, &route, identity.as_ref())
        .await
        .map_err(|e| (Some(service.clone()), GatewayError::from(e)))?;

    Ok((service, upstream.into_response()))
}
