//! Static endpoints answered by the gateway itself.
//!
//! These never consult the resolver, the auth gate or the forwarder.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct GatewayInfo {
    pub service: &'static str,
    pub version: String,
    pub status: &'static str,
    pub legacy_compatibility: &'static str,
    pub endpoints: EndpointIndex,
    pub services_backend: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EndpointIndex {
    pub health: &'static str,
    pub auth: &'static str,
    pub tenants: &'static str,
    pub tiers: &'static str,
    pub legacy: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VatRate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<&'static str>,
    pub code: &'static str,
    pub name: &'static str,
    pub rate: f64,
    pub rate_display: &'static str,
    pub description: &'static str,
    pub is_default: bool,
    pub is_active: bool,
}

impl VatRate {
    fn new(
        code: &'static str,
        display: &'static str,
        rate: f64,
        description: &'static str,
        is_default: bool,
    ) -> Self {
        Self {
            id: None,
            code,
            name: display,
            rate,
            rate_display: display,
            description,
            is_default,
            is_active: true,
        }
    }
}

fn vat_rate_table() -> [VatRate; 4] {
    [
        VatRate::new("0", "0%", 0.0, "0% VAT rate", false),
        VatRate::new("5.5", "5.5%", 5.5, "5.5% VAT rate", false),
        VatRate::new("10", "10%", 10.0, "10% VAT rate", false),
        VatRate::new("20", "20%", 20.0, "20% VAT rate", true),
    ]
}

/// `GET /`
pub async fn gateway_info(State(state): State<AppState>) -> Json<GatewayInfo> {
    Json(GatewayInfo {
        service: "api-gateway",
        version: state.version.to_string(),
        status: "operational",
        legacy_compatibility: "enabled",
        endpoints: EndpointIndex {
            health: "/health/",
            auth: "/api/auth/*",
            tenants: "/api/tenants/*",
            tiers: "/api/tiers/*",
            legacy: "Automatic mapping of legacy routes",
        },
        services_backend: state.service_names.to_vec(),
    })
}

/// `GET /api/quotes/vat-rates/`
pub async fn vat_rates() -> Json<Vec<VatRate>> {
    tracing::info!("Serving VAT rates");
    Json(vat_rate_table().to_vec())
}

/// `GET /vat-rates/default/`
pub async fn vat_rate_default() -> Json<VatRate> {
    tracing::info!("Serving default VAT rate");
    Json(VatRate {
        id: Some("default_20"),
        description: "Default 20% VAT rate",
        ..vat_rate_table()[3].clone()
    })
}
