//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, dispatch)
//!     → endpoints.rs (static endpoints answered locally)
//!     → request.rs (request ID, buffer into ProxyEnvelope)
//!     → [security decides public/protected] → [routing resolves target]
//!     → forwarder.rs (one upstream call, pooled per service)
//!     → response.rs (errors to status + {"detail"} body)
//!     → Send to client
//! ```

pub mod endpoints;
pub mod forwarder;
pub mod request;
pub mod response;
pub mod server;

pub use forwarder::{ForwardError, Forwarder, ProxyEnvelope, UpstreamResponse};
pub use request::X_REQUEST_ID;
pub use response::GatewayError;
pub use server::{AppState, GatewayServer};
