//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health/
//!     → aggregator.rs (one GET per service, all concurrent)
//!     → join barrier (every probe settles: ok, non-200, timeout, error)
//!     → state.rs (per-service status, overall healthy/degraded)
//!     → 200 or 503
//! ```
//!
//! # Design Decisions
//! - Probes run on demand, there is no background monitor
//! - Each probe has its own timeout; one slow service never delays another
//! - Health results never affect routing

pub mod aggregator;
pub mod state;

pub use aggregator::HealthAggregator;
pub use state::{HealthReport, OverallStatus, ServiceHealth, ServiceStatus};
