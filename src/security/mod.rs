//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (public or protected? validate bearer token)
//!     → headers.rs (strip framing headers, inject X-User-* identity)
//!     → Pass to forwarder
//!
//! Upstream response:
//!     → headers.rs (strip framing headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: any token problem on a protected path is a 401
//! - No trust in client-supplied identity headers

pub mod access_control;
pub mod headers;

pub use access_control::{Access, AuthError, AuthGate, AuthSetupError, Identity};
