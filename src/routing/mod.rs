//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     ServiceConfig[] + LegacyRouteConfig[]
//!     → table.rs (exact map + prefix list)
//!     → Sort prefixes by length, longest first
//!     → Freeze as immutable RouteTable
//!
//! Incoming path
//!     → resolver.rs
//!         1. exact map           (O(1))
//!         2. memo cache (LRU)    (O(1))
//!         3. prefix scan         (O(p), first hit is longest)
//!     → ResolvedRoute or RouteNotFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex or templates in the hot path (literal prefixes only)
//! - Deterministic: same input always resolves to the same route
//! - Explicit RouteNotFound rather than a silent default

pub mod resolver;
pub mod table;

pub use resolver::{Resolver, ResolverStats, RouteNotFound};
pub use table::{PrefixRoute, ResolvedRoute, RouteTable};
