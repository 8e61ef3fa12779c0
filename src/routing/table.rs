//! Route table compiled from service and legacy-route configuration.
//!
//! # Responsibilities
//! - Index legacy paths for exact lookup
//! - Register legacy paths and service-owned prefixes for prefix lookup
//! - Order prefixes so a linear scan finds the longest match first
//!
//! # Design Decisions
//! - Built once at startup, never mutated afterwards
//! - Legacy routes naming an unknown service are skipped, never matched
//! - Placeholder segments such as `{id}` are literal text, not templates
//! - A prefix registered twice keeps its first position and its last value

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{LegacyRouteConfig, ServiceConfig};

/// Result of resolving an inbound path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRoute {
    /// Name of the target service.
    pub service: Arc<str>,
    /// Base URL of the target service, without trailing slash.
    pub service_url: Arc<str>,
    /// Path to request on the target service.
    pub target_path: String,
}

impl ResolvedRoute {
    /// Full upstream URL without query string.
    pub fn url(&self) -> String {
        format!("{}{}", self.service_url, self.target_path)
    }
}

/// A prefix entry in the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRoute {
    /// Literal prefix matched against the start of the path.
    pub prefix: String,
    /// Replacement for `prefix`, or `None` to forward the path unchanged.
    pub replacement: Option<String>,
    pub service: Arc<str>,
    pub service_url: Arc<str>,
}

impl PrefixRoute {
    fn new(service: &Target, old_prefix: &str, new_prefix: &str) -> Self {
        Self {
            prefix: old_prefix.to_string(),
            replacement: (old_prefix != new_prefix).then(|| new_prefix.to_string()),
            service: service.name.clone(),
            service_url: service.url.clone(),
        }
    }

    /// Returns true if `path` starts with this prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Rewrite a matching path, replacing the prefix once at the start and
    /// keeping the remainder verbatim.
    pub fn rewrite(&self, path: &str) -> String {
        match &self.replacement {
            Some(new_prefix) => {
                let rest = path.strip_prefix(self.prefix.as_str()).unwrap_or(path);
                format!("{}{}", new_prefix, rest)
            }
            None => path.to_string(),
        }
    }

    pub fn resolve(&self, path: &str) -> ResolvedRoute {
        ResolvedRoute {
            service: self.service.clone(),
            service_url: self.service_url.clone(),
            target_path: self.rewrite(path),
        }
    }
}

#[derive(Debug, Clone)]
struct Target {
    name: Arc<str>,
    url: Arc<str>,
}

/// Immutable exact and prefix indices.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    exact: HashMap<String, ResolvedRoute>,
    prefixes: Vec<PrefixRoute>,
}

impl RouteTable {
    /// Compile the table from configuration.
    pub fn build(services: &[ServiceConfig], legacy_routes: &[LegacyRouteConfig]) -> Self {
        let targets: HashMap<&str, Target> = services
            .iter()
            .map(|s| {
                let target = Target {
                    name: Arc::from(s.name.as_str()),
                    url: Arc::from(s.url.trim_end_matches('/')),
                };
                (s.name.as_str(), target)
            })
            .collect();

        let mut exact = HashMap::new();
        let mut prefixes = PrefixSet::default();
        let mut skipped = 0usize;

        for legacy in legacy_routes {
            let Some(target) = targets.get(legacy.service.as_str()) else {
                tracing::warn!(
                    path = %legacy.path,
                    service = %legacy.service,
                    "Legacy route references unknown service, skipping"
                );
                skipped += 1;
                continue;
            };

            exact.insert(
                legacy.path.clone(),
                ResolvedRoute {
                    service: target.name.clone(),
                    service_url: target.url.clone(),
                    target_path: legacy.target.clone(),
                },
            );

            let old_prefix = legacy.path.trim_end_matches('/');
            let new_prefix = legacy.target.trim_end_matches('/');
            prefixes.insert(PrefixRoute::new(target, old_prefix, new_prefix));
        }

        for service in services {
            let target = &targets[service.name.as_str()];
            for prefix in &service.routes {
                prefixes.insert(PrefixRoute::new(target, prefix, prefix));
            }
        }

        let mut prefixes = prefixes.entries;
        // Stable: equal lengths keep registration order.
        prefixes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        tracing::info!(
            exact_routes = exact.len(),
            prefix_routes = prefixes.len(),
            skipped,
            "Route table compiled"
        );

        Self { exact, prefixes }
    }

    /// Exact lookup of a configured legacy path.
    pub fn lookup_exact(&self, path: &str) -> Option<&ResolvedRoute> {
        self.exact.get(path)
    }

    /// First (longest) prefix entry matching `path`.
    pub fn lookup_prefix(&self, path: &str) -> Option<&PrefixRoute> {
        self.prefixes.iter().find(|entry| entry.matches(path))
    }

    /// Prefix entries, longest first.
    pub fn prefixes(&self) -> &[PrefixRoute] {
        &self.prefixes
    }

    pub fn exact_len(&self) -> usize {
        self.exact.len()
    }

    pub fn prefix_len(&self) -> usize {
        self.prefixes.len()
    }
}

/// Insertion-ordered prefix set where re-registration replaces in place.
#[derive(Default)]
struct PrefixSet {
    positions: HashMap<String, usize>,
    entries: Vec<PrefixRoute>,
}

impl PrefixSet {
    fn insert(&mut self, entry: PrefixRoute) {
        match self.positions.get(&entry.prefix) {
            Some(&idx) => self.entries[idx] = entry,
            None => {
                self.positions.insert(entry.prefix.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}
