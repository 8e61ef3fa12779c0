//! Path resolution with a bounded memoization layer.
//!
//! # Responsibilities
//! - Map an inbound path to a service URL and target path
//! - Memoize prefix resolutions for repeated concrete paths
//! - Count lookups per outcome for instrumentation
//!
//! # Design Decisions
//! - Lookup order: static exact map, memo cache, prefix scan
//! - The memo cache only stores values the prefix scan would produce again,
//!   so it never changes the answer for a path
//! - Cache keys come from client paths, so the cache is an LRU with a fixed
//!   capacity
//! - Static exact entries live outside the LRU and are never evicted

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use serde::Serialize;
use thiserror::Error;

use crate::observability::metrics;
use crate::routing::table::{ResolvedRoute, RouteTable};

/// No exact or prefix entry matched the path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Route not found: {0}")]
pub struct RouteNotFound(pub String);

/// Snapshot of resolver state and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub exact_routes: usize,
    pub prefix_routes: usize,
    pub cached_routes: usize,
    pub cache_capacity: usize,
    pub exact_hits: u64,
    pub cache_hits: u64,
    pub prefix_hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct Counters {
    exact_hits: AtomicU64,
    cache_hits: AtomicU64,
    prefix_hits: AtomicU64,
    misses: AtomicU64,
}

/// Resolves inbound paths against an immutable [`RouteTable`].
pub struct Resolver {
    table: RouteTable,
    cache: Mutex<LruCache<String, ResolvedRoute>>,
    counters: Counters,
}

impl Resolver {
    /// Create a resolver whose memo cache holds at most `cache_capacity`
    /// entries (minimum 1).
    pub fn new(table: RouteTable, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            table,
            cache: Mutex::new(LruCache::new(capacity)),
            counters: Counters::default(),
        }
    }

    /// Resolve `path` to a target service and path.
    pub fn resolve(&self, path: &str) -> Result<ResolvedRoute, RouteNotFound> {
        if let Some(route) = self.table.lookup_exact(path) {
            self.counters.exact_hits.fetch_add(1, Ordering::Relaxed);
            metrics::record_route_lookup("exact");
            tracing::debug!(path = %path, service = %route.service, target = %route.target_path, "Exact route");
            return Ok(route.clone());
        }

        if let Some(route) = self.lock_cache().get(path).cloned() {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            metrics::record_route_lookup("cached");
            return Ok(route);
        }

        match self.table.lookup_prefix(path) {
            Some(entry) => {
                let route = entry.resolve(path);
                self.counters.prefix_hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_route_lookup("prefix");
                tracing::debug!(
                    path = %path,
                    prefix = %entry.prefix,
                    service = %route.service,
                    target = %route.target_path,
                    "Prefix route"
                );

                let mut cache = self.lock_cache();
                cache.put(path.to_string(), route.clone());
                metrics::record_route_cache_size(cache.len());
                Ok(route)
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                metrics::record_route_lookup("miss");
                tracing::warn!(
                    path = %path,
                    exact_routes = self.table.exact_len(),
                    prefix_routes = self.table.prefix_len(),
                    "Route not found"
                );
                Err(RouteNotFound(path.to_string()))
            }
        }
    }

    /// The underlying route table.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn stats(&self) -> ResolverStats {
        let cache = self.lock_cache();
        ResolverStats {
            exact_routes: self.table.exact_len(),
            prefix_routes: self.table.prefix_len(),
            cached_routes: cache.len(),
            cache_capacity: cache.cap().get(),
            exact_hits: self.counters.exact_hits.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            prefix_hits: self.counters.prefix_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
        }
    }

    // Cache entries are plain values; a panic mid-update cannot leave one
    // half-written, so a poisoned lock is still usable.
    fn lock_cache(&self) -> MutexGuard<'_, LruCache<String, ResolvedRoute>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LegacyRouteConfig, ServiceConfig};

    fn services() -> Vec<ServiceConfig> {
        vec![
            ServiceConfig::new("tenant", "http://tenant:8001", &["/api/tenants/"]),
            ServiceConfig::new("auth", "http://auth:8002", &["/api/auth/"]),
            ServiceConfig::new(
                "documents",
                "http://documents:8004",
                &["/api/quotes/", "/api/devis/", "/quotes/"],
            ),
        ]
    }

    fn legacy() -> Vec<LegacyRouteConfig> {
        vec![
            LegacyRouteConfig::new("/auth/login/", "auth", "/api/auth/login/"),
            LegacyRouteConfig::new("/api/auth/tenants/", "tenant", "/api/tenants/"),
            LegacyRouteConfig::new("/api/devis/", "documents", "/api/quotes/"),
            LegacyRouteConfig::new("/api/quotes/next-number/", "documents", "/api/quotes/next_number/"),
            LegacyRouteConfig::new("/quotes/{id}/send/", "documents", "/api/quotes/{id}/send/"),
            LegacyRouteConfig::new("/vat-rates/", "documents", "/api/quotes/vat-rates/"),
            LegacyRouteConfig::new("/ghost/", "missing", "/api/ghost/"),
        ]
    }

    fn resolver() -> Resolver {
        Resolver::new(RouteTable::build(&services(), &legacy()), 64)
    }

    #[test]
    fn test_owned_prefix_is_identity() {
        let resolver = resolver();
        for service in services() {
            for prefix in &service.routes {
                let path = format!("{}some/deep/path/", prefix);
                let route = resolver.resolve(&path).unwrap();
                assert_eq!(&*route.service_url, service.url.as_str());
                assert_eq!(route.target_path, path);
            }
        }
    }

    #[test]
    fn test_exact_priority_over_prefix() {
        let resolver = resolver();
        // "/api/quotes/" (owned, identity) also matches, but the legacy
        // entry is exact.
        let route = resolver.resolve("/api/quotes/next-number/").unwrap();
        assert_eq!(route.target_path, "/api/quotes/next_number/");
        assert_eq!(&*route.service, "documents");

        for entry in legacy().iter().filter(|l| l.service != "missing") {
            let route = resolver.resolve(&entry.path).unwrap();
            assert_eq!(route.target_path, entry.target);
        }
        assert_eq!(resolver.stats().exact_hits, 7);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let resolver = resolver();
        // "/api/auth/" (owned by auth) is a proper prefix of
        // "/api/auth/tenants" (legacy, tenant).
        let route = resolver.resolve("/api/auth/tenants/abc/stats/").unwrap();
        assert_eq!(&*route.service, "tenant");
        assert_eq!(route.target_path, "/api/tenants/abc/stats/");

        let route = resolver.resolve("/api/auth/profile/").unwrap();
        assert_eq!(&*route.service, "auth");
        assert_eq!(route.target_path, "/api/auth/profile/");
    }

    #[test]
    fn test_owned_prefix_beats_shorter_legacy_prefix() {
        let resolver = resolver();
        // "/api/devis/" (owned, 11 chars) is longer than the legacy prefix
        // "/api/devis" (10 chars), so no rewrite happens.
        let route = resolver.resolve("/api/devis/12/").unwrap();
        assert_eq!(route.target_path, "/api/devis/12/");
    }

    #[test]
    fn test_legacy_prefix_rewrite() {
        let resolver = resolver();
        let route = resolver.resolve("/auth/login/extra").unwrap();
        assert_eq!(route.target_path, "/api/auth/login/extra");
        assert_eq!(route.url(), "http://auth:8002/api/auth/login/extra");
    }

    #[test]
    fn test_memoized_second_lookup() {
        let resolver = resolver();
        let first = resolver.resolve("/api/tenants/42/").unwrap();
        let before = resolver.stats();
        assert_eq!(before.prefix_hits, 1);
        assert_eq!(before.cache_hits, 0);
        assert_eq!(before.cached_routes, 1);

        let second = resolver.resolve("/api/tenants/42/").unwrap();
        assert_eq!(first, second);
        let after = resolver.stats();
        assert_eq!(after.cache_hits, 1);
        assert_eq!(after.prefix_hits, 1);
    }

    #[test]
    fn test_not_found_leaves_state_unchanged() {
        let resolver = resolver();
        resolver.resolve("/api/tenants/1/").unwrap();
        let before = resolver.stats();

        let err = resolver.resolve("/nowhere/at/all").unwrap_err();
        assert_eq!(err, RouteNotFound("/nowhere/at/all".into()));

        let after = resolver.stats();
        assert_eq!(after.cached_routes, before.cached_routes);
        assert_eq!(after.exact_routes, before.exact_routes);
        assert_eq!(after.prefix_routes, before.prefix_routes);
        assert_eq!(after.misses, 1);
    }

    #[test]
    fn test_unknown_service_never_matches() {
        let resolver = resolver();
        assert!(resolver.resolve("/ghost/").is_err());
        assert!(resolver.resolve("/ghost/1/").is_err());
    }

    #[test]
    fn test_placeholder_entries_are_literal() {
        let resolver = resolver();
        // A concrete id does not bind to "{id}"; the owned "/quotes/" prefix
        // routes it unchanged.
        let route = resolver.resolve("/quotes/17/send/").unwrap();
        assert_eq!(route.target_path, "/quotes/17/send/");

        // Only the literal placeholder text matches the entry.
        let route = resolver.resolve("/quotes/{id}/send/").unwrap();
        assert_eq!(route.target_path, "/api/quotes/{id}/send/");
    }

    #[test]
    fn test_cache_is_bounded() {
        let resolver = Resolver::new(RouteTable::build(&services(), &legacy()), 4);
        for i in 0..100 {
            resolver.resolve(&format!("/api/tenants/{}/", i)).unwrap();
        }
        let stats = resolver.stats();
        assert_eq!(stats.cached_routes, 4);
        assert_eq!(stats.cache_capacity, 4);

        // Evicted paths still resolve to the same answer.
        let route = resolver.resolve("/api/tenants/0/").unwrap();
        assert_eq!(route.target_path, "/api/tenants/0/");
    }

    #[test]
    fn test_concurrent_resolution_is_consistent() {
        let resolver = std::sync::Arc::new(resolver());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                std::thread::spawn(move || resolver.resolve("/api/auth/tenants/9/").unwrap())
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(resolver.stats().cached_routes, 1);
    }
}
