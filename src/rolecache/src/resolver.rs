//! Cached role resolution with directory fallback
//!
//! # Lookup order
//!
//! ```text
//! resolve(P) → primary cache ──hit──────────────────────────→ roles
//!                   │ miss
//!                   ↓
//!              directory.fetch_roles(P) ──ok──→ put(P) both tiers → roles
//!                   │ err
//!                   ↓
//!              fallback cache ──hit──→ roles (degraded, logged)
//!                   │ miss
//!                   ↓
//!              Err(DirectoryUnavailable)
//! ```
//!
//! A fallback hit never refreshes the primary tier, so the next primary
//! miss calls the directory again. That repeated call is the only recovery
//! probe; there is no open/half-open breaker state.
//!
//! Concurrent misses for the same principal each call the directory.
//! The last `put` to finish wins.

use crate::config::RoleCacheConfig;
use crate::directory::RoleDirectoryClient;
use crate::error::{Result, RoleCacheError};
use crate::health::{HealthMonitor, HealthReporter};
use crate::metrics::{ResolverMetrics, ResolverMetricsSnapshot};
use crate::store::{CacheStats, RoleCacheStore};
use crate::types::{Resolution, RoleSet, RoleSource};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Role resolver owning a two-tier cache
///
/// Cheap to clone; clones share the cache, directory client and metrics.
#[derive(Clone)]
pub struct CachedRoleResolver {
    store: Arc<RoleCacheStore>,
    directory: Arc<dyn RoleDirectoryClient>,
    metrics: Arc<ResolverMetrics>,
}

impl CachedRoleResolver {
    /// Create a resolver with a fresh store built from `config`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a rejected configuration.
    pub fn new(config: &RoleCacheConfig, directory: Arc<dyn RoleDirectoryClient>) -> Result<Self> {
        let store = RoleCacheStore::new(config)?;
        Self::with_store(Arc::new(store), directory)
    }

    /// Create a resolver around an existing store
    pub fn with_store(store: Arc<RoleCacheStore>, directory: Arc<dyn RoleDirectoryClient>) -> Result<Self> {
        let metrics = Arc::new(ResolverMetrics::new()?);

        info!("CachedRoleResolver initialized");

        Ok(Self {
            store,
            directory,
            metrics,
        })
    }

    /// Resolve the roles of a principal
    ///
    /// An empty set is a successful answer. An error means no role data is
    /// available at all and must be treated as indeterminate, not as
    /// "no roles".
    pub async fn resolve(&self, principal: &str) -> Result<RoleSet> {
        self.resolve_detailed(principal).await.map(|resolution| resolution.roles)
    }

    /// Resolve the roles of a principal and report where they came from
    pub async fn resolve_detailed(&self, principal: &str) -> Result<Resolution> {
        self.metrics.requests.inc();

        if let Some(roles) = self.store.get(principal) {
            self.metrics.cache_hits.inc();
            debug!(principal, "Role cache hit");
            return Ok(Resolution {
                roles,
                source: RoleSource::Cache,
            });
        }

        debug!(principal, "Role cache miss, querying directory");
        self.metrics.directory_calls.inc();

        match self.directory.fetch_roles(principal).await {
            Ok(roles) => {
                self.store.put(principal, roles.clone());
                debug!(principal, roles = roles.len(), "Roles fetched from directory");
                Ok(Resolution {
                    roles,
                    source: RoleSource::Directory,
                })
            }
            Err(source) => {
                self.metrics.directory_failures.inc();

                match self.store.get_from_fallback(principal) {
                    Some(roles) => {
                        self.metrics.fallback_hits.inc();
                        warn!(
                            principal,
                            error = %source,
                            "Role directory degraded, serving last known roles from fallback cache"
                        );
                        Ok(Resolution {
                            roles,
                            source: RoleSource::Fallback,
                        })
                    }
                    None => {
                        self.metrics.unavailable.inc();
                        error!(
                            principal,
                            error = %source,
                            "Role directory unavailable and no fallback entry"
                        );
                        Err(RoleCacheError::DirectoryUnavailable {
                            principal: principal.to_string(),
                            source,
                        })
                    }
                }
            }
        }
    }

    /// Drop a principal from both cache tiers
    pub fn invalidate(&self, principal: &str) {
        self.store.invalidate(principal);
        debug!(principal, "Role cache entry invalidated");
    }

    /// Drop every cached principal
    pub fn invalidate_all(&self) {
        self.store.invalidate_all();
    }

    /// Sweep expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    /// Health reporter backed by the same directory client
    pub fn health_reporter(&self) -> HealthReporter {
        HealthReporter::new(self.directory.clone())
    }

    /// Background health monitor polling at the configured interval
    ///
    /// The monitor is returned stopped; call [`HealthMonitor::start`].
    pub fn health_monitor(&self, config: &RoleCacheConfig) -> HealthMonitor {
        HealthMonitor::from_config(self.health_reporter(), config)
    }

    pub fn store(&self) -> &Arc<RoleCacheStore> {
        &self.store
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// Live counters, e.g. for registration with a registry
    pub fn metrics(&self) -> &ResolverMetrics {
        &self.metrics
    }

    pub fn metrics_snapshot(&self) -> ResolverMetricsSnapshot {
        self.metrics.snapshot()
    }
}
