//! Prometheus counters for role resolution

use prometheus::{IntCounter, Registry};

/// Resolver counters
///
/// Counters are created unregistered; call [`ResolverMetrics::register`] to
/// expose them through a process registry.
#[derive(Debug, Clone)]
pub struct ResolverMetrics {
    pub requests: IntCounter,
    pub cache_hits: IntCounter,
    pub directory_calls: IntCounter,
    pub directory_failures: IntCounter,
    pub fallback_hits: IntCounter,
    pub unavailable: IntCounter,
}

impl ResolverMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            requests: IntCounter::new(
                "rolecache_requests_total",
                "Total role resolution requests",
            )?,
            cache_hits: IntCounter::new(
                "rolecache_cache_hits_total",
                "Resolutions served from the primary cache",
            )?,
            directory_calls: IntCounter::new(
                "rolecache_directory_calls_total",
                "Calls made to the role directory",
            )?,
            directory_failures: IntCounter::new(
                "rolecache_directory_failures_total",
                "Failed role directory calls",
            )?,
            fallback_hits: IntCounter::new(
                "rolecache_fallback_hits_total",
                "Degraded resolutions served from the fallback cache",
            )?,
            unavailable: IntCounter::new(
                "rolecache_unavailable_total",
                "Resolutions that failed with no fallback entry",
            )?,
        })
    }

    /// Register every counter with a registry
    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.requests.clone()))?;
        registry.register(Box::new(self.cache_hits.clone()))?;
        registry.register(Box::new(self.directory_calls.clone()))?;
        registry.register(Box::new(self.directory_failures.clone()))?;
        registry.register(Box::new(self.fallback_hits.clone()))?;
        registry.register(Box::new(self.unavailable.clone()))?;
        Ok(())
    }

    /// Get current counter values
    pub fn snapshot(&self) -> ResolverMetricsSnapshot {
        ResolverMetricsSnapshot {
            requests: self.requests.get(),
            cache_hits: self.cache_hits.get(),
            directory_calls: self.directory_calls.get(),
            directory_failures: self.directory_failures.get(),
            fallback_hits: self.fallback_hits.get(),
            unavailable: self.unavailable.get(),
        }
    }
}

/// Point-in-time copy of [`ResolverMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverMetricsSnapshot {
    pub requests: u64,
    pub cache_hits: u64,
    pub directory_calls: u64,
    pub directory_failures: u64,
    pub fallback_hits: u64,
    pub unavailable: u64,
}

impl ResolverMetricsSnapshot {
    /// Share of requests answered without calling the directory
    pub fn cache_hit_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.requests as f64
        }
    }
}
