//! # CretoAI Role Cache
//!
//! Resolves a principal's roles from an upstream directory (LDAP or
//! similar) behind a two-tier cache:
//!
//! - **Primary cache**: short TTL, bounded size, serves normal traffic
//! - **Fallback cache**: long or no TTL, read only when the directory fails
//! - **Health reporting**: directory health mapped 1:1 for operators
//!
//! ## Example
//!
//! ```rust
//! use cretoai_rolecache::{CachedRoleResolver, RoleCacheConfig, RoleSet, StaticRoleDirectory};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = Arc::new(StaticRoleDirectory::new());
//! directory.insert("user:alice", RoleSet::new(["admin", "auditor"])).await;
//!
//! let resolver = CachedRoleResolver::new(&RoleCacheConfig::default(), directory)?;
//!
//! let roles = resolver.resolve("user:alice").await?;
//! assert!(roles.contains("admin"));
//!
//! let health = resolver.health_reporter().check_health().await;
//! assert!(health.healthy);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod health;
pub mod metrics;
pub mod resolver;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::MockClock;
pub use config::RoleCacheConfig;
pub use directory::{DirectoryHealth, RoleDirectoryClient, StaticRoleDirectory};
pub use error::{DirectoryError, Result, RoleCacheError};
pub use health::{HealthMonitor, HealthReporter, HealthStatus};
pub use metrics::{ResolverMetrics, ResolverMetricsSnapshot};
pub use resolver::CachedRoleResolver;
pub use store::{
    CacheStats, CacheTier, EvictionCause, EvictionEvent, EvictionListener, RoleCacheStore,
    TracingEvictionListener,
};
pub use types::{CacheEntry, PrincipalId, Resolution, RoleSet, RoleSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
