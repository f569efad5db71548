//! Shared fixtures for role cache integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cretoai_rolecache::{
    CachedRoleResolver, DirectoryError, DirectoryHealth, MockClock, RoleCacheConfig,
    RoleCacheStore, RoleDirectoryClient, RoleSet,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock directory that counts calls and can be switched into failure
pub struct MockDirectory {
    roles: Mutex<HashMap<String, RoleSet>>,
    calls: AtomicUsize,
    failure: Mutex<Option<DirectoryError>>,
    healthy: AtomicBool,
    latency: Duration,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self {
            roles: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
            healthy: AtomicBool::new(true),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_roles(self, principal: &str, roles: RoleSet) -> Self {
        self.set_roles(principal, roles);
        self
    }

    pub fn set_roles(&self, principal: &str, roles: RoleSet) {
        self.roles.lock().insert(principal.to_string(), roles);
    }

    pub fn set_failing(&self, failing: bool) {
        let failure = failing.then(|| {
            DirectoryError::Unavailable("ldap://directory: connection refused".to_string())
        });
        *self.failure.lock() = failure;
    }

    /// Fail every fetch with the given error
    pub fn fail_with(&self, error: DirectoryError) {
        *self.failure.lock() = Some(error);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleDirectoryClient for MockDirectory {
    async fn fetch_roles(&self, principal: &str) -> Result<RoleSet, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }

        Ok(self
            .roles
            .lock()
            .get(principal)
            .cloned()
            .unwrap_or_default())
    }

    async fn check_health(&self) -> DirectoryHealth {
        if self.healthy.load(Ordering::SeqCst) {
            DirectoryHealth::healthy("directory reachable")
        } else {
            DirectoryHealth::unhealthy("directory unreachable")
        }
    }
}

/// Resolver with default config driven by a mock clock
pub fn test_resolver(directory: Arc<MockDirectory>) -> (CachedRoleResolver, MockClock) {
    test_resolver_with_config(directory, RoleCacheConfig::default())
}

pub fn test_resolver_with_config(
    directory: Arc<MockDirectory>,
    config: RoleCacheConfig,
) -> (CachedRoleResolver, MockClock) {
    let clock = MockClock::new();
    let store = RoleCacheStore::new(&config)
        .unwrap()
        .with_clock(Arc::new(clock.clone()));
    let resolver = CachedRoleResolver::with_store(Arc::new(store), directory).unwrap();
    (resolver, clock)
}

/// Just past the default primary TTL
pub fn past_primary_ttl() -> Duration {
    RoleCacheConfig::default().primary_ttl() + Duration::from_secs(1)
}
