//! Core role cache types

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Principal identifier (e.g., "user:alice", "svc:billing")
pub type PrincipalId = String;

/// Immutable set of role names held by one principal
///
/// Cloning is cheap; all clones share the same underlying set. An empty
/// set is a valid result and means "no roles", not "unknown".
#[derive(Clone, PartialEq, Eq, Default)]
pub struct RoleSet(Arc<BTreeSet<String>>);

impl RoleSet {
    /// Create a role set from any collection of role names
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Arc::new(roles.into_iter().map(Into::into).collect()))
    }

    /// Create an empty role set
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate role names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether two role sets share the same allocation
    pub fn ptr_eq(&self, other: &RoleSet) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// One cached resolution result
///
/// The same entry (same roles, same timestamp) is written to the primary
/// and fallback caches; each cache then owns its copy independently.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub principal: PrincipalId,
    pub roles: RoleSet,
    pub inserted_at: Instant,
}

impl CacheEntry {
    pub fn new(principal: impl Into<PrincipalId>, roles: RoleSet, inserted_at: Instant) -> Self {
        Self {
            principal: principal.into(),
            roles,
            inserted_at,
        }
    }

    /// Entry is invalid once strictly more than `ttl` has elapsed
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) > ttl
    }
}

/// Where a resolved role set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSource {
    /// Fresh primary cache entry
    Cache,
    /// Successful directory call
    Directory,
    /// Directory failed; last known good value from the fallback cache
    Fallback,
}

impl RoleSource {
    /// Fallback answers mean the directory is currently failing
    pub fn is_degraded(&self) -> bool {
        matches!(self, RoleSource::Fallback)
    }
}

impl fmt::Display for RoleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleSource::Cache => write!(f, "cache"),
            RoleSource::Directory => write!(f, "directory"),
            RoleSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Role set plus its provenance
#[derive(Debug, Clone)]
pub struct Resolution {
    pub roles: RoleSet,
    pub source: RoleSource,
}
