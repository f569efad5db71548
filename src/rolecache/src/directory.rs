//! Role directory client abstraction
//!
//! The directory (LDAP or similar) is an external collaborator. The cache
//! only needs two capabilities from it: fetch the roles of one principal,
//! and report its own health.

use crate::error::{DirectoryError, RoleCacheError, Result};
use crate::types::RoleSet;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health signal reported by a directory client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryHealth {
    pub healthy: bool,
    pub details: String,
}

impl DirectoryHealth {
    pub fn healthy(details: impl Into<String>) -> Self {
        Self {
            healthy: true,
            details: details.into(),
        }
    }

    pub fn unhealthy(details: impl Into<String>) -> Self {
        Self {
            healthy: false,
            details: details.into(),
        }
    }
}

/// Directory capability consumed by the resolver
///
/// Implementations own their timeout and connection policy. A principal
/// with zero roles must yield an empty `RoleSet`, never an error.
#[async_trait]
pub trait RoleDirectoryClient: Send + Sync {
    /// Fetch the current roles of a principal
    async fn fetch_roles(&self, principal: &str) -> std::result::Result<RoleSet, DirectoryError>;

    /// Cheap, non-destructive health probe
    async fn check_health(&self) -> DirectoryHealth;
}

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    principals: HashMap<String, Vec<String>>,
}

/// In-memory directory backed by a fixed principal table
///
/// Useful for tests and for running the probe without a live directory.
/// Can be switched offline to simulate an outage.
pub struct StaticRoleDirectory {
    principals: Arc<RwLock<HashMap<String, RoleSet>>>,
    available: AtomicBool,
}

impl StaticRoleDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self {
            principals: Arc::new(RwLock::new(HashMap::new())),
            available: AtomicBool::new(true),
        }
    }

    /// Load a principal table from a TOML file
    ///
    /// ```toml
    /// [principals]
    /// "user:alice" = ["admin", "auditor"]
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RoleCacheError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let file: DirectoryFile = toml::from_str(&contents)
            .map_err(|e| RoleCacheError::Config(format!("failed to parse directory file: {}", e)))?;

        let principals = file
            .principals
            .into_iter()
            .map(|(principal, roles)| (principal, RoleSet::new(roles)))
            .collect();

        Ok(Self {
            principals: Arc::new(RwLock::new(principals)),
            available: AtomicBool::new(true),
        })
    }

    /// Add or replace a principal's roles
    pub async fn insert(&self, principal: impl Into<String>, roles: RoleSet) {
        let mut principals = self.principals.write().await;
        principals.insert(principal.into(), roles);
    }

    /// Remove a principal
    pub async fn remove(&self, principal: &str) {
        let mut principals = self.principals.write().await;
        principals.remove(principal);
    }

    /// Simulate the directory going offline or coming back
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

impl Default for StaticRoleDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleDirectoryClient for StaticRoleDirectory {
    async fn fetch_roles(&self, principal: &str) -> std::result::Result<RoleSet, DirectoryError> {
        if !self.is_available() {
            return Err(DirectoryError::Unavailable("static directory offline".to_string()));
        }

        let principals = self.principals.read().await;
        principals
            .get(principal)
            .cloned()
            .ok_or_else(|| DirectoryError::PrincipalNotFound(principal.to_string()))
    }

    async fn check_health(&self) -> DirectoryHealth {
        if self.is_available() {
            let count = self.principals.read().await.len();
            DirectoryHealth::healthy(format!("static directory online, {} principals", count))
        } else {
            DirectoryHealth::unhealthy("static directory offline")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_directory_lookup() {
        let directory = StaticRoleDirectory::new();
        directory.insert("user:alice", RoleSet::new(["admin"])).await;
        directory.insert("user:nobody", RoleSet::empty()).await;

        let roles = directory.fetch_roles("user:alice").await.unwrap();
        assert!(roles.contains("admin"));

        // Zero roles is a successful answer
        let roles = directory.fetch_roles("user:nobody").await.unwrap();
        assert!(roles.is_empty());

        let err = directory.fetch_roles("user:ghost").await.unwrap_err();
        assert_eq!(err, DirectoryError::PrincipalNotFound("user:ghost".to_string()));
    }

    #[tokio::test]
    async fn test_static_directory_outage() {
        let directory = StaticRoleDirectory::new();
        directory.insert("user:alice", RoleSet::new(["admin"])).await;

        directory.set_available(false);
        assert!(matches!(
            directory.fetch_roles("user:alice").await,
            Err(DirectoryError::Unavailable(_))
        ));
        assert!(!directory.check_health().await.healthy);

        directory.set_available(true);
        assert!(directory.fetch_roles("user:alice").await.is_ok());
        let health = directory.check_health().await;
        assert!(health.healthy);
        assert!(health.details.contains("1 principals"));
    }

    #[tokio::test]
    async fn test_static_directory_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("directory.toml");
        std::fs::write(
            &path,
            "[principals]\n\"user:alice\" = [\"admin\", \"auditor\"]\n\"user:bob\" = []\n",
        )
        .unwrap();

        let directory = StaticRoleDirectory::from_file(&path).unwrap();
        assert_eq!(directory.fetch_roles("user:alice").await.unwrap().len(), 2);
        assert!(directory.fetch_roles("user:bob").await.unwrap().is_empty());
    }
}
