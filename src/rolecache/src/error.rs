//! Error types for role resolution

use std::time::Duration;
use thiserror::Error;

/// Errors reported by a role directory client
///
/// The cache layer never inspects the variant. Whatever the directory
/// reports is handed back to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// Directory could not be reached or refused the request
    #[error("Directory unavailable: {0}")]
    Unavailable(String),

    /// Directory call exceeded the client's own deadline
    #[error("Directory call timed out after {0:?}")]
    Timeout(Duration),

    /// Directory has no record of the principal
    #[error("Principal not found: {0}")]
    PrincipalNotFound(String),

    /// Directory answered with something the client could not interpret
    #[error("Directory protocol error: {0}")]
    Protocol(String),
}

/// Role cache errors
#[derive(Debug, Error)]
pub enum RoleCacheError {
    /// Directory call failed and no fallback entry exists for the principal
    #[error("Role directory unavailable for '{principal}': {source}")]
    DirectoryUnavailable {
        principal: String,
        #[source]
        source: DirectoryError,
    },

    /// Rejected cache configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metric creation or registration failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl RoleCacheError {
    /// The directory failure behind a hard miss, if this is one
    pub fn directory_error(&self) -> Option<&DirectoryError> {
        match self {
            RoleCacheError::DirectoryUnavailable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type for role cache operations
pub type Result<T> = std::result::Result<T, RoleCacheError>;
