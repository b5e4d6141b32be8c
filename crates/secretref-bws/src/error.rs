//! Error types for secretref-bws

use crate::client::ClientError;
use thiserror::Error;

/// Result type alias using secretref-bws's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds surfaced by the bws provider
///
/// None of the messages carry secret values.
#[derive(Error, Debug)]
pub enum Error {
    /// Reference was empty after trimming
    #[error("bws ref is empty")]
    EmptyReference,

    /// Project/key lookup attempted without an organization ID
    #[error("bws organization id is required for project/key lookup (project {project:?}, key {key:?})")]
    OrganizationRequired { project: String, key: String },

    /// No project with this name in the cached inventory
    #[error("bws project {project:?} not found (key {key:?})")]
    ProjectNotFound { project: String, key: String },

    /// Project exists but holds no secret with this key
    #[error("bws secret {key:?} not found in project {project:?}")]
    SecretNotFound { project: String, key: String },

    /// Listing step of a cache refresh failed
    #[error("bws {operation}: {source}")]
    BackendListFailed {
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    /// Fetching a secret value by ID failed
    #[error("bws get secret {id:?}: {source}")]
    BackendFetchFailed {
        id: String,
        #[source]
        source: ClientError,
    },

    /// Caller cancelled the operation
    #[error("bws operation cancelled")]
    Cancelled,

    /// Provider was closed before or during the call
    #[error("bws provider is closed")]
    Closed,

    /// Provider settings were rejected
    #[error("invalid bws configuration: {message}")]
    InvalidConfig { message: String },

    /// Backend client could not be created
    #[error("bws client setup failed: {source}")]
    Setup {
        #[source]
        source: ClientError,
    },
}

impl Error {
    pub fn organization_required(project: impl Into<String>, key: impl Into<String>) -> Self {
        Self::OrganizationRequired {
            project: project.into(),
            key: key.into(),
        }
    }

    pub fn project_not_found(project: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ProjectNotFound {
            project: project.into(),
            key: key.into(),
        }
    }

    pub fn secret_not_found(project: impl Into<String>, key: impl Into<String>) -> Self {
        Self::SecretNotFound {
            project: project.into(),
            key: key.into(),
        }
    }

    pub fn list_failed(operation: &'static str, source: ClientError) -> Self {
        Self::BackendListFailed { operation, source }
    }

    pub fn fetch_failed(id: impl Into<String>, source: ClientError) -> Self {
        Self::BackendFetchFailed {
            id: id.into(),
            source,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Lookup misses reflect current backend state and are never retried
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ProjectNotFound { .. } | Self::SecretNotFound { .. }
        )
    }
}
