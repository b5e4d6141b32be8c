//! Backend capability consumed by the resolution cache
//!
//! Narrow on purpose: the cache and provider only need listing, batch fetch
//! and single fetch. Adapters (the `bws` CLI, test fakes) implement this trait.

use async_trait::async_trait;
use secretref_core::SecureString;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Failures reported by a backend client
#[derive(Error, Debug)]
pub enum ClientError {
    /// Client used after `close()`
    #[error("bws client is closed")]
    Closed,

    /// bws binary could not be located
    #[error("bws CLI not found ({path}): {message}")]
    NotInstalled { path: String, message: String },

    /// Process could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bws {command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// Non-zero exit; stderr is sanitized
    #[error("bws {command} failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("failed to parse bws {command} output: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other backend-reported failure
    #[error("bws backend error: {0}")]
    Backend(String),
}

/// Project record from a project listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub organization_id: String,
}

/// Lightweight secret metadata; carries no value
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretIdentifier {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub organization_id: String,
}

/// Full secret record; the value is zeroed on drop
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    #[zeroize(skip)]
    pub id: String,
    #[zeroize(skip)]
    #[serde(default)]
    pub key: String,
    #[zeroize(skip)]
    #[serde(default)]
    pub project_id: Option<String>,
    #[zeroize(skip)]
    #[serde(default)]
    pub organization_id: String,
    #[serde(default)]
    pub value: String,
}

impl Secret {
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        project_id: Option<&str>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            project_id: project_id.map(str::to_owned),
            organization_id: String::new(),
            value: value.into(),
        }
    }

    /// Move the value out, leaving an empty string behind
    pub fn into_value(mut self) -> SecureString {
        SecureString::new(std::mem::take(&mut self.value))
    }

    pub fn identifier(&self) -> SecretIdentifier {
        SecretIdentifier {
            id: self.id.clone(),
            key: self.key.clone(),
            organization_id: self.organization_id.clone(),
        }
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("project_id", &self.project_id)
            .field("organization_id", &self.organization_id)
            .field("value", &format_args!("[REDACTED {} bytes]", self.value.len()))
            .finish()
    }
}

/// Backend operations the resolution engine depends on
#[async_trait]
pub trait BwsClient: Send + Sync {
    /// All projects visible to the session within `organization_id`
    async fn list_projects(&self, organization_id: &str) -> Result<Vec<Project>, ClientError>;

    /// Secret metadata (no values) within `organization_id`
    async fn list_secret_identifiers(
        &self,
        organization_id: &str,
    ) -> Result<Vec<SecretIdentifier>, ClientError>;

    /// Full records, including project ID and key, for the given IDs
    async fn get_secrets_by_ids(&self, ids: &[String]) -> Result<Vec<Secret>, ClientError>;

    /// One secret by ID
    async fn get_secret(&self, id: &str) -> Result<Secret, ClientError>;

    /// Release session resources; safe to call repeatedly
    async fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug_redacts_value() {
        let secret = Secret::new("s1", "TOKEN", Some("p1"), "hunter2");
        let debug_str = format!("{:?}", secret);
        assert!(debug_str.contains("REDACTED 7 bytes"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_secret_deserialize_camel_case() {
        let secret: Secret = serde_json::from_str(
            r#"{
                "id": "s1",
                "organizationId": "org",
                "projectId": "p1",
                "key": "TOKEN",
                "value": "abc",
                "note": "",
                "creationDate": "2026-02-06T12:00:00Z",
                "revisionDate": "2026-02-06T12:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(secret.project_id.as_deref(), Some("p1"));
        assert_eq!(secret.organization_id, "org");
        assert_eq!(secret.identifier().key, "TOKEN");
        assert_eq!(secret.into_value().as_str(), "abc");
    }

    #[test]
    fn test_secret_without_project() {
        let secret: Secret =
            serde_json::from_str(r#"{"id": "s2", "key": "LOOSE", "projectId": null}"#).unwrap();
        assert!(secret.project_id.is_none());
    }
}
