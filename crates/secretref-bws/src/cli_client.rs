//! `BwsClient` backed by the `bws` command-line tool
//!
//! Login, session state and transport are left to the tool itself. The
//! access token reaches the child through `BWS_ACCESS_TOKEN` so it never
//! appears in a process listing.

use crate::client::{BwsClient, ClientError, Project, Secret, SecretIdentifier};
use crate::config::BwsConfig;
use async_trait::async_trait;
use secretref_core::{sanitize_error, SecureString};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;
use zeroize::Zeroizing;

pub struct BwsCliClient {
    program: PathBuf,
    access_token: SecureString,
    server_url: Option<String>,
    config_file: Option<PathBuf>,
    profile: Option<String>,
    timeout: Duration,
    closed: AtomicBool,
}

impl BwsCliClient {
    /// Locate the `bws` binary and capture connection settings
    pub fn new(config: &BwsConfig) -> Result<Self, ClientError> {
        let program = which::which(config.bws_path()).map_err(|e| ClientError::NotInstalled {
            path: config.bws_path().display().to_string(),
            message: e.to_string(),
        })?;

        debug!("Using bws CLI at {}", program.display());

        Ok(Self {
            program,
            access_token: SecureString::from(config.access_token.trim()),
            server_url: config.server_url.clone(),
            config_file: config.config_file.clone(),
            profile: config.profile.clone(),
            timeout: config.command_timeout(),
            closed: AtomicBool::new(false),
        })
    }

    /// Run one bws subcommand and return its stdout
    async fn run(&self, args: &[&str]) -> Result<Zeroizing<Vec<u8>>, ClientError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClientError::Closed);
        }

        let command = args
            .iter()
            .take_while(|a| **a != "--")
            .copied()
            .collect::<Vec<_>>()
            .join(" ");

        let mut cmd = Command::new(&self.program);
        cmd.args(["--output", "json"]);
        if let Some(url) = &self.server_url {
            cmd.arg("--server-url").arg(url);
        }
        if let Some(file) = &self.config_file {
            cmd.arg("--config-file").arg(file);
        }
        if let Some(profile) = &self.profile {
            cmd.arg("--profile").arg(profile);
        }
        cmd.args(args)
            .env("BWS_ACCESS_TOKEN", self.access_token.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %command, "Running bws");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| ClientError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?,
            Err(_) => {
                return Err(ClientError::Timeout {
                    command,
                    timeout: self.timeout,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::CommandFailed {
                command,
                status: output.status.to_string(),
                stderr: sanitize_error(stderr.trim()),
            });
        }

        Ok(Zeroizing::new(output.stdout))
    }

    async fn list_secrets(&self) -> Result<Vec<Secret>, ClientError> {
        let stdout = self.run(&["secret", "list"]).await?;
        parse_json(&stdout, "secret list")
    }
}

impl std::fmt::Debug for BwsCliClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BwsCliClient")
            .field("program", &self.program)
            .field("server_url", &self.server_url)
            .field("profile", &self.profile)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(stdout: &[u8], command: &str) -> Result<T, ClientError> {
    serde_json::from_slice(stdout).map_err(|source| ClientError::Parse {
        command: command.to_string(),
        source,
    })
}

/// Records without an organization are kept; bws always reports one
fn in_organization(record_org: &str, organization_id: &str) -> bool {
    record_org.is_empty() || record_org == organization_id
}

#[async_trait]
impl BwsClient for BwsCliClient {
    async fn list_projects(&self, organization_id: &str) -> Result<Vec<Project>, ClientError> {
        let stdout = self.run(&["project", "list"]).await?;
        let projects: Vec<Project> = parse_json(&stdout, "project list")?;

        Ok(projects
            .into_iter()
            .filter(|p| in_organization(&p.organization_id, organization_id))
            .collect())
    }

    async fn list_secret_identifiers(
        &self,
        organization_id: &str,
    ) -> Result<Vec<SecretIdentifier>, ClientError> {
        let secrets = self.list_secrets().await?;

        Ok(secrets
            .iter()
            .filter(|s| in_organization(&s.organization_id, organization_id))
            .map(Secret::identifier)
            .collect())
    }

    async fn get_secrets_by_ids(&self, ids: &[String]) -> Result<Vec<Secret>, ClientError> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let secrets = self.list_secrets().await?;

        Ok(secrets
            .into_iter()
            .filter(|s| wanted.contains(s.id.as_str()))
            .collect())
    }

    async fn get_secret(&self, id: &str) -> Result<Secret, ClientError> {
        let stdout = self.run(&["secret", "get", "--", id]).await?;
        parse_json(&stdout, "secret get")
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("bws CLI client closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_project_list() {
        let projects: Vec<Project> = parse_json(
            br#"[
                {"id": "p1", "organizationId": "org", "name": "dotenv",
                 "creationDate": "2026-02-06T12:00:00Z", "revisionDate": "2026-02-06T12:00:00Z"},
                {"id": "p2", "organizationId": "other", "name": "infra"}
            ]"#,
            "project list",
        )
        .unwrap();

        let in_org: Vec<_> = projects
            .iter()
            .filter(|p| in_organization(&p.organization_id, "org"))
            .collect();
        assert_eq!(in_org.len(), 1);
        assert_eq!(in_org[0].name, "dotenv");
    }

    #[test]
    fn test_parse_error_names_command() {
        let err = parse_json::<Vec<Project>>(b"Error: not logged in", "project list").unwrap_err();
        assert!(err.to_string().contains("project list"));
    }

    #[test]
    fn test_missing_binary() {
        let config = BwsConfig {
            access_token: "0.token".to_string(),
            bws_path: Some(PathBuf::from("/nonexistent/bin/bws")),
            ..Default::default()
        };

        let err = BwsCliClient::new(&config).unwrap_err();
        assert!(matches!(err, ClientError::NotInstalled { .. }));
    }

    #[cfg(unix)]
    mod script {
        use super::*;
        use serial_test::serial;
        use std::os::unix::fs::PermissionsExt;

        const FAKE_BWS: &str = r#"#!/bin/sh
if [ "$BWS_ACCESS_TOKEN" != "0.test-token" ]; then
  echo "Error: invalid access token=$BWS_ACCESS_TOKEN" >&2
  exit 1
fi
case "$*" in
  *"project list"*)
    echo '[{"id":"p1","organizationId":"org","name":"dotenv"},{"id":"p2","organizationId":"elsewhere","name":"foreign"}]'
    ;;
  *"secret list"*)
    echo '[{"id":"s1","organizationId":"org","projectId":"p1","key":"TOKEN","value":"abc"},{"id":"s2","organizationId":"org","projectId":null,"key":"LOOSE","value":"x"}]'
    ;;
  *"secret get -- s1"*)
    echo '{"id":"s1","organizationId":"org","projectId":"p1","key":"TOKEN","value":"abc"}'
    ;;
  *"slow"*)
    sleep 5
    ;;
  *)
    echo "Error: Resource not found" >&2
    exit 2
    ;;
esac
"#;

        fn fake_bws(dir: &tempfile::TempDir, token: &str) -> BwsCliClient {
            let path = dir.path().join("bws");
            std::fs::write(&path, FAKE_BWS).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

            let config = BwsConfig {
                access_token: token.to_string(),
                bws_path: Some(path),
                command_timeout: Some(Duration::from_millis(500)),
                ..Default::default()
            };
            BwsCliClient::new(&config).unwrap()
        }

        #[tokio::test]
        #[serial]
        async fn test_list_and_get_through_cli() {
            let dir = tempfile::tempdir().unwrap();
            let client = fake_bws(&dir, "0.test-token");

            let projects = client.list_projects("org").await.unwrap();
            assert_eq!(projects.len(), 1);
            assert_eq!(projects[0].id, "p1");

            let identifiers = client.list_secret_identifiers("org").await.unwrap();
            assert_eq!(identifiers.len(), 2);

            let secrets = client
                .get_secrets_by_ids(&["s1".to_string()])
                .await
                .unwrap();
            assert_eq!(secrets.len(), 1);
            assert_eq!(secrets[0].project_id.as_deref(), Some("p1"));

            let secret = client.get_secret("s1").await.unwrap();
            assert_eq!(secret.into_value().as_str(), "abc");
        }

        #[tokio::test]
        #[serial]
        async fn test_failure_stderr_is_sanitized() {
            let dir = tempfile::tempdir().unwrap();
            let client = fake_bws(&dir, "0.wrong-token");

            let err = client.list_projects("org").await.unwrap_err();
            let msg = err.to_string();
            assert!(matches!(err, ClientError::CommandFailed { .. }));
            assert!(msg.contains("project list"), "got: {}", msg);
            assert!(!msg.contains("0.wrong-token"), "got: {}", msg);
        }

        #[tokio::test]
        #[serial]
        async fn test_unknown_secret_fails() {
            let dir = tempfile::tempdir().unwrap();
            let client = fake_bws(&dir, "0.test-token");

            let err = client.get_secret("missing").await.unwrap_err();
            assert!(err.to_string().contains("Resource not found"));
        }

        #[tokio::test]
        #[serial]
        async fn test_command_timeout() {
            let dir = tempfile::tempdir().unwrap();
            let client = fake_bws(&dir, "0.test-token");

            let err = client.run(&["slow"]).await.unwrap_err();
            assert!(matches!(err, ClientError::Timeout { .. }));
        }

        #[tokio::test]
        #[serial]
        async fn test_closed_client_refuses_calls() {
            let dir = tempfile::tempdir().unwrap();
            let client = fake_bws(&dir, "0.test-token");

            client.close().await;
            client.close().await;

            let err = client.list_projects("org").await.unwrap_err();
            assert!(matches!(err, ClientError::Closed));
        }
    }
}
