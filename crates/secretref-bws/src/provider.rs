//! Bitwarden Secrets Manager provider
//!
//! Resolves `secretref:bws:<ref>` where `<ref>` is either a secret ID or
//! `project/<projectName>/key/<keyName>`. Secret IDs go straight to the
//! backend; project/key pairs are mapped to an ID through the
//! [`ResolutionCache`] first. Secret values are always fetched live.

use crate::cache::{Clock, ResolutionCache};
use crate::cancel::run_cancellable;
use crate::cli_client::BwsCliClient;
use crate::client::BwsClient;
use crate::config::BwsConfig;
use crate::error::{Error, Result};
use crate::reference::BwsRef;
use async_trait::async_trait;
use secretref_core::{SecretProvider, SecureString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Name under which the provider is registered
pub const PROVIDER_NAME: &str = "bws";

pub struct BwsProvider {
    client: Arc<dyn BwsClient>,
    organization_id: Option<String>,
    cache: ResolutionCache,
    closed: AtomicBool,
}

impl BwsProvider {
    /// Create a provider over an existing client
    pub fn new(client: Arc<dyn BwsClient>, organization_id: Option<String>, cache_ttl: Duration) -> Self {
        let organization_id = organization_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Self {
            client,
            organization_id,
            cache: ResolutionCache::new(cache_ttl),
            closed: AtomicBool::new(false),
        }
    }

    /// Apply env defaults, validate, and connect through the `bws` CLI
    pub fn from_config(config: BwsConfig) -> Result<Self> {
        let config = config.with_env_defaults();
        config.validate()?;

        let client = BwsCliClient::new(&config).map_err(|source| Error::Setup { source })?;
        if config.organization_id().is_none() {
            debug!("bws organization id not set; only secret-id references will resolve");
        }

        Ok(Self::new(
            Arc::new(client),
            config.organization_id().map(str::to_owned),
            config.cache_ttl(),
        ))
    }

    /// Replace the clock used for cache expiry
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.cache = self.cache.with_clock(clock);
        self
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.organization_id.as_deref()
    }

    /// Resolve a bws reference to its secret value
    pub async fn resolve(&self, cancel: &CancellationToken, reference: &str) -> Result<SecureString> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyReference);
        }
        if self.is_closed() {
            return Err(Error::Closed);
        }

        match BwsRef::parse(trimmed) {
            BwsRef::ProjectKey { project, key } => {
                self.resolve_by_project_key(cancel, project, key).await
            }
            BwsRef::Direct(id) => {
                debug!("Resolving bws secret by id");
                self.fetch_secret(cancel, id).await
            }
        }
    }

    async fn resolve_by_project_key(
        &self,
        cancel: &CancellationToken,
        project: &str,
        key: &str,
    ) -> Result<SecureString> {
        let Some(organization_id) = self.organization_id.as_deref() else {
            warn!(project, key, "bws organization id missing");
            return Err(Error::organization_required(project, key));
        };

        self.cache
            .ensure_fresh(self.client.as_ref(), organization_id, cancel)
            .await?;

        let secret_id = match self.cache.lookup(project, key).await {
            Ok(id) => id,
            Err(e) => {
                match &e {
                    Error::ProjectNotFound { .. } => {
                        warn!(project, key, "bws project not found")
                    }
                    _ => warn!(project, key, "bws secret not found"),
                }
                return Err(e);
            }
        };

        debug!(project, key, "Resolved bws project/key to secret id");
        self.fetch_secret(cancel, &secret_id).await
    }

    async fn fetch_secret(&self, cancel: &CancellationToken, id: &str) -> Result<SecureString> {
        let secret = run_cancellable(cancel, async {
            self.client
                .get_secret(id)
                .await
                .map_err(|e| Error::fetch_failed(id, e))
        })
        .await?;

        Ok(secret.into_value())
    }

    /// Close the backend client and drop cached mappings
    ///
    /// Only the first call has any effect. A refresh still in flight finishes
    /// its backend calls but its snapshot is discarded.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.cache.close().await;
        self.client.close().await;
        info!("bws provider closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for BwsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BwsProvider")
            .field("organization_id", &self.organization_id)
            .field("cache", &self.cache)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretProvider for BwsProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn resolve(
        &self,
        cancel: &CancellationToken,
        reference: &str,
    ) -> anyhow::Result<SecureString> {
        Ok(BwsProvider::resolve(self, cancel, reference).await?)
    }

    async fn close(&self) -> anyhow::Result<()> {
        BwsProvider::close(self).await;
        Ok(())
    }
}
