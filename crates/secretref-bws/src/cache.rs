//! Name-to-ID resolution cache
//!
//! Maps project names to project IDs and (project ID, key) pairs to secret IDs
//! so project/key lookups don't re-list the whole inventory. Values are never
//! cached; only identifiers.
//!
//! Refreshes build a complete [`CacheSnapshot`] with no lock held and swap it
//! in under the write lock. Readers therefore see either the previous snapshot
//! or the new one, never a mix. Concurrent refreshes are allowed; the last swap
//! wins. Once [`ResolutionCache::close`] has run, no refresh can swap a snapshot
//! back in, including one that was already in flight.

use crate::cancel::run_cancellable;
use crate::client::{BwsClient, Project, Secret};
use crate::error::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Source of "now" for expiry decisions
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Wall-clock time
pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

/// Point-in-time view of the backend's names and IDs
#[derive(Debug, Clone, Default)]
pub struct CacheSnapshot {
    project_by_name: HashMap<String, String>,
    secret_by_project: HashMap<String, HashMap<String, String>>,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    /// Build from one refresh's listings
    ///
    /// Duplicate project names or duplicate keys within a project resolve to
    /// the last record seen. Secrets without a project are skipped since they
    /// cannot be addressed as `project/<name>/key/<name>`.
    pub fn build(projects: &[Project], secrets: &[Secret]) -> Self {
        let project_by_name = projects
            .iter()
            .map(|p| (p.name.clone(), p.id.clone()))
            .collect();

        let mut secret_by_project: HashMap<String, HashMap<String, String>> = HashMap::new();
        for secret in secrets {
            let Some(project_id) = secret.project_id.as_ref() else {
                continue;
            };
            secret_by_project
                .entry(project_id.clone())
                .or_default()
                .insert(secret.key.clone(), secret.id.clone());
        }

        Self {
            project_by_name,
            secret_by_project,
            expires_at: None,
        }
    }

    pub fn project_id(&self, project: &str) -> Option<&str> {
        self.project_by_name.get(project).map(String::as_str)
    }

    pub fn secret_id(&self, project_id: &str, key: &str) -> Option<&str> {
        self.secret_by_project
            .get(project_id)
            .and_then(|keys| keys.get(key))
            .map(String::as_str)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn project_count(&self) -> usize {
        self.project_by_name.len()
    }

    pub fn secret_count(&self) -> usize {
        self.secret_by_project.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.project_by_name.is_empty() && self.secret_by_project.is_empty()
    }

    /// A never-populated snapshot is stale regardless of `expires_at`
    fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        !self.project_by_name.is_empty() && self.expires_at.is_some_and(|expiry| now < expiry)
    }
}

/// Counters and shape of the current snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served without a refresh
    pub hits: u64,
    /// Successful refreshes
    pub refreshes: u64,
    /// Refreshes aborted by a backend error or cancellation
    pub failed_refreshes: u64,
    pub projects: usize,
    pub secrets: usize,
    pub expires_at: Option<DateTime<Utc>>,
}

/// TTL-bounded, concurrency-safe name-to-ID cache
pub struct ResolutionCache {
    snapshot: RwLock<CacheSnapshot>,
    ttl: Duration,
    clock: Clock,
    hits: AtomicU64,
    refreshes: AtomicU64,
    failed_refreshes: AtomicU64,
    /// Written and checked only while holding the snapshot write lock
    closed: AtomicBool,
}

impl ResolutionCache {
    /// Create an empty cache; a zero `ttl` refreshes before every lookup
    pub fn new(ttl: Duration) -> Self {
        Self {
            snapshot: RwLock::new(CacheSnapshot::default()),
            ttl,
            clock: system_clock(),
            hits: AtomicU64::new(0),
            refreshes: AtomicU64::new(0),
            failed_refreshes: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Replace the clock (deterministic expiry in tests)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn caching_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Refresh unless the current snapshot is populated and unexpired
    pub async fn ensure_fresh(
        &self,
        client: &dyn BwsClient,
        organization_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        if self.caching_enabled() {
            let snapshot = self.snapshot.read().await;
            if snapshot.is_fresh_at((self.clock)()) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(());
            }
        }

        self.refresh(client, organization_id, cancel).await
    }

    /// Rebuild the snapshot from the backend
    ///
    /// All-or-nothing: any failure leaves the previous snapshot in place.
    pub async fn refresh(
        &self,
        client: &dyn BwsClient,
        organization_id: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let fresh = match Self::fetch_snapshot(client, organization_id, cancel).await {
            Ok(fresh) => fresh,
            Err(e) => {
                self.failed_refreshes.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "bws cache refresh failed; keeping previous snapshot");
                return Err(e);
            }
        };

        let (projects, secrets) = (fresh.project_count(), fresh.secret_count());
        {
            let mut snapshot = self.snapshot.write().await;
            if self.closed.load(Ordering::SeqCst) {
                debug!(projects, secrets, "bws cache closed during refresh; discarding snapshot");
                return Err(Error::Closed);
            }
            *snapshot = CacheSnapshot {
                expires_at: Some(self.expiry_from((self.clock)())),
                ..fresh
            };
        }
        self.refreshes.fetch_add(1, Ordering::Relaxed);

        debug!(projects, secrets, ttl = ?self.ttl, "bws cache refreshed");
        Ok(())
    }

    async fn fetch_snapshot(
        client: &dyn BwsClient,
        organization_id: &str,
        cancel: &CancellationToken,
    ) -> Result<CacheSnapshot> {
        let projects = run_cancellable(cancel, async {
            client
                .list_projects(organization_id)
                .await
                .map_err(|e| Error::list_failed("list projects", e))
        })
        .await?;

        let identifiers = run_cancellable(cancel, async {
            client
                .list_secret_identifiers(organization_id)
                .await
                .map_err(|e| Error::list_failed("list secrets", e))
        })
        .await?;

        let ids: Vec<String> = identifiers.into_iter().map(|s| s.id).collect();
        let secrets = if ids.is_empty() {
            Vec::new()
        } else {
            run_cancellable(cancel, async {
                client
                    .get_secrets_by_ids(&ids)
                    .await
                    .map_err(|e| Error::list_failed("get secrets", e))
            })
            .await?
        };

        Ok(CacheSnapshot::build(&projects, &secrets))
    }

    /// Resolve a project/key pair to a secret ID from the current snapshot
    pub async fn lookup(&self, project: &str, key: &str) -> Result<String> {
        let snapshot = self.snapshot.read().await;
        let project_id = snapshot
            .project_id(project)
            .ok_or_else(|| Error::project_not_found(project, key))?;

        snapshot
            .secret_id(project_id, key)
            .map(str::to_owned)
            .ok_or_else(|| Error::secret_not_found(project, key))
    }

    /// Drop all mappings and refuse further refreshes
    pub async fn close(&self) {
        let mut snapshot = self.snapshot.write().await;
        self.closed.store(true, Ordering::SeqCst);
        *snapshot = CacheSnapshot::default();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Copy of the current snapshot
    pub async fn snapshot(&self) -> CacheSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn stats(&self) -> CacheStats {
        let snapshot = self.snapshot.read().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            failed_refreshes: self.failed_refreshes.load(Ordering::Relaxed),
            projects: snapshot.project_count(),
            secrets: snapshot.secret_count(),
            expires_at: snapshot.expires_at(),
        }
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ttl = TimeDelta::from_std(self.ttl).unwrap_or(TimeDelta::MAX);
        now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("ttl", &self.ttl)
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("refreshes", &self.refreshes.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
