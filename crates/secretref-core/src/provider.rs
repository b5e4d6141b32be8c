//! Secret provider trait

use crate::security::SecureString;
use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Trait for secret providers addressed by `secretref:<name>:...`
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Provider name, matched against the envelope's provider segment
    fn name(&self) -> &'static str;

    /// Resolve a provider-specific reference to its secret value
    ///
    /// Implementations must check `cancel` before any network-bound step and
    /// abort with an error once it is cancelled.
    async fn resolve(&self, cancel: &CancellationToken, reference: &str) -> Result<SecureString>;

    /// Release backend resources. Calling this more than once is a no-op.
    async fn close(&self) -> Result<()>;
}
