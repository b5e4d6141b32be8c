//! Registry wiring for the bws provider

use crate::config::BwsConfig;
use crate::provider::{BwsProvider, PROVIDER_NAME};
use secretref_core::{ProviderSettings, Registry, SecretProvider};
use tracing::debug;

/// Register the bws provider factory under the name "bws"
pub fn register(registry: &mut Registry) -> secretref_core::Result<()> {
    registry.register(PROVIDER_NAME, create)
}

fn create(settings: &ProviderSettings) -> anyhow::Result<Box<dyn SecretProvider>> {
    let config = BwsConfig::from_settings(settings)?;
    let provider = BwsProvider::from_config(config)?;
    debug!(
        cache_ttl = ?provider.cache().ttl(),
        organization = provider.organization_id().is_some(),
        "Created bws provider"
    );
    Ok(Box::new(provider))
}
