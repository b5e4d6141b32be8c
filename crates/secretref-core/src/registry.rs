//! Provider factory registry

use crate::error::{Error, Result};
use crate::provider::SecretProvider;
use std::collections::BTreeMap;
use std::fmt;

/// Settings handed to a provider factory (the provider's config block)
pub type ProviderSettings = serde_json::Map<String, serde_json::Value>;

/// Factory creating a provider from its settings
pub type ProviderFactory =
    Box<dyn Fn(&ProviderSettings) -> anyhow::Result<Box<dyn SecretProvider>> + Send + Sync>;

/// Registry of provider factories keyed by provider name
#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<String, ProviderFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        F: Fn(&ProviderSettings) -> anyhow::Result<Box<dyn SecretProvider>>
            + Send
            + Sync
            + 'static,
    {
        let name = name.trim();
        if name.is_empty() || name.contains(':') {
            return Err(Error::InvalidProviderName {
                name: name.to_string(),
            });
        }
        if self.factories.contains_key(name) {
            return Err(Error::DuplicateProvider {
                name: name.to_string(),
            });
        }

        self.factories.insert(name.to_string(), Box::new(factory));
        Ok(())
    }

    /// Instantiate the provider registered under `name`
    pub fn create(&self, name: &str, settings: &ProviderSettings) -> Result<Box<dyn SecretProvider>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::unknown_provider(name, &self.names()))?;

        factory(settings).map_err(Error::Provider)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered provider names, sorted
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("providers", &self.names())
            .finish()
    }
}
