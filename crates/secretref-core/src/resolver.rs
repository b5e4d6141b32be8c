//! Secret resolution orchestration
//!
//! Dispatches `secretref:<provider>:<reference>` envelopes to the provider
//! instances built from the registry and the loaded configuration.

use crate::config::SecretsConfig;
use crate::error::{Error, Result};
use crate::provider::SecretProvider;
use crate::reference::SecretRef;
use crate::registry::Registry;
use crate::security::SecureString;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Resolver holding one live instance per configured provider
pub struct SecretResolver {
    providers: BTreeMap<String, Box<dyn SecretProvider>>,
}

impl SecretResolver {
    /// Build providers for every entry in `config`
    ///
    /// With no providers configured, every registered provider is created with
    /// empty settings so environment defaults can apply.
    pub fn from_config(registry: &Registry, config: &SecretsConfig) -> Result<Self> {
        let names = if config.providers.is_empty() {
            registry.names()
        } else {
            config.provider_names()
        };

        let mut providers = BTreeMap::new();
        for name in names {
            let settings = config.provider_settings(&name)?;
            let provider = registry.create(&name, &settings)?;
            debug!("Created secret provider: {}", name);
            providers.insert(name, provider);
        }

        Ok(Self { providers })
    }

    /// Create with pre-built providers (for testing)
    pub fn with_providers(providers: Vec<Box<dyn SecretProvider>>) -> Self {
        let providers = providers
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();
        Self { providers }
    }

    /// Resolve a `secretref:` envelope through its provider
    pub async fn resolve(&self, cancel: &CancellationToken, input: &str) -> Result<SecureString> {
        let secret_ref = SecretRef::parse(input)?;
        let provider = self.providers.get(&secret_ref.provider).ok_or_else(|| {
            Error::unknown_provider(&secret_ref.provider, &self.provider_names())
        })?;

        debug!(provider = %secret_ref.provider, "Resolving secret reference");
        let value = provider.resolve(cancel, &secret_ref.reference).await?;
        debug!(
            provider = %secret_ref.provider,
            size_bytes = value.len(),
            "Resolved secret reference"
        );

        Ok(value)
    }

    /// Resolve envelopes; any other value is returned unchanged
    pub async fn resolve_value(
        &self,
        cancel: &CancellationToken,
        input: &str,
    ) -> Result<SecureString> {
        if SecretRef::is_secret_ref(input) {
            self.resolve(cancel, input).await
        } else {
            Ok(SecureString::from(input))
        }
    }

    /// Close every provider, returning the first failure
    pub async fn close(&self) -> Result<()> {
        let mut first_error = None;

        for (name, provider) in &self.providers {
            if let Err(e) = provider.close().await {
                warn!("Failed to close secret provider '{}': {}", name, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(Error::Provider(e)),
            None => Ok(()),
        }
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver")
            .field("providers", &self.provider_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProviderSettings;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // Mock provider for testing
    struct MockProvider {
        name: &'static str,
        should_fail: bool,
        resolve_calls: Arc<AtomicUsize>,
        close_calls: Arc<AtomicUsize>,
    }

    impl MockProvider {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                should_fail: false,
                resolve_calls: Arc::new(AtomicUsize::new(0)),
                close_calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl SecretProvider for MockProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn resolve(
            &self,
            _cancel: &CancellationToken,
            reference: &str,
        ) -> anyhow::Result<SecureString> {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                return Err(anyhow!("Mock failure for {}", reference));
            }
            Ok(SecureString::new(format!("value-of-{}", reference)))
        }

        async fn close(&self) -> anyhow::Result<()> {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                return Err(anyhow!("Mock close failure"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_resolve_dispatches_to_provider() {
        let mock = MockProvider::new("mock");
        let calls = mock.resolve_calls.clone();
        let resolver = SecretResolver::with_providers(vec![Box::new(mock)]);

        let value = resolver
            .resolve(&CancellationToken::new(), "secretref:mock:project/a/key/B")
            .await
            .unwrap();

        assert_eq!(value.as_str(), "value-of-project/a/key/B");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_unknown_provider() {
        let resolver = SecretResolver::with_providers(vec![Box::new(MockProvider::new("mock"))]);

        let err = resolver
            .resolve(&CancellationToken::new(), "secretref:vault:path")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownProvider { .. }));
        assert!(err.to_string().contains("mock"));
    }

    #[tokio::test]
    async fn test_resolve_provider_failure_is_wrapped() {
        let mut mock = MockProvider::new("mock");
        mock.should_fail = true;
        let resolver = SecretResolver::with_providers(vec![Box::new(mock)]);

        let err = resolver
            .resolve(&CancellationToken::new(), "secretref:mock:abc")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert!(err.to_string().contains("Mock failure for abc"));
    }

    #[tokio::test]
    async fn test_resolve_value_passes_plain_strings() {
        let mock = MockProvider::new("mock");
        let calls = mock.resolve_calls.clone();
        let resolver = SecretResolver::with_providers(vec![Box::new(mock)]);

        let value = resolver
            .resolve_value(&CancellationToken::new(), "plain-value")
            .await
            .unwrap();
        assert_eq!(value.as_str(), "plain-value");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_close_visits_every_provider() {
        let ok = MockProvider::new("ok");
        let ok_closes = ok.close_calls.clone();
        let mut failing = MockProvider::new("failing");
        failing.should_fail = true;
        let failing_closes = failing.close_calls.clone();

        let resolver = SecretResolver::with_providers(vec![Box::new(ok), Box::new(failing)]);
        let result = resolver.close().await;

        assert!(result.is_err());
        assert_eq!(ok_closes.load(Ordering::SeqCst), 1);
        assert_eq!(failing_closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config_uses_registered_when_unconfigured() {
        let mut registry = Registry::new();
        registry
            .register("mock", |_settings: &ProviderSettings| {
                Ok(Box::new(MockProvider::new("mock")) as Box<dyn SecretProvider>)
            })
            .unwrap();

        let resolver = SecretResolver::from_config(&registry, &SecretsConfig::default()).unwrap();
        assert_eq!(resolver.provider_names(), vec!["mock".to_string()]);
    }

    #[test]
    fn test_from_config_unknown_configured_provider() {
        let registry = Registry::new();
        let config = SecretsConfig::from_yaml("providers:\n  vault: {}\n").unwrap();

        let err = SecretResolver::from_config(&registry, &config).unwrap_err();
        assert!(matches!(err, Error::UnknownProvider { .. }));
    }
}
