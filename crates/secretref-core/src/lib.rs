//! Secret reference resolution for secretref
//!
//! This crate provides the provider-agnostic half of the system:
//! - **Envelope parsing**: `secretref:<provider>:<reference>`
//! - **Providers**: the async `SecretProvider` capability and a factory `Registry`
//! - **Resolution**: `SecretResolver` dispatching envelopes to live providers
//! - **Security**: zeroized values and sanitized error text

pub mod config;
pub mod error;
pub mod provider;
pub mod reference;
pub mod registry;
pub mod resolver;
pub mod security;

pub use config::SecretsConfig;
pub use error::{Error, Result};
pub use provider::SecretProvider;
pub use reference::{SecretRef, SECRETREF_PREFIX};
pub use registry::{ProviderFactory, ProviderSettings, Registry};
pub use resolver::SecretResolver;
pub use security::{sanitize_error, SecureString};
