//! Error types for secretref-core

use thiserror::Error;

/// Result type alias using secretref-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for secret reference resolution
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// Provider settings could not be converted
    #[error("Invalid settings for provider '{provider}': {message}")]
    InvalidSettings { provider: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed secretref envelope
    #[error("Invalid secret reference '{input}': {reason}")]
    InvalidReference { input: String, reason: String },

    /// Provider name rejected by the registry
    #[error("Invalid provider name: '{name}'")]
    InvalidProviderName { name: String },

    /// Provider registered twice
    #[error("Provider already registered: {name}")]
    DuplicateProvider { name: String },

    /// No factory or instance for the requested provider
    #[error("Unknown secret provider: {name}. Known providers: {known}")]
    UnknownProvider { name: String, known: String },

    /// Failure reported by a provider
    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid settings error
    pub fn invalid_settings(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSettings {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an invalid reference error
    pub fn invalid_reference(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown provider error from the set of known names
    pub fn unknown_provider(name: impl Into<String>, known: &[String]) -> Self {
        let known = if known.is_empty() {
            "(none)".to_string()
        } else {
            known.join(", ")
        };
        Self::UnknownProvider {
            name: name.into(),
            known,
        }
    }
}
