//! `secretref:<provider>:<reference>` envelope parsing

use crate::error::{Error, Result};
use std::fmt;

/// Prefix shared by every secret reference
pub const SECRETREF_PREFIX: &str = "secretref:";

/// A parsed secret reference envelope
///
/// The provider-specific part is kept verbatim; its grammar belongs to the
/// provider (for example `project/<name>/key/<name>` for bws).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRef {
    pub provider: String,
    pub reference: String,
}

impl SecretRef {
    /// Parse an envelope such as `secretref:bws:project/app/key/TOKEN`
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let rest = trimmed
            .strip_prefix(SECRETREF_PREFIX)
            .ok_or_else(|| Error::invalid_reference(trimmed, "missing 'secretref:' prefix"))?;

        let (provider, reference) = rest.split_once(':').ok_or_else(|| {
            Error::invalid_reference(trimmed, "expected 'secretref:<provider>:<reference>'")
        })?;

        if provider.is_empty() {
            return Err(Error::invalid_reference(trimmed, "provider name is empty"));
        }
        if provider.chars().any(char::is_whitespace) {
            return Err(Error::invalid_reference(
                trimmed,
                "provider name contains whitespace",
            ));
        }

        Ok(Self {
            provider: provider.to_string(),
            reference: reference.trim().to_string(),
        })
    }

    /// Cheap check used to decide whether a value needs resolving at all
    pub fn is_secret_ref(input: &str) -> bool {
        input.trim_start().starts_with(SECRETREF_PREFIX)
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", SECRETREF_PREFIX, self.provider, self.reference)
    }
}
