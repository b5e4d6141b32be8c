//! Configuration file loading and parsing

use crate::error::{Error, Result};
use crate::registry::ProviderSettings;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use tracing::debug;

/// Configuration file names to search for
const CONFIG_FILE_NAMES: &[&str] = &["secretref.yaml", "secretref.yml"];

/// Parsed `secretref.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Provider name -> provider settings block
    #[serde(default)]
    pub providers: BTreeMap<String, serde_yaml_ng::Value>,
}

impl SecretsConfig {
    /// Load configuration from the specified path
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        Self::from_yaml(&content)
    }

    /// Load from an explicit path, or search the working directory, or fall back to defaults
    pub fn load_or_default(path: Option<&Utf8Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }

        match Self::find_config() {
            Some(found) => {
                debug!("Using config file: {}", found);
                Self::load(&found)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Settings for one provider as the map handed to its factory
    ///
    /// A missing or `null` block yields empty settings.
    pub fn provider_settings(&self, name: &str) -> Result<ProviderSettings> {
        let Some(block) = self.providers.get(name) else {
            return Ok(ProviderSettings::new());
        };

        let value = serde_json::to_value(block)
            .map_err(|e| Error::invalid_settings(name, e.to_string()))?;

        match value {
            serde_json::Value::Null => Ok(ProviderSettings::new()),
            serde_json::Value::Object(map) => Ok(map),
            other => Err(Error::invalid_settings(
                name,
                format!("expected a mapping, got {}", json_kind(&other)),
            )),
        }
    }

    /// Provider names that appear in the file
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }

    fn find_config() -> Option<Utf8PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(Utf8PathBuf::from)
            .find(|candidate| candidate.exists())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a sequence",
        serde_json::Value::Object(_) => "a mapping",
    }
}
