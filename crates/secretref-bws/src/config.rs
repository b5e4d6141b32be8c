//! bws provider configuration
//!
//! Settings come from the provider's block in `secretref.yaml`, with
//! `BWS_ACCESS_TOKEN`, `BWS_ORG_ID` and `BWS_SERVER_URL` as fallbacks.

use crate::error::{Error, Result};
use secretref_core::ProviderSettings;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Refresh interval used when `cache_ttl` is not set
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Upper bound for a single `bws` invocation
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Binary looked up on `PATH` when `bws_path` is not set
pub const DEFAULT_BWS_PATH: &str = "bws";

/// SDK-era keys and the `bws` CLI settings that replace them
const REPLACED_KEYS: &[(&str, &str)] = &[
    ("api_url", "server_url"),
    ("identity_url", "server_url"),
    ("state_file", "config_file"),
];

#[derive(Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BwsConfig {
    /// Machine account access token
    #[serde(default, deserialize_with = "deserialize_scalar")]
    pub access_token: String,

    /// Organization owning the projects; required for project/key references
    #[serde(default, alias = "org_id", deserialize_with = "deserialize_scalar")]
    pub organization_id: String,

    /// Self-hosted server URL (`--server-url`)
    #[serde(default)]
    pub server_url: Option<String>,

    /// bws CLI config file (`--config-file`)
    #[serde(default)]
    pub config_file: Option<PathBuf>,

    /// bws CLI profile (`--profile`)
    #[serde(default)]
    pub profile: Option<String>,

    /// Path or name of the bws binary
    #[serde(default)]
    pub bws_path: Option<PathBuf>,

    #[serde(default, deserialize_with = "deserialize_timeout")]
    pub command_timeout: Option<Duration>,

    /// Name-to-ID cache lifetime; zero refreshes before every lookup
    #[serde(default, deserialize_with = "deserialize_cache_ttl")]
    pub cache_ttl: Option<Duration>,
}

impl BwsConfig {
    /// Deserialize from the provider settings block
    ///
    /// Unknown keys are rejected so a misspelt or SDK-era setting cannot
    /// silently fall back to the default server.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        for (key, replacement) in REPLACED_KEYS {
            if settings.contains_key(*key) {
                return Err(Error::invalid_config(format!(
                    "{key} is not supported by the bws CLI backend; use {replacement} instead"
                )));
            }
        }

        serde_json::from_value(serde_json::Value::Object(settings.clone()))
            .map_err(|e| Error::invalid_config(e.to_string()))
    }

    /// Fill unset fields from the environment and defaults
    pub fn with_env_defaults(mut self) -> Self {
        if self.access_token.trim().is_empty() {
            self.access_token = env_var("BWS_ACCESS_TOKEN").unwrap_or_default();
        }
        if self.organization_id.trim().is_empty() {
            self.organization_id = env_var("BWS_ORG_ID").unwrap_or_default();
        }
        if self.server_url.is_none() {
            self.server_url = env_var("BWS_SERVER_URL");
        }
        if self.cache_ttl.is_none() {
            self.cache_ttl = Some(DEFAULT_CACHE_TTL);
        }
        self
    }

    /// Check the settings needed to talk to the backend at all
    pub fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(Error::invalid_config(
                "bws access token is required (set access_token or BWS_ACCESS_TOKEN)",
            ));
        }
        if self.command_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::invalid_config("command_timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Trimmed organization ID, if configured
    pub fn organization_id(&self) -> Option<&str> {
        Some(self.organization_id.trim()).filter(|id| !id.is_empty())
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL)
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT)
    }

    pub fn bws_path(&self) -> &Path {
        self.bws_path
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_BWS_PATH))
    }
}

impl fmt::Debug for BwsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.access_token.is_empty() {
            "[unset]"
        } else {
            "[REDACTED]"
        };
        f.debug_struct("BwsConfig")
            .field("access_token", &token)
            .field("organization_id", &self.organization_id)
            .field("server_url", &self.server_url)
            .field("config_file", &self.config_file)
            .field("profile", &self.profile)
            .field("bws_path", &self.bws_path)
            .field("command_timeout", &self.command_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .finish()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `500ms`, `90s`, `10m`, `1.5h`, compounds like `1h30m`, or bare seconds
///
/// Units are `ns`, `us`/`µs`, `ms`, `s`, `m` and `h`; each part may carry a
/// fraction.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let s = input.trim();
    if s.starts_with('-') {
        return Err(format!("duration cannot be negative: {s}"));
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    if s.is_empty() {
        return Err("duration is empty".to_string());
    }

    let invalid = || format!("Invalid duration: {s}");
    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest.find(|c: char| !is_number(c)).unwrap_or(rest.len());
        if number_len == 0 {
            return Err(invalid());
        }
        let number = &rest[..number_len];
        rest = &rest[number_len..];

        let unit_len = rest.find(is_number).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let unit_nanos: u64 = match unit {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            "" => return Err(format!("missing unit in duration: {s}")),
            other => return Err(format!("unknown duration unit '{other}' in: {s}")),
        };

        let part = if number.contains('.') {
            let value: f64 = number.parse().map_err(|_| invalid())?;
            Duration::try_from_secs_f64(value * unit_nanos as f64 / 1e9).map_err(|_| invalid())?
        } else {
            let value: u64 = number.parse().map_err(|_| invalid())?;
            let nanos = value.checked_mul(unit_nanos).ok_or_else(invalid)?;
            Duration::from_nanos(nanos)
        };
        total = total.checked_add(part).ok_or_else(invalid)?;
    }

    Ok(total)
}

/// Any YAML scalar, so `organization_id: 12345` reads as the string "12345"
#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarInput {
    Text(String),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Bool(bool),
}

fn deserialize_scalar<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ScalarInput>::deserialize(deserializer)? {
        None => String::new(),
        Some(ScalarInput::Text(text)) => text,
        Some(ScalarInput::Signed(n)) => n.to_string(),
        Some(ScalarInput::Unsigned(n)) => n.to_string(),
        Some(ScalarInput::Float(n)) => n.to_string(),
        Some(ScalarInput::Bool(b)) => b.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DurationInput {
    Seconds(i64),
    Text(String),
}

fn deserialize_duration_field<'de, D>(
    deserializer: D,
    field: &str,
) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match Option::<DurationInput>::deserialize(deserializer)? {
        None => None,
        Some(DurationInput::Seconds(secs)) if secs < 0 => {
            return Err(serde::de::Error::custom(format!(
                "{field} cannot be negative"
            )));
        }
        Some(DurationInput::Seconds(secs)) => Some(Duration::from_secs(secs.unsigned_abs())),
        Some(DurationInput::Text(text)) if text.trim().is_empty() => None,
        Some(DurationInput::Text(text)) if text.trim().starts_with('-') => {
            return Err(serde::de::Error::custom(format!(
                "{field} cannot be negative"
            )));
        }
        Some(DurationInput::Text(text)) => Some(
            parse_duration(&text)
                .map_err(|e| serde::de::Error::custom(format!("invalid {field}: {e}")))?,
        ),
    };
    Ok(parsed)
}

fn deserialize_cache_ttl<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_field(deserializer, "cache_ttl")
}

fn deserialize_timeout<'de, D>(deserializer: D) -> std::result::Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_duration_field(deserializer, "command_timeout")
}
