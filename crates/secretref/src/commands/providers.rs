//! List available secret providers

use anyhow::{Context, Result};
use camino::Utf8Path;
use secretref_core::SecretsConfig;
use serde::Serialize;

use crate::cli::ProvidersArgs;
use crate::output;

#[derive(Debug, Serialize)]
struct ProviderEntry {
    name: String,
    configured: bool,
}

pub fn run(args: ProvidersArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let registry = super::registry()?;
    let config =
        SecretsConfig::load_or_default(config_path).context("Failed to load configuration")?;

    let configured = config.provider_names();
    let entries: Vec<ProviderEntry> = registry
        .names()
        .into_iter()
        .map(|name| ProviderEntry {
            configured: configured.contains(&name),
            name,
        })
        .collect();

    for name in configured.iter().filter(|n| !registry.contains(n)) {
        output::warning(&format!("Configured provider '{}' is not available", name));
    }

    if args.json {
        return output::json(&entries);
    }

    for entry in &entries {
        // With no providers in the config, every provider runs on env defaults
        let status = if entry.configured {
            "configured"
        } else if configured.is_empty() {
            "environment defaults"
        } else {
            "disabled"
        };
        println!("{:<12} {}", entry.name, status);
    }
    Ok(())
}
