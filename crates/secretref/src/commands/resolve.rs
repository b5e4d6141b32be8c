//! Resolve references to their secret values

use anyhow::{Context, Result};
use camino::Utf8Path;
use secretref_core::{SecretRef, SecretResolver, SecretsConfig, SecureString};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::ResolveArgs;
use crate::output;

pub async fn run(args: ResolveArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    // Plain values never need a backend, so skip provider setup entirely
    if !args.refs.iter().any(|r| SecretRef::is_secret_ref(r)) {
        let values = args.refs.iter().map(|r| SecureString::from(r.as_str())).collect();
        return print_values(&args, values);
    }

    let config =
        SecretsConfig::load_or_default(config_path).context("Failed to load configuration")?;
    let registry = super::registry()?;
    let resolver = SecretResolver::from_config(&registry, &config)
        .context("Failed to initialize secret providers")?;
    debug!(providers = ?resolver.provider_names(), "Secret providers ready");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling secret resolution");
            on_interrupt.cancel();
        }
    });

    let result = resolve_all(&resolver, &cancel, &args.refs).await;

    if let Err(e) = resolver.close().await {
        warn!("Failed to close secret providers: {}", e);
    }

    print_values(&args, result?)
}

/// Resolve in order through one resolver so project/key lookups share a cache
async fn resolve_all(
    resolver: &SecretResolver,
    cancel: &CancellationToken,
    refs: &[String],
) -> Result<Vec<SecureString>> {
    let mut values = Vec::with_capacity(refs.len());

    for input in refs {
        let value = resolver
            .resolve_value(cancel, input)
            .await
            .with_context(|| format!("Failed to resolve {}", input.trim()))?;
        values.push(value);
    }

    Ok(values)
}

fn print_values(args: &ResolveArgs, values: Vec<SecureString>) -> Result<()> {
    if args.json {
        let object: Map<String, Value> = args
            .refs
            .iter()
            .zip(values)
            .map(|(r, v)| (r.clone(), Value::String(v.into_string())))
            .collect();
        return output::json(&object);
    }

    for value in &values {
        println!("{}", value.as_str());
    }
    Ok(())
}
