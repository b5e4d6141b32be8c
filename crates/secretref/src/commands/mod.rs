//! Command implementations

pub mod check;
pub mod providers;
pub mod resolve;

use anyhow::Result;
use secretref_core::Registry;

/// Registry holding every built-in provider
pub fn registry() -> Result<Registry> {
    let mut registry = Registry::new();
    secretref_bws::register(&mut registry)?;
    Ok(registry)
}
