//! Bitwarden Secrets Manager provider for secretref
//!
//! Resolves `secretref:bws:<ref>` references:
//! - **Secret IDs** are fetched directly from the backend
//! - **`project/<name>/key/<name>`** is mapped to a secret ID through a
//!   TTL-bounded name cache, then fetched
//!
//! The backend is reached through the narrow [`BwsClient`] trait; the default
//! adapter drives the `bws` command-line tool.

mod cancel;

pub mod cache;
pub mod cli_client;
pub mod client;
pub mod config;
pub mod error;
pub mod factory;
pub mod provider;
pub mod reference;

pub use cache::{system_clock, CacheSnapshot, CacheStats, Clock, ResolutionCache};
pub use cli_client::BwsCliClient;
pub use client::{BwsClient, ClientError, Project, Secret, SecretIdentifier};
pub use config::{BwsConfig, DEFAULT_CACHE_TTL};
pub use error::{Error, Result};
pub use factory::register;
pub use provider::{BwsProvider, PROVIDER_NAME};
pub use reference::BwsRef;
