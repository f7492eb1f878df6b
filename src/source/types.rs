//! Declarative source definition types
//!
//! These mirror the YAML shape of a source document. A document is
//! immutable once loaded; the set of documents is read once at process
//! start.

use crate::auth::AuthSpec;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level declarative source definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    /// Source name (unique across the loaded set)
    pub name: String,
    /// Disabled sources are loaded but never scheduled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// What to fetch
    pub fetch: FetchSpec,
    /// When to fetch and how long the result stays fresh
    pub schedule: ScheduleSpec,
    /// Where the result lands
    pub cache: CacheSpec,
    /// Optional reshaping of the response body
    #[serde(default)]
    pub transform: Option<TransformSpec>,
    /// Optional authentication
    #[serde(default)]
    pub auth: Option<AuthSpec>,
}

/// Fetch descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FetchSpec {
    /// Full request URL
    pub url: String,
    /// HTTP method
    #[serde(default = "default_method")]
    pub method: String,
    /// Extra request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Per-attempt timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retries for transient failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

/// Schedule descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScheduleSpec {
    /// Polling interval in seconds
    pub interval_secs: u64,
    /// Cache TTL in seconds
    pub cache_ttl_secs: u64,
}

/// Cache descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheSpec {
    /// Destination cache key, e.g. `weather:alerts:active`
    pub key: String,
}

/// Transform descriptor, applied in declaration order:
/// path navigation, then filter, then field renaming.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransformSpec {
    /// Dot/bracket path locating the relevant substructure,
    /// e.g. `list.stations` or `result[0].rows`
    #[serde(default)]
    pub data_path: Option<String>,
    /// Field-equality constraints; records that do not match every
    /// constraint are dropped. Keys may be dot paths into a record.
    #[serde(default)]
    pub filter: Option<HashMap<String, JsonValue>>,
    /// Strict allow-list rename map `{source_field: output_name}`;
    /// fields not listed are dropped.
    #[serde(default)]
    pub fields: Option<HashMap<String, String>>,
}

fn default_true() -> bool {
    true
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

/// Validate a parsed source definition
pub(crate) fn validate_source(config: &SourceConfig) -> Result<()> {
    if config.name.is_empty() {
        return Err(Error::config("Source name cannot be empty"));
    }

    if config.fetch.url.is_empty() {
        return Err(Error::config(format!(
            "Source '{}' url cannot be empty",
            config.name
        )));
    }
    url::Url::parse(&config.fetch.url)?;

    config.fetch.method.parse::<crate::types::Method>()?;

    if config.schedule.interval_secs == 0 {
        return Err(Error::config(format!(
            "Source '{}' interval_secs must be positive",
            config.name
        )));
    }

    if config.schedule.cache_ttl_secs == 0 {
        return Err(Error::config(format!(
            "Source '{}' cache_ttl_secs must be positive",
            config.name
        )));
    }

    if config.cache.key.is_empty() {
        return Err(Error::config(format!(
            "Source '{}' cache key cannot be empty",
            config.name
        )));
    }

    Ok(())
}
