//! Configuration for the hubkit client.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default GitHub API URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Client configuration, usually loaded from a `hubkit.toml` file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Transport settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Object cache sizes.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Rate-limit guard behaviour.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

impl Config {
    /// Load config from a TOML file. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save config to a TOML file.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API origin; override for GitHub Enterprise.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// `User-Agent` header. A library identifier is used when unset or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Extra headers sent with every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ApiConfig {
    /// The configured timeout, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: None,
            timeout_secs: None,
            headers: BTreeMap::new(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.into()
}

/// Object cache sizes. Values above the cache ceilings are clamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cached users.
    #[serde(default = "default_user_cache_size")]
    pub user_cache_size: usize,

    /// Maximum number of cached repositories.
    #[serde(default = "default_repo_cache_size")]
    pub repo_cache_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            user_cache_size: default_user_cache_size(),
            repo_cache_size: default_repo_cache_size(),
        }
    }
}

const fn default_user_cache_size() -> usize {
    30
}

const fn default_repo_cache_size() -> usize {
    15
}

/// Rate-limit guard settings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// What to do when the quota is nearly exhausted.
    #[serde(default)]
    pub policy: RateLimitPolicy,
}

/// What the before-request guard does when only 0 or 1 calls remain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitPolicy {
    /// Fail the request with [`Error::Ratelimited`].
    #[default]
    Fail,
    /// Sleep until the quota resets, then send the request.
    Wait,
}
