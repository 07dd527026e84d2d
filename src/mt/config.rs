//! Translation pipeline configuration
//!
//! Defaults mirror what the site has run with in production: a 30-day cache,
//! 500-character chunks, chunked mode above 2000 characters and a 10 second
//! budget per provider call. Every value can be overridden from the
//! environment or from a JSON document.

use crate::mt::chunking::ChunkingConfig;
use crate::mt::error::{MtError, MtResult};
use crate::mt::google_translate::GOOGLE_API_KEY_ENV;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const CACHE_TTL_ENV: &str = "RELAY_CACHE_TTL_DAYS";
pub const REQUEST_TIMEOUT_ENV: &str = "RELAY_REQUEST_TIMEOUT_SECS";
pub const CACHE_DIR_ENV: &str = "RELAY_CACHE_DIR";

/// Upper bounds that keep expiry timestamps and tick periods representable
pub const MAX_CACHE_TTL_DAYS: i64 = 36_500;
pub const MAX_CLEANUP_INTERVAL_HOURS: u64 = 24 * 365;

const DEFAULT_CACHE_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Premium provider credential; `None` skips the premium tier
    pub google_api_key: Option<String>,
    pub cache_ttl_days: i64,
    /// Ceiling for a single provider call, in characters
    pub chunk_size: usize,
    /// Above this many characters content goes straight to chunked mode
    pub long_content_threshold: usize,
    pub request_timeout_secs: u64,
    /// Directory for the file-backed cache; platform cache dir when unset
    pub cache_dir: Option<PathBuf>,
    /// Keep the cache in memory only
    pub use_memory_cache: bool,
    pub cleanup_interval_hours: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
            chunk_size: 500,
            long_content_threshold: 2000,
            request_timeout_secs: 10,
            cache_dir: None,
            use_memory_cache: false,
            cleanup_interval_hours: 24,
        }
    }
}

impl TranslationConfig {
    /// Defaults overridden by `GOOGLE_TRANSLATE_API_KEY`, `RELAY_CACHE_TTL_DAYS`,
    /// `RELAY_REQUEST_TIMEOUT_SECS` and `RELAY_CACHE_DIR`.
    pub fn from_env() -> MtResult<Self> {
        let mut config = Self::default();

        if let Ok(key) = std::env::var(GOOGLE_API_KEY_ENV) {
            config.google_api_key = Some(key);
        }
        if let Ok(days) = std::env::var(CACHE_TTL_ENV) {
            config.cache_ttl_days = days.trim().parse().map_err(|_| {
                MtError::ConfigError(format!("{} must be a whole number, got '{}'", CACHE_TTL_ENV, days))
            })?;
        }
        if let Ok(secs) = std::env::var(REQUEST_TIMEOUT_ENV) {
            config.request_timeout_secs = secs.trim().parse().map_err(|_| {
                MtError::ConfigError(format!(
                    "{} must be a whole number, got '{}'",
                    REQUEST_TIMEOUT_ENV, secs
                ))
            })?;
        }
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
            config.cache_dir = Some(PathBuf::from(dir));
        }

        config.normalized()
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> MtResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MtError::ConfigError(format!("Invalid configuration: {}", e)))?;
        config.normalized()
    }

    /// Blank keys count as absent; nonsensical sizes are rejected.
    fn normalized(mut self) -> MtResult<Self> {
        if self
            .google_api_key
            .as_deref()
            .is_some_and(|key| key.trim().is_empty())
        {
            self.google_api_key = None;
        }
        if !(1..=MAX_CACHE_TTL_DAYS).contains(&self.cache_ttl_days) {
            return Err(MtError::ConfigError(format!(
                "cache_ttl_days must be between 1 and {}, got {}",
                MAX_CACHE_TTL_DAYS, self.cache_ttl_days
            )));
        }
        if self.cleanup_interval_hours > MAX_CLEANUP_INTERVAL_HOURS {
            return Err(MtError::ConfigError(format!(
                "cleanup_interval_hours must be at most {}, got {}",
                MAX_CLEANUP_INTERVAL_HOURS, self.cleanup_interval_hours
            )));
        }
        if self.chunk_size == 0 {
            return Err(MtError::ConfigError("chunk_size must be positive".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(MtError::ConfigError(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: self.chunk_size,
            long_content_threshold: self.long_content_threshold,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Struct literals skip validation, so out-of-range days fall back to the default
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_days(self.cache_ttl_days)
            .filter(|_| (1..=MAX_CACHE_TTL_DAYS).contains(&self.cache_ttl_days))
            .unwrap_or_else(|| chrono::Duration::days(DEFAULT_CACHE_TTL_DAYS))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_hours.saturating_mul(60 * 60))
    }

    /// The premium credential, if one is set and not blank
    pub fn premium_key(&self) -> Option<&str> {
        self.google_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
