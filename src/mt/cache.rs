//! Translation cache with per-entry expiry
//!
//! [`TranslationCache`] owns the TTL and key-derivation rules and stores JSON
//! encoded [`CacheEntry`] values in any [`CacheBackend`]. Two backends ship
//! with the crate: an in-memory map and a directory of JSON files under the
//! platform cache directory (`~/.cache/relay-i18n/translations` on Linux).
//!
//! Reads never fail: expired entries are deleted and reported absent, corrupt
//! entries are deleted and reported absent, backend I/O errors are logged and
//! treated as misses.

use crate::mt::config::{MAX_CACHE_TTL_DAYS, TranslationConfig};
use crate::mt::error::{MtError, MtResult};
use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Prefix shared by every translation key, so a backend can hold other data too
pub const KEY_PREFIX: &str = "translation_";

/// Raw string key/value storage
pub trait CacheBackend: Send + Sync {
    fn read(&self, key: &str) -> MtResult<Option<String>>;
    fn write(&self, key: &str, value: &str) -> MtResult<()>;
    fn remove(&self, key: &str) -> MtResult<()>;
    fn keys(&self) -> MtResult<Vec<String>>;
}

/// Process-local backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panic mid-insert cannot leave a half-written String behind.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CacheBackend for MemoryBackend {
    fn read(&self, key: &str) -> MtResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> MtResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> MtResult<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn keys(&self) -> MtResult<Vec<String>> {
        Ok(self.entries().keys().cloned().collect())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    cache_dir: PathBuf,
}

impl FileBackend {
    /// Backend rooted at the platform cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn platform_default() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "relay-i18n")?;
        Some(Self::with_dir(project_dirs.cache_dir().join("translations")))
    }

    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> MtError {
    MtError::CacheError(format!("Failed to {} '{}': {}", action, path.display(), err))
}

impl CacheBackend for FileBackend {
    fn read(&self, key: &str) -> MtResult<Option<String>> {
        let path = self.cache_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &path, e)),
        }
    }

    fn write(&self, key: &str, value: &str) -> MtResult<()> {
        fs::create_dir_all(&self.cache_dir).map_err(|e| io_error("create", &self.cache_dir, e))?;
        let path = self.cache_path(key);
        fs::write(&path, value).map_err(|e| io_error("write", &path, e))
    }

    fn remove(&self, key: &str) -> MtResult<()> {
        let path = self.cache_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }

    fn keys(&self) -> MtResult<Vec<String>> {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("list", &self.cache_dir, e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io_error("list", &self.cache_dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        Ok(keys)
    }
}

/// A stored translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub translated_text: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        target_language: &str,
        source_text: &str,
        translated_text: impl Into<String>,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let ttl = ttl.min(Duration::days(MAX_CACHE_TTL_DAYS));
        Self {
            key: cache_key(target_language, source_text),
            translated_text: translated_text.into(),
            created_at,
            expires_at: created_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Deterministic key for `(target_language, text)`.
///
/// Surrounding whitespace is ignored, so `" Hello "` and `"Hello"` share an
/// entry. The digest only needs to be stable and collision-resistant, not secret.
pub fn cache_key(target_language: &str, text: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(target_language.as_bytes());
    hasher.update(&[0]);
    hasher.update(text.trim().as_bytes());
    let hex = hasher.finalize().to_hex();
    format!("{}{}_{}", KEY_PREFIX, target_language, &hex.as_str()[..16])
}

/// Live entry count and serialized size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHealth {
    Empty,
    Good,
    Moderate,
    High,
}

impl CacheStats {
    pub fn health(&self) -> CacheHealth {
        match self.total_entries {
            0 => CacheHealth::Empty,
            n if n < 10 => CacheHealth::Good,
            n if n < 50 => CacheHealth::Moderate,
            _ => CacheHealth::High,
        }
    }
}

impl std::fmt::Display for CacheHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CacheHealth::Empty => "Empty",
            CacheHealth::Good => "Good",
            CacheHealth::Moderate => "Moderate",
            CacheHealth::High => "High",
        };
        f.write_str(label)
    }
}

/// Human-readable byte count: `0 Bytes`, `1.5 KB`, `2 MB`
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// TTL-aware translation cache over a [`CacheBackend`]
#[derive(Clone)]
pub struct TranslationCache {
    backend: Arc<dyn CacheBackend>,
    ttl: Duration,
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("ttl_days", &self.ttl.num_days())
            .finish()
    }
}

impl TranslationCache {
    pub const DEFAULT_TTL_DAYS: i64 = 30;

    pub fn new(backend: Arc<dyn CacheBackend>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryBackend::new()),
            Duration::days(Self::DEFAULT_TTL_DAYS),
        )
    }

    pub fn with_dir(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self::new(Arc::new(FileBackend::with_dir(dir)), ttl)
    }

    /// Memory cache when asked for, else the configured directory, else the
    /// platform cache directory. Falls back to memory when no directory can
    /// be determined.
    pub fn from_config(config: &TranslationConfig) -> Self {
        let ttl = config.cache_ttl();
        if config.use_memory_cache {
            return Self::new(Arc::new(MemoryBackend::new()), ttl);
        }
        if let Some(dir) = &config.cache_dir {
            return Self::with_dir(dir.clone(), ttl);
        }
        match FileBackend::platform_default() {
            Some(backend) => Self::new(Arc::new(backend), ttl),
            None => {
                warn!("No platform cache directory available, caching in memory");
                Self::new(Arc::new(MemoryBackend::new()), ttl)
            }
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached translation of `text` into `target_language`, if present and fresh
    pub fn get(&self, target_language: &str, text: &str) -> Option<String> {
        let key = cache_key(target_language, text);
        let raw = match self.backend.read(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed: {}", e);
                return None;
            }
        };

        match decode_entry(&key, &raw) {
            Ok(entry) if entry.is_expired_at(Utc::now()) => {
                debug!("Cache entry {} expired at {}", key, entry.expires_at);
                self.remove_quietly(&key);
                None
            }
            Ok(entry) => Some(entry.translated_text),
            Err(e) => {
                debug!("{}", e);
                self.remove_quietly(&key);
                None
            }
        }
    }

    /// Store a translation with a fresh TTL, replacing any previous entry
    pub fn put(&self, target_language: &str, text: &str, translated_text: &str) {
        let entry = CacheEntry::new(
            target_language,
            text,
            translated_text,
            Utc::now(),
            self.ttl,
        );
        self.insert_entry(&entry);
    }

    /// Store a fully-formed entry as is
    pub fn insert_entry(&self, entry: &CacheEntry) {
        let result = serde_json::to_string(entry)
            .map_err(|e| MtError::CacheError(e.to_string()))
            .and_then(|json| self.backend.write(&entry.key, &json));
        if let Err(e) = result {
            warn!("Cache write failed: {}", e);
        }
    }

    /// Remove expired and corrupt entries, returning how many were removed
    pub fn cleanup(&self) -> usize {
        let now = Utc::now();
        let mut removed = 0;

        for key in self.translation_keys() {
            let stale = match self.backend.read(&key) {
                Ok(Some(raw)) => match decode_entry(&key, &raw) {
                    Ok(entry) => entry.is_expired_at(now),
                    Err(e) => {
                        debug!("{}", e);
                        true
                    }
                },
                Ok(None) => false,
                Err(e) => {
                    warn!("Cache read failed during cleanup: {}", e);
                    false
                }
            };

            if stale && self.backend.remove(&key).is_ok() {
                removed += 1;
            }
        }

        info!("Cache cleanup completed, {} entries removed", removed);
        removed
    }

    /// Count and size of live entries. Does not modify the cache.
    pub fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let mut stats = CacheStats::default();

        for key in self.translation_keys() {
            if let Ok(Some(raw)) = self.backend.read(&key) {
                if decode_entry(&key, &raw).is_ok_and(|entry| !entry.is_expired_at(now)) {
                    stats.total_entries += 1;
                    stats.total_size += raw.len();
                }
            }
        }
        stats
    }

    /// Drop every translation entry
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        for key in self.translation_keys() {
            if self.backend.remove(&key).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    fn translation_keys(&self) -> Vec<String> {
        match self.backend.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|key| key.starts_with(KEY_PREFIX))
                .collect(),
            Err(e) => {
                warn!("Cache listing failed: {}", e);
                Vec::new()
            }
        }
    }

    fn remove_quietly(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            warn!("Cache delete failed: {}", e);
        }
    }
}

fn decode_entry(key: &str, raw: &str) -> MtResult<CacheEntry> {
    let entry: CacheEntry = serde_json::from_str(raw).map_err(|e| MtError::CacheCorruption {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    if entry.key != key {
        return Err(MtError::CacheCorruption {
            key: key.to_string(),
            reason: format!("entry claims key '{}'", entry.key),
        });
    }
    Ok(entry)
}
