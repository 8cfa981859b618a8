//! Two-tier response cache: volatile entries mirrored to disk
//!
//! The volatile tier is an ordered in-memory collection bounded by entry
//! count; the persistent tier is one JSON file per entry under the cache
//! directory, named by the key's digest. File modification time is the
//! expiry clock for entries not resident in memory. Expiry is checked only
//! when a key is touched; there is no background sweep. The store holds no
//! lock of its own — concurrent use requires external synchronization, and
//! processes sharing one cache directory may race (single-process use is
//! assumed).

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;

use super::key::hash_key;

/// Volatile-tier capacity used when the caller passes zero
pub const CACHE_MAX_ENTRIES: usize = 50;

/// Entry TTL used when the caller passes zero
pub const CACHE_DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Non-entry file that `clear` leaves untouched
const PROTECTED_FILE: &str = "README.md";

/// One cached response
#[derive(Debug, Clone)]
struct CacheEntry {
    key: String,
    payload: String,
    created_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => now.signed_duration_since(self.created_at) > ttl,
            // A TTL too large for chrono never expires
            Err(_) => false,
        }
    }
}

/// Capacity- and TTL-bounded response cache with a persistent mirror
///
/// Eviction under capacity pressure removes the entry with the globally
/// smallest `created_at` (FIFO by age, not access order), together with its
/// backing file.
#[derive(Debug)]
pub struct ResponseCache {
    entries: Vec<CacheEntry>,
    max_entries: usize,
    default_ttl: Duration,
    cache_dir: PathBuf,
}

impl ResponseCache {
    /// Creates a cache backed by the XDG-compliant cache directory
    /// (`~/.cache/just-weather/` on Linux).
    ///
    /// Returns `None` if the platform cache directory cannot be determined.
    /// Zero `max_entries` or `default_ttl` fall back to the defaults of 50
    /// entries and 300 seconds.
    pub fn new(max_entries: usize, default_ttl: Duration) -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "just-weather")?;
        Some(Self::with_dir(
            project_dirs.cache_dir().to_path_buf(),
            max_entries,
            default_ttl,
        ))
    }

    /// Creates a cache backed by an explicit directory.
    pub fn with_dir(cache_dir: PathBuf, max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: Vec::new(),
            max_entries: if max_entries == 0 {
                CACHE_MAX_ENTRIES
            } else {
                max_entries
            },
            default_ttl: if default_ttl.is_zero() {
                CACHE_DEFAULT_TTL
            } else {
                default_ttl
            },
            cache_dir,
        }
    }

    /// Looks up `key`, consulting the volatile tier first and falling back
    /// to the persistent tier.
    ///
    /// An expired resident entry is evicted from both tiers and reported as
    /// a miss, as is a resident entry whose backing file has vanished. A
    /// fresh persisted-only entry is promoted into the volatile tier with
    /// `created_at` reset to now.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let now = Utc::now();

        if let Some(idx) = self.entries.iter().position(|e| e.key == key) {
            if self.entries[idx].is_expired(now) {
                let removed = self.entries.remove(idx);
                let _ = fs::remove_file(self.entry_path(&removed.key));
                log::debug!("cache entry expired: {key}");
                return None;
            }

            if !self.entry_path(key).exists() {
                self.entries.remove(idx);
                log::debug!("cache backing file missing: {key}");
                return None;
            }

            log::debug!("cache hit (memory): {key}");
            return Some(self.entries[idx].payload.clone());
        }

        let payload = self.load_from_disk(key)?;
        log::debug!("cache hit (disk): {key}");
        self.entries.push(CacheEntry {
            key: key.to_string(),
            payload: payload.clone(),
            created_at: Utc::now(),
            ttl: self.default_ttl,
        });
        Some(payload)
    }

    /// Stores `payload` under `key` with the default TTL.
    pub fn set(&mut self, key: &str, payload: &str) {
        self.set_with_ttl(key, payload, self.default_ttl);
    }

    /// Stores `payload` under `key` with an explicit TTL.
    ///
    /// Any existing entry for the key is replaced. At capacity, the oldest
    /// entry by `created_at` is evicted along with its backing file. A
    /// persistence write failure is logged and does not fail the operation.
    /// Empty payloads are rejected.
    pub fn set_with_ttl(&mut self, key: &str, payload: &str, ttl: Duration) {
        if payload.is_empty() {
            log::warn!("refusing to cache empty payload for key: {key}");
            return;
        }

        if let Some(idx) = self.entries.iter().position(|e| e.key == key) {
            self.entries.remove(idx);
        }

        if self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }

        self.entries.push(CacheEntry {
            key: key.to_string(),
            payload: payload.to_string(),
            created_at: Utc::now(),
            ttl,
        });

        if let Err(e) = self.persist(key, payload) {
            log::warn!("cache persistence failed for key {key}: {e}");
        }
    }

    /// Evicts every volatile entry and deletes every regular file in the
    /// cache directory except the protected `README.md`.
    pub fn clear(&mut self) {
        for entry in &self.entries {
            let _ = fs::remove_file(self.entry_path(&entry.key));
        }
        self.entries.clear();

        let Ok(dir) = fs::read_dir(&self.cache_dir) else {
            return;
        };
        for dir_entry in dir.flatten() {
            let path = dir_entry.path();
            if path
                .file_name()
                .map(|name| name == PROTECTED_FILE)
                .unwrap_or(false)
            {
                continue;
            }
            if path.is_file() {
                let _ = fs::remove_file(&path);
            }
        }

        log::debug!("cache cleared");
    }

    /// Number of entries resident in the volatile tier
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the volatile tier is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The directory holding the persistent tier
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the backing file for `key`
    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", hash_key(key)))
    }

    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Reads a persisted entry, deleting it if its mtime is older than the
    /// default TTL. The contents must parse as JSON to count.
    fn load_from_disk(&self, key: &str) -> Option<String> {
        let path = self.entry_path(key);

        if !file_is_fresh(&path, self.default_ttl) {
            if path.exists() {
                let _ = fs::remove_file(&path);
                log::debug!("stale cache file removed: {key}");
            }
            return None;
        }

        let content = fs::read_to_string(&path).ok()?;
        serde_json::from_str::<serde_json::Value>(&content).ok()?;
        Some(content)
    }

    /// Writes the backing file for `key`, pretty-printing the JSON payload.
    fn persist(&self, key: &str, payload: &str) -> io::Result<()> {
        self.ensure_dir()?;

        let doc: serde_json::Value = serde_json::from_str(payload)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;
        let pretty = serde_json::to_string_pretty(&doc)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;

        fs::write(self.entry_path(key), pretty)
    }

    /// Removes the entry with the smallest `created_at` and its backing
    /// file. Scans first, then removes by index.
    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| entry.created_at)
            .map(|(idx, _)| idx);

        if let Some(idx) = oldest {
            let removed = self.entries.remove(idx);
            let _ = fs::remove_file(self.entry_path(&removed.key));
            log::debug!("evicted oldest cache entry: {}", removed.key);
        }
    }
}

/// Whether `path` exists and was modified within `ttl`.
fn file_is_fresh(path: &Path, ttl: Duration) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };

    match modified.elapsed() {
        Ok(age) => age <= ttl,
        // Modification time in the future; treat as fresh
        Err(_) => true,
    }
}
