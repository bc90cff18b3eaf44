//! Template cache bookkeeping.
//! Freshness of the cached template repositories is an explicit value,
//! loaded from and saved to a [`CacheStore`].

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How long fetched templates are considered fresh.
pub const CACHE_TTL_HOURS: i64 = 24;

pub const CACHE_FILE: &str = "cache.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub last_fetch: Option<DateTime<Utc>>,
}

impl CacheInfo {
    pub fn ttl() -> Duration {
        Duration::hours(CACHE_TTL_HOURS)
    }

    /// True when templates were never fetched or the last fetch is older than `ttl`.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.last_fetch {
            Some(last) => now.signed_duration_since(last) > ttl,
            None => true,
        }
    }

    pub fn mark_fetched(&mut self, now: DateTime<Utc>) {
        self.last_fetch = Some(now);
    }
}

/// Persistence of [`CacheInfo`].
pub trait CacheStore {
    fn load(&self) -> Result<CacheInfo>;
    fn save(&self, info: &CacheInfo) -> Result<()>;
}

/// Stores cache info as JSON under the cache directory.
#[derive(Debug, Clone)]
pub struct JsonCacheStore {
    path: PathBuf,
}

impl JsonCacheStore {
    pub fn new(cache_dir: &Path) -> Self {
        Self { path: cache_dir.join(CACHE_FILE) }
    }
}

impl CacheStore for JsonCacheStore {
    /// A missing file yields empty info.
    fn load(&self) -> Result<CacheInfo> {
        if !self.path.exists() {
            return Ok(CacheInfo::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data)
            .map_err(|e| Error::ConfigError(format!("reading {}: {e}", self.path.display())))
    }

    fn save(&self, info: &CacheInfo) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(info)
            .map_err(|e| Error::ConfigError(format!("encoding cache info: {e}")))?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// True when the repository clone at `repo_dir` does not exist yet.
pub fn needs_initial_fetch(repo_dir: &Path) -> bool {
    !repo_dir.join(".git").exists()
}
