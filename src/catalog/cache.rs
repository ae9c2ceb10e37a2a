//! On-disk copy of the market item list.
//!
//! Stored as pretty JSON with the time it was written, the server's item
//! collection version and the locale it was requested in, so a fresh cache
//! skips the network entirely and a stale one can still be reused when the
//! version has not changed.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

use super::item::WfmItem;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedItems {
    pub timestamp: DateTime<Local>,
    /// Server item collection version these items belong to. Empty when unknown.
    #[serde(default)]
    pub version: String,
    /// Locale the items were requested in. Empty for caches written before
    /// it was recorded.
    #[serde(default)]
    pub locale: String,
    pub items: Vec<WfmItem>,
}

impl CachedItems {
    pub fn new(version: impl Into<String>, locale: impl Into<String>, items: Vec<WfmItem>) -> Self {
        Self {
            timestamp: Local::now(),
            version: version.into(),
            locale: locale.into(),
            items,
        }
    }

    /// True when the cache was written less than `ttl` before `now`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Local>) -> bool {
        self.timestamp + ttl > now
    }
}

/// Reads the cache. A missing file is `Ok(None)`; a corrupt one is logged and
/// treated as missing.
pub fn load(path: &Path) -> Result<Option<CachedItems>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match serde_json::from_str(&contents) {
        Ok(cached) => Ok(Some(cached)),
        Err(e) => {
            log::warn!("Ignoring unreadable item cache {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

/// Writes the cache, creating the parent directory if needed.
pub fn save(path: &Path, cached: &CachedItems) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(cached)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
