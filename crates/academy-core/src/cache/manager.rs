use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::directory::{DirectoryPayload, Scope};

/// Consider cache stale after 1 hour.
const CACHE_STALE_MINUTES: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        let now = Utc::now();
        (now - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew (negative ages)
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    pub fn is_stale(&self) -> bool {
        self.age_minutes() > CACHE_STALE_MINUTES
    }
}

pub struct SnapshotCache {
    cache_dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn scope_name(scope: &Scope) -> String {
        match scope {
            Scope::Global => "directory_global".to_string(),
            Scope::Branch(branch) => format!("directory_branch_{}", Self::file_safe(branch.as_str())),
        }
    }

    /// Escape an id for use in a file name. ASCII letters, digits and `-`
    /// pass through; anything else becomes `_` plus its hex code point, so
    /// separators and `..` can never leave the cache directory and distinct
    /// ids never share a file.
    fn file_safe(id: &str) -> String {
        let mut out = String::with_capacity(id.len());
        for c in id.chars() {
            if c.is_ascii_alphanumeric() || c == '-' {
                out.push(c);
            } else {
                out.push_str(&format!("_{:x}", c as u32));
            }
        }
        out
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(&cached)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        Ok(())
    }

    // ===== Directory snapshots =====

    pub fn load_directory(&self, scope: &Scope) -> Result<Option<CachedData<DirectoryPayload>>> {
        self.load(&Self::scope_name(scope))
    }

    pub fn save_directory(&self, scope: &Scope, payload: &DirectoryPayload) -> Result<()> {
        self.save(&Self::scope_name(scope), payload)
    }

    /// Age of the cached snapshot for display, logging read errors instead
    /// of failing.
    pub fn directory_age(&self, scope: &Scope) -> Option<String> {
        match self.load_directory(scope) {
            Ok(Some(cached)) => Some(cached.age_display()),
            Ok(None) => None,
            Err(e) => {
                debug!(scope = ?scope, error = %e, "Failed to load cache for age display");
                None
            }
        }
    }

    pub fn is_stale(&self, scope: &Scope) -> bool {
        match self.load_directory(scope) {
            Ok(Some(cached)) => cached.is_stale(),
            Ok(None) => true,
            Err(e) => {
                debug!(scope = ?scope, error = %e, "Failed to load cache for staleness check");
                true
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
