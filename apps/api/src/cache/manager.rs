//! Content-addressed artifact cache.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    cache::index::{ArtifactKind, CacheEntry, CacheIndex, INDEX_FILE},
    errors::AppError,
};

/// Maintenance runs at most this often.
const CLEANUP_INTERVAL_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub dir: PathBuf,
    pub ttl_secs: u64,
    pub max_bytes: u64,
}

/// A cache hit: the stored file and what it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub expired: Vec<String>,
    pub evicted: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size: u64,
    pub total_size_mb: f64,
    pub max_size_mb: f64,
    pub usage_percent: f64,
    pub last_cleanup: DateTime<Utc>,
    pub type_counts: BTreeMap<String, usize>,
}

/// Owns the cache directory and its index. Every file it stores is a copy;
/// the cache never references files it does not own.
pub struct CacheManager {
    dir: PathBuf,
    index_path: PathBuf,
    ttl: Duration,
    max_bytes: u64,
    index: CacheIndex,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn bytes_to_mb(bytes: u64) -> f64 {
    round2(bytes as f64 / (1024.0 * 1024.0))
}

/// Keys become file names, so only plain ASCII word characters are allowed.
fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn remove_file_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl CacheManager {
    /// Opens (or creates) the cache directory and runs maintenance if it is due.
    pub fn open(settings: CacheSettings) -> Result<Self, AppError> {
        fs::create_dir_all(&settings.dir)?;
        let index_path = settings.dir.join(INDEX_FILE);
        let now = Utc::now();

        let index = CacheIndex::load(&index_path, now);
        let ttl_secs = settings.ttl_secs.min((i64::MAX / 1000) as u64) as i64;

        let mut manager = Self {
            dir: settings.dir,
            index_path,
            ttl: Duration::seconds(ttl_secs),
            max_bytes: settings.max_bytes,
            index,
        };
        if !manager.index_path.exists() {
            manager.save()?;
        }
        manager.maybe_run_maintenance(now)?;

        info!(
            "Cache ready at {} ({} entries)",
            manager.dir.display(),
            manager.index.entries.len()
        );
        Ok(manager)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn save(&self) -> Result<(), AppError> {
        self.index.save(&self.index_path)?;
        Ok(())
    }

    /// Looks up `key`. A stale entry whose file has disappeared is purged and
    /// reported as a miss.
    pub fn get(&mut self, key: &str) -> Result<Option<CachedArtifact>, AppError> {
        let Some(entry) = self.index.entries.get_mut(key) else {
            return Ok(None);
        };

        let path = self.dir.join(&entry.filename);
        if !path.is_file() {
            warn!("Cached file for {key} is missing, dropping entry");
            self.index.entries.remove(key);
            self.save()?;
            return Ok(None);
        }

        entry.last_accessed = Utc::now();
        let kind = entry.kind;
        self.save()?;
        debug!("Cache hit for {key} ({kind})");
        Ok(Some(CachedArtifact { path, kind }))
    }

    /// Copies `source` into the cache under `key`, replacing any previous entry.
    pub fn put(
        &mut self,
        key: &str,
        source: &Path,
        kind: ArtifactKind,
    ) -> Result<PathBuf, AppError> {
        if !is_safe_key(key) {
            return Err(AppError::invalid(format!("Invalid cache key: {key}")));
        }
        if !source.is_file() {
            return Err(AppError::FileSystem(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {}", source.display()),
            )));
        }

        let now = Utc::now();
        self.maybe_run_maintenance(now)?;

        let filename = match source.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{key}_{kind}.{ext}"),
            None => format!("{key}_{kind}"),
        };
        let cached = self.dir.join(&filename);
        fs::copy(source, &cached)?;
        let size = fs::metadata(&cached)?.len();

        if let Some(previous) = self.index.entries.get(key) {
            if previous.filename != filename {
                remove_file_if_present(&self.dir.join(&previous.filename))?;
            }
        }

        self.index.entries.insert(
            key.to_string(),
            CacheEntry {
                filename,
                created_at: now,
                last_accessed: now,
                size,
                kind,
            },
        );
        self.save()?;

        debug!("Cached {key} ({kind}, {size} bytes)");
        Ok(cached)
    }

    fn remove_entry(&mut self, key: &str) -> Result<bool, AppError> {
        match self.index.entries.remove(key) {
            Some(entry) => {
                remove_file_if_present(&self.dir.join(&entry.filename))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Deletes the entry and its file. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> Result<bool, AppError> {
        let removed = self.remove_entry(key)?;
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Deletes every cached file (the index itself survives) and empties the index.
    pub fn clear(&mut self) -> Result<(), AppError> {
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            let is_index = path.file_name().and_then(|n| n.to_str()) == Some(INDEX_FILE);
            if path.is_file() && !is_index {
                remove_file_if_present(&path)?;
            }
        }

        self.index.entries.clear();
        self.index.last_cleanup = Utc::now();
        self.save()?;
        info!("Cache cleared");
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let total_size = self.index.total_size();

        let mut type_counts = BTreeMap::new();
        for entry in self.index.entries.values() {
            *type_counts.entry(entry.kind.to_string()).or_insert(0) += 1;
        }

        let usage_percent = if self.max_bytes > 0 {
            round2(total_size as f64 / self.max_bytes as f64 * 100.0)
        } else {
            0.0
        };

        CacheStats {
            entry_count: self.index.entries.len(),
            total_size,
            total_size_mb: bytes_to_mb(total_size),
            max_size_mb: bytes_to_mb(self.max_bytes),
            usage_percent,
            last_cleanup: self.index.last_cleanup,
            type_counts,
        }
    }

    /// Runs maintenance unless it already ran within the last 24 hours.
    pub fn maybe_run_maintenance(
        &mut self,
        now: DateTime<Utc>,
    ) -> Result<Option<CleanupReport>, AppError> {
        if now - self.index.last_cleanup < Duration::hours(CLEANUP_INTERVAL_HOURS) {
            return Ok(None);
        }
        self.run_maintenance(now).map(Some)
    }

    /// Drops entries older than the TTL, then evicts the oldest entries until the
    /// total size fits the cap.
    pub fn run_maintenance(&mut self, now: DateTime<Utc>) -> Result<CleanupReport, AppError> {
        info!("Running cache cleanup");
        let mut report = CleanupReport::default();

        let expired: Vec<String> = self
            .index
            .entries
            .iter()
            .filter(|(_, entry)| now - entry.created_at > self.ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.remove_entry(&key)?;
            report.expired.push(key);
        }

        if self.index.total_size() > self.max_bytes {
            let mut by_age: Vec<(DateTime<Utc>, String)> = self
                .index
                .entries
                .iter()
                .map(|(key, entry)| (entry.created_at, key.clone()))
                .collect();
            by_age.sort();

            for (_, key) in by_age {
                if self.index.total_size() <= self.max_bytes {
                    break;
                }
                self.remove_entry(&key)?;
                report.evicted.push(key);
            }
        }

        self.index.last_cleanup = now;
        self.save()?;

        if !report.expired.is_empty() || !report.evicted.is_empty() {
            info!(
                "Cache cleanup removed {} expired and {} evicted entries",
                report.expired.len(),
                report.evicted.len()
            );
        }
        Ok(report)
    }
}
