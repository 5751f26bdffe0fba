//! On-disk cache index (`cache_index.json`).

use std::{collections::BTreeMap, fmt, fs, io, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const INDEX_FILE: &str = "cache_index.json";

/// What a cached artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Pdf,
    Latex,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Latex => "latex",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "application/pdf",
            ArtifactKind::Latex => "application/x-tex",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Latex => "tex",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// File name inside the cache directory.
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub size: u64,
    pub kind: ArtifactKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheIndex {
    #[serde(default)]
    pub entries: BTreeMap<String, CacheEntry>,
    pub last_cleanup: DateTime<Utc>,
}

impl CacheIndex {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            entries: BTreeMap::new(),
            last_cleanup: now,
        }
    }

    /// Reads the index, starting fresh when it is missing or unreadable.
    pub fn load(path: &Path, now: DateTime<Utc>) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::new(now),
            Err(e) => {
                warn!("Cache index unreadable ({e}), creating new one");
                return Self::new(now);
            }
        };

        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("Cache index corrupted ({e}), creating new one");
            Self::new(now)
        })
    }

    /// Writes the index atomically: a temp file in the same directory is
    /// renamed over the old index.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn total_size(&self) -> u64 {
        self.entries.values().map(|e| e.size).sum()
    }
}
