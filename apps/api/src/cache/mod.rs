//! Fingerprint-keyed cache of generated artifacts with TTL and size-cap maintenance.

pub mod fingerprint;
pub mod index;
pub mod manager;

pub use fingerprint::fingerprint;
pub use index::ArtifactKind;
pub use manager::{CacheManager, CacheSettings, CacheStats, CachedArtifact};
