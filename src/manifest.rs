//! Resource manifest and resource-key handling.
//!
//! The manifest is the build tool's output: a flat map from root-relative
//! resource path to content checksum, plus the ordered core-shell list that
//! must be staged before the worker can activate. The site root is the
//! literal key `/`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The resource key for the site root document.
pub const ROOT_KEY: &str = "/";

/// Fixed key under which the stored manifest record lives in the
/// manifest-history store.
pub const STORED_MANIFEST_KEY: &str = "manifest";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("I/O error reading manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Core shell entry {0:?} is not a manifest key")]
    UnknownCoreEntry(String),
}

/// Build-time mapping of cacheable resource path to content checksum.
///
/// Checksums are opaque strings, stable iff the content is unchanged.
/// Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest {
    entries: BTreeMap<String, String>,
}

impl ResourceManifest {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// The checksum recorded for a resource key, if any.
    pub fn checksum(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to the flat JSON object persisted as the stored manifest.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.entries)
    }

    /// Parse the flat JSON object form back into a manifest.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        Ok(Self {
            entries: serde_json::from_slice(bytes)?,
        })
    }
}

/// Whether a cached resource key must be evicted during an upgrade.
///
/// A key is stale when it no longer appears in the current manifest, or when
/// its checksum differs from what the previous activation recorded. Keys with
/// unchanged checksums are reused across the upgrade.
pub fn is_stale(current: &ResourceManifest, stored: &ResourceManifest, key: &str) -> bool {
    match current.checksum(key) {
        None => true,
        Some(checksum) => stored.checksum(key) != Some(checksum),
    }
}

/// The ordered application-shell resource list downloaded during install.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoreShell(pub Vec<String>);

impl CoreShell {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// On-disk shape of the build tool's generated manifest file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestFile {
    /// Resource path → checksum.
    pub resources: ResourceManifest,

    /// Shell files that must be present before the worker is ready.
    #[serde(default)]
    pub core: CoreShell,
}

impl ManifestFile {
    /// Load and validate a generated manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read(path)?;
        let file: ManifestFile = serde_json::from_slice(&raw)?;
        for entry in file.core.iter() {
            if !file.resources.contains(entry) {
                return Err(ManifestError::UnknownCoreEntry(entry.to_string()));
            }
        }
        Ok(file)
    }
}

/// Derive the manifest resource key for a URL under `origin`.
///
/// Strips the origin prefix and any `?v=` cache-busting suffix; the bare
/// origin, a `#`-fragment navigation, and an empty remainder all normalize to
/// the root key `/`. Returns `None` for URLs outside the origin — those are
/// never ours to serve.
pub fn resource_key(origin: &str, url: &str) -> Option<String> {
    let origin = origin.trim_end_matches('/');
    if url == origin {
        return Some(ROOT_KEY.to_string());
    }
    let rest = url.strip_prefix(origin)?;
    let mut key = rest.strip_prefix('/')?;
    if let Some((bare, _)) = key.split_once("?v=") {
        key = bare;
    }
    if key.is_empty() || key.starts_with('#') {
        return Some(ROOT_KEY.to_string());
    }
    Some(key.to_string())
}

/// The canonical URL under which a resource key is fetched and cached.
pub fn canonical_url(origin: &str, key: &str) -> String {
    let origin = origin.trim_end_matches('/');
    if key == ROOT_KEY {
        format!("{origin}/")
    } else {
        format!("{origin}/{key}")
    }
}
