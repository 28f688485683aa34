//! Runtime configuration for shellcache.
//!
//! Configuration can be loaded from a JSON file or constructed
//! programmatically. The manifest itself lives in its own generated file
//! (see [`crate::manifest::ManifestFile`]); this config points at it.

use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::worker::CacheNames;

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "shellcache",
    about = "Versioned offline asset cache: install, migrate, and prefetch a site's resource manifest"
)]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "shellcache.json")]
    pub config: PathBuf,

    /// Override the origin to cache from (e.g. "https://app.example").
    #[arg(long)]
    pub origin: Option<String>,

    /// After activation, download every manifest resource for full offline use.
    #[arg(long)]
    pub download_all: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Origin all manifest resources are resolved against.
    pub origin: String,

    /// Path to the build tool's generated manifest file.
    pub manifest_path: PathBuf,

    /// Base directory for the on-disk cache stores.
    pub cache_dir: PathBuf,

    /// Names of the three logical stores.
    #[serde(default)]
    pub cache_names: CacheNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8080".to_string(),
            manifest_path: PathBuf::from("manifest.json"),
            cache_dir: PathBuf::from(".shellcache"),
            cache_names: CacheNames::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }
}
