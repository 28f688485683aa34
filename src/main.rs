//! shellcache CLI: warm a site's offline cache from its resource manifest.
//!
//! Loads the build-generated manifest, runs the install + activate lifecycle
//! against the configured origin with the disk-backed stores, and optionally
//! downloads the full resource set for offline use.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use shellcache::config::{Cli, Config};
use shellcache::manifest::ManifestFile;
use shellcache::net::http::HttpFetcher;
use shellcache::storage::disk::DiskStorage;
use shellcache::worker::CacheWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "shellcache=debug"
    } else {
        "shellcache=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    info!("shellcache v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let mut config = Config::load(&cli.config)?;
    if let Some(origin) = cli.origin {
        config.origin = origin;
    }

    // Load the generated resource manifest.
    let manifest_file = ManifestFile::load(&config.manifest_path)?;
    info!(
        origin = %config.origin,
        resources = manifest_file.resources.len(),
        core_shell = manifest_file.core.len(),
        "Manifest loaded"
    );

    // Wire up the disk stores and HTTP fetcher.
    let storage = Arc::new(DiskStorage::new(config.cache_dir.clone()).await?);
    let fetcher = Arc::new(HttpFetcher::new());

    let mut worker = CacheWorker::new(
        manifest_file.resources,
        manifest_file.core,
        config.origin.clone(),
        config.cache_names.clone(),
        storage,
        fetcher,
    );

    // Install: stage the core shell, bypassing intermediate caches.
    worker.install().await?;

    // Activate: migrate the permanent cache against the previous manifest.
    worker.activate().await?;
    info!(state = ?worker.state(), "Activation complete");

    // Optionally fill in every remaining manifest resource.
    if cli.download_all {
        let downloaded = worker.download_offline().await?;
        info!(downloaded, "Offline resource set complete");
    }

    Ok(())
}
