//! shellcache: versioned offline asset caching.
//!
//! Manages a permanent content cache for a fixed, build-time resource
//! manifest through a service-worker style lifecycle:
//!   install (stage the core shell) → activate (migrate / promote / evict)
//!   → fetch interception (cache-first, network-first root) → messages
//!   (skipWaiting, downloadOffline).
//!
//! The worker orchestrates three named stores (temp staging, permanent
//! content, manifest history) behind the [`storage::CacheStorage`] seam and
//! reaches the network only through the [`net::Fetcher`] seam, so hosts and
//! tests inject their own.

pub mod config;
pub mod manifest;
pub mod net;
pub mod storage;
pub mod worker;
