//! Network fetch seam.
//!
//! The worker never talks to the network directly; it goes through the
//! [`Fetcher`] trait so tests can script responses and hosts can substitute
//! their own transport. The shipped implementation is [`http::HttpFetcher`].

pub mod http;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Unexpected status {status} for {url}")]
    BadStatus { url: String, status: u16 },
}

impl FetchError {
    /// Wrap a transport-level failure for `url`.
    pub fn transport(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FetchError::Transport {
            url: url.into(),
            source: Box::new(source),
        }
    }
}

/// HTTP method of an intercepted request.
///
/// Only GET requests are ever served from cache; everything else is declined
/// back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Options,
    Patch,
}

impl Method {
    pub fn is_get(&self) -> bool {
        matches!(self, Method::Get)
    }
}

/// How a fetch interacts with intermediate HTTP caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Normal caching semantics.
    #[default]
    Default,
    /// Bypass intermediate caches (the install-time force-reload mode).
    Reload,
}

/// A request as seen by the worker.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub cache_mode: CacheMode,
}

impl FetchRequest {
    /// A plain GET for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            cache_mode: CacheMode::Default,
        }
    }

    /// A cache-bypassing GET, used when staging the core shell.
    pub fn reload(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            cache_mode: CacheMode::Reload,
        }
    }
}

/// A response body plus the metadata the cache stores alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl FetchResponse {
    /// Whether the status is in the successful 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// A minimal 200 response, mostly useful in tests and stored records.
    pub fn with_body(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Performs HTTP requests on behalf of the worker.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform the request, resolving with the response whatever its status.
    ///
    /// An `Err` means the transport failed (the fetch never resolved); a
    /// non-2xx response resolves normally and is the caller's to interpret.
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError>;
}
