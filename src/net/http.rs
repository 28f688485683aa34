//! reqwest-backed [`Fetcher`] implementation.

use async_trait::async_trait;
use tracing::debug;

use crate::net::{CacheMode, FetchError, FetchRequest, FetchResponse, Fetcher, Method};

/// Fetcher that performs real HTTP requests over rustls.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Build on an existing client (shared pools, custom TLS, etc.).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Options => reqwest::Method::OPTIONS,
            Method::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.client.request(method, &request.url);
        if request.cache_mode == CacheMode::Reload {
            // Equivalent of the browser's {cache: 'reload'} install fetches.
            builder = builder.header(reqwest::header::CACHE_CONTROL, "no-cache");
        }

        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::transport(&request.url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(&request.url, e))?;

        debug!(url = %request.url, status, bytes = body.len(), "Fetched");

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}
