// src/api/client.rs
//! HTTP transports for the Anytype API.
//!
//! The loader never talks to reqwest directly. It sends [`ApiRequest`]s
//! through a [`Transport`] (blocking, used by the sequential loader) or an
//! [`AsyncTransport`] (pooled, shared by concurrent fetch tasks). A
//! [`Connector`] hands out both; [`HttpConnector`] is the real one.

use super::connection_pool::{build_async_client, build_blocking_client, PoolConfig};
use super::types::{ApiRequest, ApiResponse};
use crate::constants::USER_AGENT;
use crate::error::LoaderError;
use crate::types::ApiKey;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::header;
use std::sync::Arc;
use std::time::Duration;

/// Performs one exchange and reports the raw status and body.
///
/// Implementations must not interpret the status: a 500 is still `Ok`.
/// Only a failure to complete the exchange is an `Err`.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, LoaderError>;
}

/// Async counterpart of [`Transport`], safe to share between tasks.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, LoaderError>;
}

/// Source of transports for one loader.
pub trait Connector: Send + Sync {
    /// The transport used by blocking calls.
    fn blocking(&self) -> Result<Arc<dyn Transport>, LoaderError>;

    /// Opens a new pooled transport sized for `max_concurrency` requests.
    fn open_pool(&self, max_concurrency: usize) -> Result<Arc<dyn AsyncTransport>, LoaderError>;
}

/// reqwest-backed connector carrying the bearer key and timeout.
pub struct HttpConnector {
    api_key: ApiKey,
    request_timeout: Duration,
    blocking: OnceCell<Arc<BlockingHttp>>,
}

impl HttpConnector {
    pub fn new(api_key: ApiKey, request_timeout: Duration) -> Self {
        Self {
            api_key,
            request_timeout,
            blocking: OnceCell::new(),
        }
    }

    /// Creates the default headers for Anytype API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, LoaderError> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&api_key.bearer()).map_err(|e| {
                LoaderError::Configuration(format!("Invalid API key format: {}", e))
            })?,
        );

        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(USER_AGENT),
        );

        Ok(headers)
    }

    fn pool_config(&self, max_concurrency: usize) -> PoolConfig {
        PoolConfig {
            max_idle_per_host: max_concurrency,
            request_timeout: self.request_timeout,
            ..PoolConfig::default()
        }
    }
}

impl Connector for HttpConnector {
    fn blocking(&self) -> Result<Arc<dyn Transport>, LoaderError> {
        let transport = self.blocking.get_or_try_init(|| {
            let headers = Self::create_headers(&self.api_key)?;
            let client = build_blocking_client(&self.pool_config(1), headers)
                .map_err(|e| LoaderError::transport("blocking client", &e))?;
            Ok::<_, LoaderError>(Arc::new(BlockingHttp { client }))
        })?;
        Ok(transport.clone())
    }

    fn open_pool(&self, max_concurrency: usize) -> Result<Arc<dyn AsyncTransport>, LoaderError> {
        let headers = Self::create_headers(&self.api_key)?;
        let client = build_async_client(&self.pool_config(max_concurrency), headers)
            .map_err(|e| LoaderError::transport("pooled client", &e))?;
        log::debug!("Opened pooled client (max idle per host {})", max_concurrency);
        Ok(Arc::new(PooledHttp { client }))
    }
}

/// Blocking reqwest transport.
struct BlockingHttp {
    client: reqwest::blocking::Client,
}

impl Transport for BlockingHttp {
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, LoaderError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .map_err(|e| LoaderError::transport(&request.url, &e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| LoaderError::transport(&request.url, &e))?;

        Ok(ApiResponse::new(status, body, request.url.clone()))
    }
}

/// Pooled async reqwest transport.
struct PooledHttp {
    client: reqwest::Client,
}

#[async_trait]
impl AsyncTransport for PooledHttp {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, LoaderError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LoaderError::transport(&request.url, &e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| LoaderError::transport(&request.url, &e))?;

        Ok(ApiResponse::new(status, body, request.url.clone()))
    }
}
