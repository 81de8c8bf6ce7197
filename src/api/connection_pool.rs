// src/api/connection_pool.rs
//! Connection pooling for the concurrent loader.
//!
//! The pooled client is opened lazily on first concurrent use and released
//! explicitly. [`ClientSlot`] owns it for one loader.

use super::client::{AsyncTransport, Connector};
use crate::constants::REQUEST_TIMEOUT;
use crate::error::LoaderError;
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use std::time::Duration;

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum idle connections per host
    pub max_idle_per_host: usize,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
    /// How long an idle connection is kept
    pub pool_idle_timeout: Duration,
    /// Enable connection keep-alive
    pub tcp_keepalive: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_host: crate::constants::DEFAULT_MAX_CONCURRENCY,
            connect_timeout: Duration::from_secs(10),
            request_timeout: REQUEST_TIMEOUT,
            pool_idle_timeout: Duration::from_secs(90),
            tcp_keepalive: Some(Duration::from_secs(60)),
        }
    }
}

/// Build an async client with the given configuration
pub(crate) fn build_async_client(
    config: &PoolConfig,
    headers: HeaderMap,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .pool_max_idle_per_host(config.max_idle_per_host)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .pool_idle_timeout(config.pool_idle_timeout);

    if let Some(keepalive) = config.tcp_keepalive {
        builder = builder.tcp_keepalive(keepalive);
    }

    builder.build()
}

/// Build a blocking client with the given configuration
pub(crate) fn build_blocking_client(
    config: &PoolConfig,
    headers: HeaderMap,
) -> Result<reqwest::blocking::Client, reqwest::Error> {
    let mut builder = reqwest::blocking::Client::builder()
        .default_headers(headers)
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout);

    if let Some(keepalive) = config.tcp_keepalive {
        builder = builder.tcp_keepalive(keepalive);
    }

    builder.build()
}

/// Lazily opened, explicitly released pooled transport.
#[derive(Default)]
pub struct ClientSlot {
    slot: Mutex<Option<Arc<dyn AsyncTransport>>>,
}

impl ClientSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the open transport, opening it through `connector` if needed.
    pub fn get_or_open(
        &self,
        connector: &dyn Connector,
        max_concurrency: usize,
    ) -> Result<Arc<dyn AsyncTransport>, LoaderError> {
        let mut slot = self.slot.lock();
        if let Some(transport) = slot.as_ref() {
            return Ok(transport.clone());
        }

        let transport = connector.open_pool(max_concurrency)?;
        *slot = Some(transport.clone());
        Ok(transport)
    }

    pub fn is_open(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Drops the pooled transport. Returns whether one was open.
    ///
    /// Tasks still holding a handle finish on it; later calls open a new one.
    pub fn release(&self) -> bool {
        let released = self.slot.lock().take().is_some();
        if released {
            log::debug!("Released pooled client");
        }
        released
    }
}

impl std::fmt::Debug for ClientSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSlot")
            .field("open", &self.is_open())
            .finish()
    }
}
