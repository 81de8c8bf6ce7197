// src/api/mod.rs
//! Anytype API access: transports, pagination, fetching and normalization.
//!
//! The layering, bottom up:
//! - `client` / `connection_pool`: the transport seam and reqwest clients
//! - `parser`: untyped JSON bodies into strict shapes
//! - `resolver`, `pagination`, `fetcher`: one concern per endpoint
//! - `sequential`, `parallel_fetcher`: the two orchestration modes

pub mod client;
pub mod connection_pool;
pub mod fetcher;
pub mod pagination;
pub mod parallel_fetcher;
pub mod parser;
pub mod resolver;
pub mod sequential;
pub mod types;

pub use client::{AsyncTransport, Connector, HttpConnector, Transport};
pub use connection_pool::{ClientSlot, PoolConfig};
pub use types::{ApiRequest, ApiResponse, FetchOutcome, ObjectPage, SkipReason};

use crate::diagnostics::DiagnosticSink;
use crate::error::LoaderError;
use crate::error_recovery::{send_with_retries, send_with_retries_async, RetryPolicy};
use crate::types::BaseUrl;
use std::sync::Arc;

/// Everything a request needs besides the transport.
///
/// Cheap to clone; every concurrent fetch task carries its own copy.
#[derive(Clone)]
pub struct ApiContext {
    pub base_url: BaseUrl,
    pub page_size: u32,
    pub query: Option<String>,
    pub retry_policy: RetryPolicy,
    pub sink: Arc<dyn DiagnosticSink>,
}

impl ApiContext {
    /// Sends through the retry adapter on a blocking transport.
    pub fn send(
        &self,
        transport: &dyn Transport,
        request: &ApiRequest,
    ) -> Result<ApiResponse, LoaderError> {
        send_with_retries(transport, request, &self.retry_policy, self.sink.as_ref())
    }

    /// Sends through the retry adapter on an async transport.
    pub async fn send_async(
        &self,
        transport: &dyn AsyncTransport,
        request: &ApiRequest,
    ) -> Result<ApiResponse, LoaderError> {
        send_with_retries_async(transport, request, &self.retry_policy, self.sink.as_ref()).await
    }

    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }
}

impl std::fmt::Debug for ApiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiContext")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("query", &self.query)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}
