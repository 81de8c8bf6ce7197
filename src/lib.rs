// src/lib.rs
//! anytype-loader library: loads Anytype spaces as `(content, metadata)` records.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `LoaderError`, `ValidationError`, `StatusClass`
//! - **Configuration**: `LoaderConfig`, `CommandLineInput`, `RetryPolicy`
//! - **Domain model**: `Record`, `RecordMetadata`, `ExtractedProperties`
//! - **Domain types**: `SpaceId`, `ObjectId`, `ApiKey`, `BaseUrl`
//! - **Loader**: `AnytypeLoader`, `LoaderBuilder`, `FetchOutcome`
//! - **Transport seam**: `Transport`, `AsyncTransport`, `Connector`, `HttpConnector`
//! - **Diagnostics**: `Diagnostic`, `DiagnosticSink`, `LogSink`, `CollectingSink`

pub mod api;
mod config;
pub mod constants;
mod diagnostics;
mod error;
mod error_recovery;
mod loader;
mod model;
mod types;

// --- Error Handling ---
pub use crate::error::{LoaderError, Result, StatusClass};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{output_path, CommandLineInput, LoaderConfig};
pub use crate::error_recovery::{raise_for_status, RetryPolicy};

// --- Domain Model ---
pub use crate::model::{ExtractedProperties, KnownProperty, Record, RecordMetadata};

// --- Domain Types ---
pub use crate::types::{ApiKey, BaseUrl, Id, ObjectId, SpaceId};

// --- Loader ---
pub use crate::api::{FetchOutcome, SkipReason};
pub use crate::loader::{AnytypeLoader, LoaderBuilder};

// --- Transport Seam ---
pub use crate::api::{
    ApiRequest, ApiResponse, AsyncTransport, ClientSlot, Connector, HttpConnector, PoolConfig,
    Transport,
};

// --- Diagnostics ---
pub use crate::diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, LogSink};
