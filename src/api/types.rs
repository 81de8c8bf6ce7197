// src/api/types.rs
//! Type definitions for the Anytype API module.
//!
//! Requests and responses cross the transport seam as these plain values,
//! so a transport never needs to know which endpoint it is serving.

use crate::error::{LoaderError, StatusClass};
use crate::model::Record;
use crate::types::{ObjectId, SpaceId};
use reqwest::Method;
use serde_json::Value;
use std::fmt;

// --- Transport Types ---

/// One HTTP exchange to perform. Headers are the transport's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// Adds `limit` and `offset` query parameters.
    pub fn paged(mut self, limit: u32, offset: usize) -> Self {
        self.query.push(("limit", limit.to_string()));
        self.query.push(("offset", offset.to_string()));
        self
    }

    /// Looks up a query parameter by name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    pub url: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            url: url.into(),
        }
    }

    pub fn class(&self) -> StatusClass {
        StatusClass::classify(self.status)
    }

    /// Decodes the body as an untyped JSON tree.
    pub fn json(&self) -> Result<Value, LoaderError> {
        serde_json::from_str(&self.body).map_err(|e| LoaderError::MalformedResponse {
            context: self.url.clone(),
            reason: format!("body is not JSON: {}", e),
        })
    }
}

// --- Normalized Response Types ---

/// A space as listed by `GET /v1/spaces`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpaceEntry {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// One page of an object listing or search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub ids: Vec<ObjectId>,
    /// Entries the server returned on this page, including ones without a usable id.
    pub returned: usize,
    pub has_more: bool,
}

/// The `object` of a detail response, validated into a strict shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDetail {
    pub markdown: Option<String>,
    pub name: Option<String>,
    pub archived: bool,
    pub type_name: Option<String>,
    /// The raw `properties` array, projected later by the normalizer.
    pub properties: Option<Value>,
}

// --- Fetch Outcomes ---

/// What happened to one object id.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The object produced a record.
    Emitted(Box<Record>),
    /// The object was fetched but yields no record (not an error).
    Skipped {
        object_id: ObjectId,
        reason: SkipReason,
    },
    /// Fetching failed. `object_id` is `None` when a listing page failed.
    Failed {
        space_id: SpaceId,
        object_id: Option<ObjectId>,
        error: LoaderError,
    },
}

impl FetchOutcome {
    /// Converts into the record stream item: skips vanish, failures become `Err`.
    pub fn into_record(self) -> Option<Result<Record, LoaderError>> {
        match self {
            FetchOutcome::Emitted(record) => Some(Ok(*record)),
            FetchOutcome::Skipped { .. } => None,
            FetchOutcome::Failed { error, .. } => Some(Err(error)),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }

    /// A failure that should stop the whole run, see [`LoaderError::ends_run`].
    pub fn ends_run(&self) -> bool {
        matches!(self, FetchOutcome::Failed { error, .. } if error.ends_run())
    }
}

/// Why an object was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingMarkdown,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingMarkdown => write!(f, "no markdown content"),
        }
    }
}
