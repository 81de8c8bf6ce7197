// src/diagnostics.rs
//! Non-fatal diagnostics emitted while loading.
//!
//! Anything the loader tolerates instead of failing on (an unknown space
//! name, an empty first page, an object without markdown) is described by a
//! [`Diagnostic`] and handed to a [`DiagnosticSink`]. The default sink
//! forwards to `log::warn!`; [`CollectingSink`] keeps them for inspection.

use crate::types::{ObjectId, SpaceId};
use parking_lot::Mutex;
use std::fmt;

/// A soft problem the loader worked around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Requested space names that no listed space carries.
    UnknownSpaces { names: Vec<String> },
    /// The space listing body was not `{"data": [...]}`.
    UnexpectedSpacesShape,
    /// An object listing body was not `{"data": [...], ...}`.
    UnexpectedListShape { space_id: SpaceId },
    /// A listing entry had no usable `id` and was dropped.
    ObjectWithoutId { space_id: SpaceId },
    /// The first page of a space came back empty.
    NoObjects { space_id: SpaceId },
    /// The object has no markdown body and produces no record.
    MissingMarkdown { object_id: ObjectId },
    /// The object has no name; the placeholder name is used.
    MissingName { object_id: ObjectId },
    /// The object has no type; the placeholder type is used.
    MissingType { object_id: ObjectId },
    /// A 429/503 response is about to be retried.
    RetryScheduled {
        url: String,
        status: u16,
        attempt: u32,
        max_retries: u32,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSpaces { names } => {
                write!(f, "Skipping unknown spaces: {}", names.join(", "))
            }
            Self::UnexpectedSpacesShape => {
                write!(f, "Unexpected list spaces response structure; no spaces returned")
            }
            Self::UnexpectedListShape { space_id } => write!(
                f,
                "Unexpected list response structure for space {}; treating as empty result",
                space_id
            ),
            Self::ObjectWithoutId { space_id } => {
                write!(f, "Skipping object without id in space {}", space_id)
            }
            Self::NoObjects { space_id } => {
                write!(f, "No objects returned for space {} (offset=0)", space_id)
            }
            Self::MissingMarkdown { object_id } => {
                write!(f, "No markdown content for object {}; skipping", object_id)
            }
            Self::MissingName { object_id } => write!(
                f,
                "Missing name for object {}; using '{}'",
                object_id,
                crate::constants::UNTITLED_OBJECT_NAME
            ),
            Self::MissingType { object_id } => write!(
                f,
                "Missing type for object {}; using '{}'",
                object_id,
                crate::constants::UNKNOWN_OBJECT_TYPE
            ),
            Self::RetryScheduled {
                url,
                status,
                attempt,
                max_retries,
            } => write!(
                f,
                "Rate limited ({}) on {}; retrying {}/{}",
                status, url, attempt, max_retries
            ),
        }
    }
}

/// The capability to report a [`Diagnostic`].
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to the `log` facade at warn level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
    }
}

/// Keeps every diagnostic in memory, and also logs it at debug level.
#[derive(Debug, Default)]
pub struct CollectingSink {
    seen: Mutex<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything emitted so far, in emission order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.seen.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        log::debug!("{}", diagnostic);
        self.seen.lock().push(diagnostic);
    }
}
