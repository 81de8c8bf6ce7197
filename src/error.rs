// src/error.rs
//! Loader error types with structured error handling.
//!
//! Error variants form the vocabulary for the ways ingesting a space can
//! fail. Soft problems (unknown spaces, missing markdown, odd listing
//! shapes) are not errors at all; they are reported through
//! [`crate::diagnostics`] and the loader keeps going.

use std::fmt;
use thiserror::Error;

/// HTTP status codes as a typed vocabulary.
///
/// The retry adapter and the error classifier both dispatch on this
/// instead of on raw numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Anything below 400
    Success,
    /// 429: back off and retry
    RateLimited,
    /// 503: back off and retry
    Unavailable,
    /// 401: the bearer key was rejected
    Unauthorized,
    /// 403: the key lacks access to the resource
    Forbidden,
    /// Every other status at or above 400
    Failed(u16),
}

impl StatusClass {
    /// Classifies a raw HTTP status code.
    pub fn classify(status: u16) -> Self {
        match status {
            0..=399 => Self::Success,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            429 => Self::RateLimited,
            503 => Self::Unavailable,
            other => Self::Failed(other),
        }
    }

    /// Whether this status is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Unavailable)
    }

    /// Whether this status means the credential itself is the problem.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Forbidden)
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::Unavailable => write!(f, "service_unavailable"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::Failed(code) => write!(f, "http_{}", code),
        }
    }
}

/// Main loader error type.
///
/// `Configuration` and `Validation` are raised while building a loader and
/// never retried. `Api` and `Transport` together cover every failed
/// exchange that is not an authentication problem.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    #[error("Authentication failed for {url}: {detail}")]
    Authentication {
        url: String,
        status: u16,
        detail: String,
    },

    #[error("Request failed ({status}) for {url}: {detail}")]
    Api {
        url: String,
        status: u16,
        detail: String,
    },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Malformed response for {context}: {reason}")]
    MalformedResponse { context: String, reason: String },
}

impl LoaderError {
    /// The HTTP status behind this error, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status, .. } | Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error was raised before any request was sent.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Validation(_))
    }

    /// Whether no later request in the same run can be expected to succeed.
    ///
    /// A rejected key or an unreachable server affects every object alike,
    /// so the orchestrators stop instead of failing each remaining id.
    pub fn ends_run(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::Transport { .. })
    }

    /// Builds a transport error from a reqwest failure.
    pub(crate) fn transport(url: &str, err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("timed out: {}", err)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        };
        Self::Transport {
            url: url.to_string(),
            message,
        }
    }
}

/// Result type alias for convenience
pub type Result<T, E = LoaderError> = std::result::Result<T, E>;
