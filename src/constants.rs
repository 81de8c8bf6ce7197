// src/constants.rs
//! Domain constants that define the operational boundaries of the loader.
//!
//! Each constant is named for the domain concept it constrains. Reading
//! these should tell you how the loader talks to an Anytype API server:
//! how much it asks for per page, how patient it is, and what it writes
//! when the server leaves a field out.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Anytype API boundaries
// ---------------------------------------------------------------------------

/// How many object ids are requested per page of a listing or search.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Page size used for the one-shot space listing during name resolution.
///
/// Spaces are not paginated: anything past the first page is never seen.
pub const SPACE_LISTING_LIMIT: u32 = 100;

/// Upper bound on object fetches in flight at once in concurrent mode.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Per-request timeout applied by both the blocking and the pooled client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header value sent with every request.
pub const USER_AGENT: &str = "anytype-loader";

/// Base URL of a locally running Anytype desktop API.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:31009";

/// Environment variable the CLI reads the bearer key from.
pub const API_KEY_ENV_VAR: &str = "ANYTYPE_API_KEY";

// ---------------------------------------------------------------------------
// Retry budget
// ---------------------------------------------------------------------------

/// How many times a rate-limited (429) or unavailable (503) request is retried.
pub const MAX_RETRIES: u32 = 3;

/// Linear backoff unit: the n-th retry sleeps `n * RETRY_BACKOFF_UNIT`.
pub const RETRY_BACKOFF_UNIT: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Normalisation fallbacks
// ---------------------------------------------------------------------------

/// Name recorded for objects that arrive without one.
pub const UNTITLED_OBJECT_NAME: &str = "untitled";

/// Type label recorded for objects that arrive without a type.
pub const UNKNOWN_OBJECT_TYPE: &str = "unknown";

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
