// src/model/mod.rs
//! Domain model: the records the loader emits.

mod properties;
mod record;

pub use properties::{ExtractedProperties, KnownProperty};
pub use record::{Record, RecordMetadata};
