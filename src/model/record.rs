// src/model/record.rs
//! The normalized output of the loader.

use super::properties::ExtractedProperties;
use crate::types::{ObjectId, SpaceId};
use serde::{Deserialize, Serialize};

/// One ingested object: its markdown plus flattened metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub content: String,
    pub metadata: RecordMetadata,
}

/// Metadata attached to every record.
///
/// The fixed keys are always present; property-derived keys are flattened
/// in next to them and only appear when the object carried them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub space_id: SpaceId,
    pub space_name: String,
    pub object_id: ObjectId,
    /// Duplicate of `object_id`, kept for consumers that key on `id`.
    pub id: ObjectId,
    pub name: String,
    pub archived: bool,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(flatten)]
    pub properties: ExtractedProperties,
}
