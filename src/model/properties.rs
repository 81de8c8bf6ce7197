// src/model/properties.rs
//! The subset of object properties projected into record metadata.

use serde::{Deserialize, Serialize};

/// Property keys the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownProperty {
    /// `tag` → `tags`, a list of tag names
    Tag,
    /// `description` → `description`
    Description,
    /// `created_date` → `created_at`
    CreatedDate,
    /// `last_modified_date` → `updated_at`
    LastModifiedDate,
    /// `last_opened_date` → `last_opened_at`
    LastOpenedDate,
}

impl KnownProperty {
    /// Looks up a property key; keys outside the allow-list yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "tag" => Some(Self::Tag),
            "description" => Some(Self::Description),
            "created_date" => Some(Self::CreatedDate),
            "last_modified_date" => Some(Self::LastModifiedDate),
            "last_opened_date" => Some(Self::LastOpenedDate),
            _ => None,
        }
    }
}

/// Property values extracted from an object, all optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened_at: Option<String>,
}

impl ExtractedProperties {
    pub fn is_empty(&self) -> bool {
        self.tags.is_none()
            && self.description.is_none()
            && self.created_at.is_none()
            && self.updated_at.is_none()
            && self.last_opened_at.is_none()
    }

    /// Stores a scalar property value. Later occurrences of a key overwrite earlier ones.
    pub(crate) fn set_text(&mut self, property: KnownProperty, value: String) {
        let slot = match property {
            KnownProperty::Description => &mut self.description,
            KnownProperty::CreatedDate => &mut self.created_at,
            KnownProperty::LastModifiedDate => &mut self.updated_at,
            KnownProperty::LastOpenedDate => &mut self.last_opened_at,
            KnownProperty::Tag => return,
        };
        *slot = Some(value);
    }
}
