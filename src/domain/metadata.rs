// src/domain/metadata.rs
//
// MetadataDocument - typed output of the Extraction Adapter.
//
// Pure value object: built once at the adapter boundary after schema
// validation, never mutated afterwards.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDocument {
    /// Identifier assigned by the source platform (REQUIRED, non-empty)
    pub native_id: String,

    /// Title (REQUIRED, may be empty)
    pub title: String,

    pub description: String,
    pub thumbnail_url: String,

    /// Whole seconds, truncated from the source value
    pub duration_seconds: u64,

    pub owner_name: String,

    /// Distinct language tags the source reports as available, sorted
    pub available_subtitle_languages: Vec<String>,
}

impl MetadataDocument {
    /// Document with only the required fields; everything else defaulted.
    pub fn new(native_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            native_id: native_id.into(),
            title: title.into(),
            description: String::new(),
            thumbnail_url: String::new(),
            duration_seconds: 0,
            owner_name: String::new(),
            available_subtitle_languages: Vec::new(),
        }
    }
}
