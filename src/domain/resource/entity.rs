use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::MetadataDocument;

/// Canonical, persisted representation of an extracted resource.
///
/// `subtitle_languages` is what the source offered; `local_subtitle_paths`
/// is what was actually downloaded. The two are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Identifier assigned by the source platform
    pub native_id: String,

    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub duration_seconds: u64,
    pub owner_name: String,

    /// Languages available at extraction time (sorted, distinct)
    pub subtitle_languages: Vec<String>,

    /// Materialized video, if requested and downloaded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_media_path: Option<String>,

    /// Materialized subtitle files, sorted by language
    pub local_subtitle_paths: Vec<String>,

    /// Set when the record is persisted
    pub created_at: DateTime<Utc>,
}

impl ResourceRecord {
    /// Assemble a provisional record from extracted metadata.
    ///
    /// Generates the identity; `created_at` is provisional until persisted.
    pub fn from_metadata(metadata: &MetadataDocument) -> Self {
        Self {
            id: Uuid::new_v4(),
            native_id: metadata.native_id.clone(),
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            thumbnail_url: metadata.thumbnail_url.clone(),
            duration_seconds: metadata.duration_seconds,
            owner_name: metadata.owner_name.clone(),
            subtitle_languages: metadata.available_subtitle_languages.clone(),
            local_media_path: None,
            local_subtitle_paths: Vec::new(),
            created_at: Utc::now(),
        }
    }
}
