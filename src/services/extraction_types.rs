// src/services/extraction_types.rs
//
// Request / result types of the extraction pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{ExtractionError, MaterializationError, StoreError};

// ============================================================================
// REQUEST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub url: String,
    pub want_video: bool,
    pub want_subtitles: bool,
}

impl ExtractionRequest {
    /// Metadata only.
    pub fn metadata_only(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            want_video: false,
            want_subtitles: false,
        }
    }

    pub fn with_video(mut self, want: bool) -> Self {
        self.want_video = want;
        self
    }

    pub fn with_subtitles(mut self, want: bool) -> Self {
        self.want_subtitles = want;
        self
    }
}

// ============================================================================
// FAILURE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extraction,
    VideoMaterialization,
    SubtitleMaterialization,
    Persistence,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Extraction => "extraction",
            PipelineStage::VideoMaterialization => "video materialization",
            PipelineStage::SubtitleMaterialization => "subtitle materialization",
            PipelineStage::Persistence => "persistence",
        };
        f.write_str(name)
    }
}

/// Terminal failure of one pipeline run. Nothing was persisted.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Extraction failed: {0}")]
    Extraction(#[source] ExtractionError),

    #[error("Video materialization failed: {0}")]
    VideoMaterialization(#[source] MaterializationError),

    #[error("Persistence failed: {0}")]
    Persistence(#[source] StoreError),

    #[error("Cancelled during {stage}")]
    Cancelled { stage: PipelineStage },
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Extraction(_) => PipelineStage::Extraction,
            PipelineError::VideoMaterialization(_) => PipelineStage::VideoMaterialization,
            PipelineError::Persistence(_) => PipelineStage::Persistence,
            PipelineError::Cancelled { stage } => *stage,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled { .. })
    }
}

// ============================================================================
// SUBTITLE SUMMARY
// ============================================================================

/// What the source offered next to what was actually downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleSummary {
    pub resource_id: Uuid,
    pub available: Vec<String>,
    pub downloaded: Vec<String>,
}
