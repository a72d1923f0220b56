// src/lib.rs
// Media Harvester - metadata and asset extraction pipeline
//
// Architecture:
// - Layered: domain, infrastructure, capabilities, store, orchestration
// - Explicit: configuration is a value handed to constructors
// - Pluggable: external tools sit behind async traits
// - Fail closed: nothing is persisted until every requested step finished

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod infrastructure;

// ============================================================================
// CAPABILITIES
// ============================================================================

pub mod extraction;
pub mod materialization;

// ============================================================================
// STORE & ORCHESTRATION
// ============================================================================

pub mod repositories;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use config::{DuplicatePolicy, HarvesterConfig, ToolSettings};

pub use domain::{validate_record, MetadataDocument, ResourceRecord};

pub use error::{
    AppError, AppResult, ExtractionError, MaterializationError, StoreError, StoreResult,
};

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

pub use extraction::{MetadataExtractor, YtDlpExtractor};

pub use materialization::{AssetDownloader, AssetHandle, AssetMaterializer, SubtitleAsset, YtDlpDownloader};

pub use repositories::{ResourceRepository, SqliteResourceRepository};

pub use services::{
    ExtractionRequest, ExtractionService, PipelineError, PipelineStage, SubtitleSummary,
};

pub use infrastructure::AssetStorage;
