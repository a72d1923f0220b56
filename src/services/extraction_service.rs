// src/services/extraction_service.rs
//
// Extraction Service - the pipeline orchestrator
//
// CRITICAL RULES:
// - Steps run in a fixed order: extract, assemble, video, subtitles, persist
// - A requested video that fails invalidates the whole run
// - Subtitle languages that fail are dropped, never escalated
// - Nothing is persisted until every requested asset step has finished
// - A failed run leaves no assets behind (best effort)
// - One attempt per request, no retries

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::DuplicatePolicy;
use crate::domain::{validate_record, ResourceRecord};
use crate::error::{ExtractionError, MaterializationError, StoreError, StoreResult};
use crate::extraction::MetadataExtractor;
use crate::materialization::AssetMaterializer;
use crate::repositories::ResourceRepository;

use super::extraction_types::{
    ExtractionRequest, PipelineError, PipelineStage, SubtitleSummary,
};

pub struct ExtractionService {
    extractor: Arc<dyn MetadataExtractor>,
    materializer: Arc<AssetMaterializer>,
    repository: Arc<dyn ResourceRepository>,
    duplicate_policy: DuplicatePolicy,
}

impl ExtractionService {
    pub fn new(
        extractor: Arc<dyn MetadataExtractor>,
        materializer: Arc<AssetMaterializer>,
        repository: Arc<dyn ResourceRepository>,
        duplicate_policy: DuplicatePolicy,
    ) -> Self {
        Self {
            extractor,
            materializer,
            repository,
            duplicate_policy,
        }
    }

    // ========================================================================
    // PIPELINE
    // ========================================================================

    /// Run one extraction request to completion.
    ///
    /// Returns the persisted record, or the stage that failed. Cancelling
    /// `cancel` aborts any in-flight tool invocation.
    pub async fn extract(
        &self,
        request: &ExtractionRequest,
        cancel: &CancellationToken,
    ) -> Result<ResourceRecord, PipelineError> {
        log::info!(
            "[pipeline] extract {} (video: {}, subtitles: {})",
            request.url,
            request.want_video,
            request.want_subtitles
        );

        // 1. Extracting
        let metadata = self
            .extractor
            .extract_metadata(&request.url, cancel)
            .await
            .map_err(|e| match e {
                ExtractionError::Cancelled => PipelineError::Cancelled {
                    stage: PipelineStage::Extraction,
                },
                other => PipelineError::Extraction(other),
            })?;

        if self.duplicate_policy == DuplicatePolicy::ReuseExisting {
            if let Some(existing) = self.find_existing(&metadata.native_id).await? {
                log::info!(
                    "[pipeline] {} already stored as {}, reusing",
                    existing.native_id,
                    existing.id
                );
                return Ok(existing);
            }
        }

        // 2. Assembling
        let mut record = ResourceRecord::from_metadata(&metadata);
        validate_record(&record).map_err(|e| {
            PipelineError::Extraction(ExtractionError::MalformedOutput(e.to_string()))
        })?;

        match self.materialize_and_persist(request, &mut record, cancel).await {
            Ok(()) => {
                log::info!("[pipeline] stored {} as {}", record.native_id, record.id);
                Ok(record)
            }
            Err(e) => {
                log::warn!("[pipeline] {} failed at {}: {}", request.url, e.stage(), e);
                self.materializer.discard(record.id).await;
                Err(e)
            }
        }
    }

    /// Steps 3 to 5. Any error leaves `record` unsaved.
    async fn materialize_and_persist(
        &self,
        request: &ExtractionRequest,
        record: &mut ResourceRecord,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        // 3. MaterializingVideo
        if request.want_video {
            let handle = self
                .materializer
                .materialize_video(&request.url, record.id, cancel)
                .await
                .map_err(|e| match e {
                    MaterializationError::Cancelled => PipelineError::Cancelled {
                        stage: PipelineStage::VideoMaterialization,
                    },
                    other => PipelineError::VideoMaterialization(other),
                })?;
            record.local_media_path = Some(handle.path_string());
        }

        // 4. MaterializingSubtitles
        if request.want_subtitles {
            let produced = self
                .materializer
                .materialize_subtitles(&request.url, record.id, &record.subtitle_languages, cancel)
                .await;
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled {
                    stage: PipelineStage::SubtitleMaterialization,
                });
            }
            record.local_subtitle_paths = produced
                .iter()
                .map(|asset| asset.handle.path_string())
                .collect();
        }

        // 5. Persisting
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled {
                stage: PipelineStage::Persistence,
            });
        }
        record.created_at = Utc::now();

        let repository = Arc::clone(&self.repository);
        let to_save = record.clone();
        run_blocking(move || repository.save(&to_save))
            .await
            .map_err(PipelineError::Persistence)
    }

    async fn find_existing(&self, native_id: &str) -> Result<Option<ResourceRecord>, PipelineError> {
        match self.get_by_native_id(native_id).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(PipelineError::Persistence(e)),
        }
    }

    // ========================================================================
    // LOOKUPS
    // ========================================================================

    pub async fn get_by_id(&self, id: Uuid) -> StoreResult<ResourceRecord> {
        let repository = Arc::clone(&self.repository);
        run_blocking(move || repository.find_by_id(id)).await
    }

    pub async fn get_by_native_id(&self, native_id: &str) -> StoreResult<ResourceRecord> {
        let repository = Arc::clone(&self.repository);
        let native_id = native_id.to_string();
        run_blocking(move || repository.find_by_native_id(&native_id)).await
    }

    /// Languages offered by the source next to the subtitle files obtained.
    pub async fn get_subtitles(&self, id: Uuid) -> StoreResult<SubtitleSummary> {
        let record = self.get_by_id(id).await?;
        Ok(SubtitleSummary {
            resource_id: record.id,
            available: record.subtitle_languages,
            downloaded: record.local_subtitle_paths,
        })
    }
}

/// Run a blocking store call off the async worker threads.
async fn run_blocking<T, F>(f: F) -> StoreResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Unavailable(format!("store task failed: {}", e)))?
}
