// src/services/extraction_service_tests.rs
//
// Extraction Service Tests
//
// Pipeline behavior against stub capabilities and a real SQLite store
// (or a mock store where the test must prove the store was never touched).

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;
    use uuid::Uuid;

    use crate::config::DuplicatePolicy;
    use crate::db::{create_connection_pool, get_connection, initialize_database};
    use crate::domain::MetadataDocument;
    use crate::error::{ExtractionError, MaterializationError, StoreError};
    use crate::infrastructure::AssetStorage;
    use crate::materialization::AssetMaterializer;
    use crate::repositories::{MockResourceRepository, ResourceRepository, SqliteResourceRepository};
    use crate::services::{ExtractionRequest, ExtractionService, PipelineError, PipelineStage};
    use crate::testing::{StubDownloader, StubExtractor};

    // ========================================================================
    // TEST HELPERS
    // ========================================================================

    const URL_A: &str = "https://www.youtube.com/watch?v=aaaaaaaaaaa";
    const URL_B: &str = "https://www.youtube.com/watch?v=bbbbbbbbbbb";

    struct Harness {
        root: TempDir,
        extractor: Arc<StubExtractor>,
        downloader: Arc<StubDownloader>,
        service: ExtractionService,
    }

    impl Harness {
        fn storage_dir(&self, kind: &str) -> PathBuf {
            self.root.path().join("storage").join("youtube").join(kind)
        }

        /// Number of per-resource directories under videos/ or subtitles/.
        fn resource_dirs(&self, kind: &str) -> usize {
            std::fs::read_dir(self.storage_dir(kind))
                .map(|entries| entries.count())
                .unwrap_or(0)
        }
    }

    fn document(native_id: &str, languages: &[&str]) -> MetadataDocument {
        let mut doc = MetadataDocument::new(native_id, format!("Title of {}", native_id));
        doc.description = "A description".to_string();
        doc.thumbnail_url = format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", native_id);
        doc.duration_seconds = 212;
        doc.owner_name = "Some Channel".to_string();
        doc.available_subtitle_languages = languages.iter().map(|l| l.to_string()).collect();
        doc
    }

    fn default_extractor() -> StubExtractor {
        StubExtractor::new()
            .with_document(URL_A, document("aaaaaaaaaaa", &["de", "en", "fr"]))
            .with_document(URL_B, document("bbbbbbbbbbb", &["en", "es"]))
    }

    fn sqlite_repository(root: &Path) -> Arc<dyn ResourceRepository> {
        let pool = Arc::new(create_connection_pool(&root.join("test.db"), 4).unwrap());
        initialize_database(&get_connection(&pool).unwrap()).unwrap();
        Arc::new(SqliteResourceRepository::new(pool))
    }

    fn build(
        extractor: StubExtractor,
        downloader: StubDownloader,
        repository: Option<Arc<dyn ResourceRepository>>,
        policy: DuplicatePolicy,
    ) -> Harness {
        let root = TempDir::new().unwrap();
        let extractor = Arc::new(extractor);
        let downloader = Arc::new(downloader);
        let repository = repository.unwrap_or_else(|| sqlite_repository(root.path()));

        let storage = AssetStorage::new(root.path().join("storage"), "youtube");
        let materializer = Arc::new(AssetMaterializer::new(downloader.clone(), storage, 2));
        let service = ExtractionService::new(extractor.clone(), materializer, repository, policy);

        Harness {
            root,
            extractor,
            downloader,
            service,
        }
    }

    fn harness() -> Harness {
        build(
            default_extractor(),
            StubDownloader::new(),
            None,
            DuplicatePolicy::AlwaysCreate,
        )
    }

    /// A store that fails the test if anything is saved.
    fn untouched_store() -> Arc<dyn ResourceRepository> {
        let mut store = MockResourceRepository::new();
        store.expect_save().times(0);
        Arc::new(store)
    }

    fn full(url: &str) -> ExtractionRequest {
        ExtractionRequest::metadata_only(url)
            .with_video(true)
            .with_subtitles(true)
    }

    // ========================================================================
    // STEP SELECTION
    // ========================================================================

    #[tokio::test]
    async fn test_metadata_only_never_materializes() {
        let h = harness();

        let record = h
            .service
            .extract(&ExtractionRequest::metadata_only(URL_A), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(h.downloader.total_calls(), 0);
        assert_eq!(record.local_media_path, None);
        assert!(record.local_subtitle_paths.is_empty());
        assert_eq!(h.resource_dirs("videos"), 0);
    }

    #[tokio::test]
    async fn test_scalar_fields_map_verbatim() {
        let h = harness();
        let doc = document("aaaaaaaaaaa", &["de", "en", "fr"]);

        let record = h
            .service
            .extract(&ExtractionRequest::metadata_only(URL_A), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(record.native_id, doc.native_id);
        assert_eq!(record.title, doc.title);
        assert_eq!(record.description, doc.description);
        assert_eq!(record.thumbnail_url, doc.thumbnail_url);
        assert_eq!(record.duration_seconds, doc.duration_seconds);
        assert_eq!(record.owner_name, doc.owner_name);
        assert_eq!(record.subtitle_languages, doc.available_subtitle_languages);
    }

    #[tokio::test]
    async fn test_full_request_records_both_asset_kinds() {
        let h = harness();

        let record = h
            .service
            .extract(&full(URL_A), &CancellationToken::new())
            .await
            .unwrap();

        let video = record.local_media_path.clone().unwrap();
        assert!(Path::new(&video).exists());
        assert!(video.contains(&record.id.to_string()));
        assert_eq!(record.local_subtitle_paths.len(), 3);
        assert!(record.local_subtitle_paths[0].ends_with("subtitle.de.vtt"));
        assert!(record.local_subtitle_paths[2].ends_with("subtitle.fr.vtt"));
    }

    // ========================================================================
    // FAILURE POLICY
    // ========================================================================

    #[tokio::test]
    async fn test_video_failure_fails_run_and_skips_store() {
        let h = build(
            default_extractor(),
            StubDownloader::new().failing_video(),
            Some(untouched_store()),
            DuplicatePolicy::AlwaysCreate,
        );

        let err = h
            .service
            .extract(&full(URL_A), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), PipelineStage::VideoMaterialization);
        assert!(matches!(
            err,
            PipelineError::VideoMaterialization(MaterializationError::ToolFailure(_))
        ));
        // Subtitles are never attempted once the video failed
        assert_eq!(h.downloader.subtitle_calls(), 0);
        assert_eq!(h.resource_dirs("videos"), 0);
    }

    #[tokio::test]
    async fn test_video_without_output_fails_run() {
        let h = build(
            default_extractor(),
            StubDownloader::new().producing_nothing(),
            Some(untouched_store()),
            DuplicatePolicy::AlwaysCreate,
        );

        let err = h
            .service
            .extract(
                &ExtractionRequest::metadata_only(URL_A).with_video(true),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::VideoMaterialization(MaterializationError::NoOutputProduced(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_subtitle_language_is_dropped() {
        let h = build(
            default_extractor(),
            StubDownloader::new().failing_languages(&["en"]),
            None,
            DuplicatePolicy::AlwaysCreate,
        );

        let record = h
            .service
            .extract(
                &ExtractionRequest::metadata_only(URL_A).with_subtitles(true),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(h.downloader.subtitle_calls(), 3);
        assert_eq!(record.local_subtitle_paths.len(), 2);
        assert!(record.local_subtitle_paths[0].ends_with("subtitle.de.vtt"));
        assert!(record.local_subtitle_paths[1].ends_with("subtitle.fr.vtt"));
        // Offered languages are kept apart from downloaded ones
        assert_eq!(record.subtitle_languages, vec!["de", "en", "fr"]);
    }

    #[tokio::test]
    async fn test_all_subtitles_failing_still_succeeds() {
        let h = build(
            default_extractor(),
            StubDownloader::new().failing_languages(&["de", "en", "fr"]),
            None,
            DuplicatePolicy::AlwaysCreate,
        );

        let record = h
            .service
            .extract(
                &ExtractionRequest::metadata_only(URL_A).with_subtitles(true),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(record.local_subtitle_paths.is_empty());
        assert_eq!(h.service.get_by_id(record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_store() {
        let h = build(
            default_extractor(),
            StubDownloader::new(),
            Some(untouched_store()),
            DuplicatePolicy::AlwaysCreate,
        );

        let err = h
            .service
            .extract(&full("https://example.com/unknown"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), PipelineStage::Extraction);
        assert!(matches!(err, PipelineError::Extraction(ExtractionError::ToolFailure(_))));
        assert_eq!(h.downloader.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_document_is_malformed_output() {
        let extractor = StubExtractor::new().with_document(URL_A, document("   ", &[]));
        let h = build(
            extractor,
            StubDownloader::new(),
            Some(untouched_store()),
            DuplicatePolicy::AlwaysCreate,
        );

        let err = h
            .service
            .extract(&full(URL_A), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Extraction(ExtractionError::MalformedOutput(_))
        ));
        assert_eq!(h.downloader.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_persistence_failure_discards_assets() {
        let mut store = MockResourceRepository::new();
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(StoreError::Unavailable("database is locked".to_string())));

        let h = build(
            default_extractor(),
            StubDownloader::new(),
            Some(Arc::new(store)),
            DuplicatePolicy::AlwaysCreate,
        );

        let err = h
            .service
            .extract(&full(URL_A), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), PipelineStage::Persistence);
        assert!(matches!(err, PipelineError::Persistence(StoreError::Unavailable(_))));
        assert!(!h.downloader.written().is_empty());
        for path in h.downloader.written() {
            assert!(!path.exists(), "{} should have been discarded", path.display());
        }
    }

    // ========================================================================
    // CANCELLATION
    // ========================================================================

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let h = build(
            default_extractor(),
            StubDownloader::new(),
            Some(untouched_store()),
            DuplicatePolicy::AlwaysCreate,
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = h.service.extract(&full(URL_A), &cancel).await.unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.stage(), PipelineStage::Extraction);
        assert_eq!(h.downloader.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_subtitles_persists_nothing() {
        let h = build(
            default_extractor(),
            StubDownloader::new().hanging_subtitles(),
            None,
            DuplicatePolicy::AlwaysCreate,
        );
        let cancel = CancellationToken::new();

        let canceller = {
            let cancel = cancel.clone();
            let downloader = Arc::clone(&h.downloader);
            tokio::spawn(async move {
                while downloader.subtitle_calls() == 0 {
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                }
                cancel.cancel();
            })
        };

        let err = h.service.extract(&full(URL_A), &cancel).await.unwrap_err();
        canceller.await.unwrap();

        assert!(err.is_cancelled());
        assert_eq!(err.stage(), PipelineStage::SubtitleMaterialization);
        assert_eq!(h.downloader.video_calls(), 1);
        assert!(h.downloader.subtitle_calls() >= 1);
        assert!(!h.downloader.written().is_empty());
        assert_eq!(h.resource_dirs("videos"), 0);
        assert_eq!(h.resource_dirs("subtitles"), 0);

        let lookup = h.service.get_by_native_id("aaaaaaaaaaa").await.unwrap_err();
        assert!(lookup.is_not_found());
    }

    // ========================================================================
    // LOOKUPS
    // ========================================================================

    #[tokio::test]
    async fn test_get_by_id_returns_extracted_record() {
        let h = harness();

        let record = h
            .service
            .extract(&full(URL_A), &CancellationToken::new())
            .await
            .unwrap();
        let found = h.service.get_by_id(record.id).await.unwrap();

        assert_eq!(found, record);
    }

    #[tokio::test]
    async fn test_get_by_unknown_id_is_not_found() {
        let h = harness();
        let err = h.service.get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_empty_subtitle_collection_round_trips() {
        let extractor = StubExtractor::new().with_document(URL_A, document("aaaaaaaaaaa", &[]));
        let h = build(
            extractor,
            StubDownloader::new(),
            None,
            DuplicatePolicy::AlwaysCreate,
        );

        let record = h
            .service
            .extract(
                &ExtractionRequest::metadata_only(URL_A).with_subtitles(true),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(h.downloader.subtitle_calls(), 0);

        let found = h.service.get_by_id(record.id).await.unwrap();
        assert!(found.subtitle_languages.is_empty());
        assert!(found.local_subtitle_paths.is_empty());
    }

    #[tokio::test]
    async fn test_get_subtitles_reports_both_sets() {
        let h = build(
            default_extractor(),
            StubDownloader::new().failing_languages(&["fr"]),
            None,
            DuplicatePolicy::AlwaysCreate,
        );

        let record = h
            .service
            .extract(
                &ExtractionRequest::metadata_only(URL_A).with_subtitles(true),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        let summary = h.service.get_subtitles(record.id).await.unwrap();

        assert_eq!(summary.resource_id, record.id);
        assert_eq!(summary.available, vec!["de", "en", "fr"]);
        assert_eq!(summary.downloaded, record.local_subtitle_paths);
        assert_eq!(summary.downloaded.len(), 2);

        let err = h.service.get_subtitles(Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    // ========================================================================
    // CONCURRENCY
    // ========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_runs_are_isolated() {
        let h = harness();
        let cancel = CancellationToken::new();
        let (request_a, request_b) = (full(URL_A), full(URL_B));

        let (a, b) = tokio::join!(
            h.service.extract(&request_a, &cancel),
            h.service.extract(&request_b, &cancel)
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.id, b.id);

        let files_a: HashSet<String> = a
            .local_subtitle_paths
            .iter()
            .cloned()
            .chain(a.local_media_path.clone())
            .collect();
        let files_b: HashSet<String> = b
            .local_subtitle_paths
            .iter()
            .cloned()
            .chain(b.local_media_path.clone())
            .collect();
        assert_eq!(files_a.len(), 4);
        assert_eq!(files_b.len(), 3);
        assert!(files_a.is_disjoint(&files_b));

        assert_eq!(h.service.get_by_id(a.id).await.unwrap(), a);
        assert_eq!(h.service.get_by_id(b.id).await.unwrap(), b);
    }

    // ========================================================================
    // DUPLICATE POLICY
    // ========================================================================

    #[tokio::test]
    async fn test_always_create_makes_a_new_record_each_time() {
        let h = harness();
        let cancel = CancellationToken::new();
        let request = ExtractionRequest::metadata_only(URL_A);

        let first = h.service.extract(&request, &cancel).await.unwrap();
        let second = h.service.extract(&request, &cancel).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(h.service.get_by_id(first.id).await.unwrap(), first);
        assert_eq!(
            h.service.get_by_native_id("aaaaaaaaaaa").await.unwrap().id,
            second.id
        );
    }

    #[tokio::test]
    async fn test_reuse_existing_returns_stored_record() {
        let h = build(
            default_extractor(),
            StubDownloader::new(),
            None,
            DuplicatePolicy::ReuseExisting,
        );
        let cancel = CancellationToken::new();

        let first = h.service.extract(&full(URL_A), &cancel).await.unwrap();
        let calls_after_first = h.downloader.total_calls();
        let second = h.service.extract(&full(URL_A), &cancel).await.unwrap();

        assert_eq!(second, first);
        assert_eq!(h.extractor.calls(), 2);
        assert_eq!(h.downloader.total_calls(), calls_after_first);
        assert_eq!(h.resource_dirs("videos"), 1);
    }
}
