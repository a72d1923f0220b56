// src/materialization/materializer.rs
//
// AssetMaterializer - drives a downloader into the per-resource layout
//
// PRINCIPLES:
// - Video: one attempt, any failure is returned
// - Subtitles: one attempt per language, failures are logged and dropped
// - Subtitle languages run concurrently, bounded by a semaphore
// - Results are sorted by language regardless of completion order

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::traits::AssetDownloader;
use crate::error::MaterializationError;
use crate::infrastructure::AssetStorage;

const VIDEO_TEMPLATE: &str = "video.%(ext)s";
const SUBTITLE_TEMPLATE: &str = "subtitle.%(ext)s";

/// A file produced by a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetHandle {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl AssetHandle {
    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtitleAsset {
    pub language: String,
    pub handle: AssetHandle,
}

pub struct AssetMaterializer {
    downloader: Arc<dyn AssetDownloader>,
    storage: AssetStorage,
    subtitle_concurrency: usize,
}

impl AssetMaterializer {
    pub fn new(
        downloader: Arc<dyn AssetDownloader>,
        storage: AssetStorage,
        subtitle_concurrency: usize,
    ) -> Self {
        Self {
            downloader,
            storage,
            subtitle_concurrency: subtitle_concurrency.max(1),
        }
    }

    /// Download the video for `resource_id` and return the produced file.
    pub async fn materialize_video(
        &self,
        url: &str,
        resource_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<AssetHandle, MaterializationError> {
        let dir = self.storage.prepare_video_dir(resource_id)?;

        self.downloader
            .download_video(url, &dir.join(VIDEO_TEMPLATE), cancel)
            .await?;

        let handle = locate_handle(&self.storage, &dir).await?;
        log::info!(
            "[materializer] video for {} at {} ({} bytes)",
            resource_id,
            handle.path.display(),
            handle.size_bytes
        );
        Ok(handle)
    }

    /// Download each requested subtitle language.
    ///
    /// Languages that fail are omitted from the result; the call itself
    /// never fails. An empty request returns immediately.
    pub async fn materialize_subtitles(
        &self,
        url: &str,
        resource_id: Uuid,
        languages: &[String],
        cancel: &CancellationToken,
    ) -> Vec<SubtitleAsset> {
        let wanted: BTreeSet<&str> = languages.iter().map(String::as_str).collect();
        if wanted.is_empty() {
            return Vec::new();
        }

        let permits = Arc::new(Semaphore::new(self.subtitle_concurrency));
        let mut tasks = JoinSet::new();

        for language in wanted {
            let downloader = Arc::clone(&self.downloader);
            let storage = self.storage.clone();
            let permits = Arc::clone(&permits);
            let cancel = cancel.clone();
            let url = url.to_string();
            let language = language.to_string();

            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => {
                        fetch_subtitle(
                            downloader.as_ref(),
                            &storage,
                            &url,
                            resource_id,
                            &language,
                            &cancel,
                        )
                        .await
                    }
                    Err(_) => Err(MaterializationError::Cancelled),
                };
                (language, result)
            });
        }

        let mut produced = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((language, Ok(handle))) => produced.push(SubtitleAsset { language, handle }),
                Ok((language, Err(e))) => {
                    log::warn!(
                        "[materializer] subtitle {} for {} skipped: {}",
                        language,
                        resource_id,
                        e
                    );
                }
                Err(e) => {
                    log::warn!("[materializer] subtitle task for {} failed: {}", resource_id, e);
                }
            }
        }

        produced.sort_by(|a, b| a.language.cmp(&b.language));
        produced
    }

    /// Best-effort removal of everything written for `resource_id`.
    pub async fn discard(&self, resource_id: Uuid) {
        let storage = self.storage.clone();
        match tokio::task::spawn_blocking(move || storage.discard(resource_id)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::warn!("[materializer] could not discard assets of {}: {}", resource_id, e);
            }
            Err(e) => {
                log::warn!("[materializer] discard task for {} failed: {}", resource_id, e);
            }
        }
    }
}

async fn fetch_subtitle(
    downloader: &dyn AssetDownloader,
    storage: &AssetStorage,
    url: &str,
    resource_id: Uuid,
    language: &str,
    cancel: &CancellationToken,
) -> Result<AssetHandle, MaterializationError> {
    let dir = storage.prepare_subtitle_dir(resource_id, language)?;
    downloader
        .download_subtitle(url, language, &dir.join(SUBTITLE_TEMPLATE), cancel)
        .await?;
    locate_handle(storage, &dir).await
}

async fn locate_handle(
    storage: &AssetStorage,
    dir: &Path,
) -> Result<AssetHandle, MaterializationError> {
    let path = storage.locate_output(dir)?;
    let size_bytes = tokio::fs::metadata(&path).await?.len();
    Ok(AssetHandle { path, size_bytes })
}
