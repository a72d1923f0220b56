// src/testing.rs
//
// Test doubles for the external capabilities.
//
// StubExtractor returns canned documents by URL.
// StubDownloader writes small files where yt-dlp would.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::MetadataDocument;
use crate::error::{ExtractionError, MaterializationError};
use crate::extraction::MetadataExtractor;
use crate::materialization::AssetDownloader;

// ============================================================================
// EXTRACTOR
// ============================================================================

#[derive(Default)]
pub struct StubExtractor {
    documents: Mutex<HashMap<String, MetadataDocument>>,
    calls: AtomicUsize,
}

impl StubExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, url: &str, document: MetadataDocument) -> Self {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), document);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataExtractor for StubExtractor {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn extract_metadata(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<MetadataDocument, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(ExtractionError::Cancelled);
        }
        self.documents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ExtractionError::ToolFailure(format!("unsupported URL: {}", url)))
    }
}

// ============================================================================
// DOWNLOADER
// ============================================================================

#[derive(Default)]
pub struct StubDownloader {
    fail_video: bool,
    produce_nothing: bool,
    hang_subtitles: bool,
    failing_languages: HashSet<String>,
    video_calls: AtomicUsize,
    subtitle_calls: AtomicUsize,
    written: Mutex<Vec<PathBuf>>,
}

impl StubDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_video(mut self) -> Self {
        self.fail_video = true;
        self
    }

    /// Report success without writing anything.
    pub fn producing_nothing(mut self) -> Self {
        self.produce_nothing = true;
        self
    }

    /// Subtitle downloads leave a partial file and block until cancelled.
    pub fn hanging_subtitles(mut self) -> Self {
        self.hang_subtitles = true;
        self
    }

    pub fn failing_languages(mut self, languages: &[&str]) -> Self {
        self.failing_languages = languages.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn video_calls(&self) -> usize {
        self.video_calls.load(Ordering::SeqCst)
    }

    pub fn subtitle_calls(&self) -> usize {
        self.subtitle_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.video_calls() + self.subtitle_calls()
    }

    /// Every file written so far.
    pub fn written(&self) -> Vec<PathBuf> {
        self.written.lock().unwrap().clone()
    }

    fn write(&self, output_template: &Path, ext: &str, body: &str) -> Result<(), MaterializationError> {
        if self.produce_nothing {
            return Ok(());
        }
        let path = PathBuf::from(output_template.to_string_lossy().replace("%(ext)s", ext));
        std::fs::write(&path, body)?;
        self.written.lock().unwrap().push(path);
        Ok(())
    }
}

#[async_trait]
impl AssetDownloader for StubDownloader {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn download_video(
        &self,
        url: &str,
        output_template: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), MaterializationError> {
        self.video_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(MaterializationError::Cancelled);
        }
        if self.fail_video {
            return Err(MaterializationError::ToolFailure(format!(
                "video unavailable: {}",
                url
            )));
        }
        self.write(output_template, "mp4", url)
    }

    async fn download_subtitle(
        &self,
        url: &str,
        language: &str,
        output_template: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), MaterializationError> {
        self.subtitle_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(MaterializationError::Cancelled);
        }
        if self.failing_languages.contains(language) {
            return Err(MaterializationError::ToolFailure(format!(
                "no {} subtitles",
                language
            )));
        }
        if self.hang_subtitles {
            self.write(output_template, &format!("{}.vtt.part", language), "WEBVTT\n")?;
            cancel.cancelled().await;
            return Err(MaterializationError::Cancelled);
        }
        self.write(
            output_template,
            &format!("{}.vtt", language),
            &format!("WEBVTT\n\n{} {}\n", url, language),
        )
    }
}
