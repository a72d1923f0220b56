// src/extraction/ytdlp.rs
//
// yt-dlp backed Extraction Adapter
//
// `yt-dlp --dump-json <url>` prints one JSON document per resource.
// The URL is not checked for platform; yt-dlp rejects what it cannot handle.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::schema::parse_metadata;
use super::traits::MetadataExtractor;
use crate::config::ToolSettings;
use crate::domain::MetadataDocument;
use crate::error::ExtractionError;
use crate::infrastructure::run_tool;

pub struct YtDlpExtractor {
    settings: ToolSettings,
}

impl YtDlpExtractor {
    pub fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }

    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["--dump-json".to_string(), "--skip-download".to_string()];
        args.extend(self.settings.common_args());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl MetadataExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_metadata(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<MetadataDocument, ExtractionError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ExtractionError::InvalidUrl("URL cannot be empty".to_string()));
        }

        let args = self.build_args(url);
        let output = run_tool(&self.settings.binary, &args, self.settings.timeout(), cancel).await?;

        let document = parse_metadata(&output.stdout, self.settings.include_automatic_captions)?;
        log::info!(
            "[{}] extracted {} ({} subtitle languages)",
            self.name(),
            document.native_id,
            document.available_subtitle_languages.len()
        );
        Ok(document)
    }
}
