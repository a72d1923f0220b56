// src/materialization/ytdlp.rs
//
// yt-dlp backed download capability
//
// Video:     yt-dlp -o <dir>/video.%(ext)s <url>
// Subtitles: yt-dlp --skip-download --write-subs --write-auto-subs
//                   --sub-langs <lang> -o <dir>/subtitle.%(ext)s <url>

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::traits::AssetDownloader;
use crate::config::ToolSettings;
use crate::error::MaterializationError;
use crate::infrastructure::run_tool;

pub struct YtDlpDownloader {
    settings: ToolSettings,
}

impl YtDlpDownloader {
    pub fn new(settings: ToolSettings) -> Self {
        Self { settings }
    }

    fn video_args(&self, url: &str, output_template: &Path) -> Vec<String> {
        let mut args = vec![
            "--no-progress".to_string(),
            "-o".to_string(),
            output_template.to_string_lossy().to_string(),
        ];
        args.extend(self.settings.common_args());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    fn subtitle_args(&self, url: &str, language: &str, output_template: &Path) -> Vec<String> {
        let mut args = vec![
            "--skip-download".to_string(),
            "--write-subs".to_string(),
            "--write-auto-subs".to_string(),
            "--sub-langs".to_string(),
            language.to_string(),
            "--sub-format".to_string(),
            "vtt/best".to_string(),
            "-o".to_string(),
            output_template.to_string_lossy().to_string(),
        ];
        args.extend(self.settings.common_args());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl AssetDownloader for YtDlpDownloader {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn download_video(
        &self,
        url: &str,
        output_template: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), MaterializationError> {
        let args = self.video_args(url, output_template);
        run_tool(&self.settings.binary, &args, self.settings.timeout(), cancel).await?;
        Ok(())
    }

    async fn download_subtitle(
        &self,
        url: &str,
        language: &str,
        output_template: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), MaterializationError> {
        let args = self.subtitle_args(url, language, output_template);
        run_tool(&self.settings.binary, &args, self.settings.timeout(), cancel).await?;
        Ok(())
    }
}
