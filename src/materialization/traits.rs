use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::MaterializationError;

/// External download capability.
///
/// `output_template` is a yt-dlp style path template (`.../video.%(ext)s`);
/// the downloader writes into its parent directory and the materializer
/// locates the produced file afterwards.
#[async_trait]
pub trait AssetDownloader: Send + Sync {
    /// Name of the downloader (for logging)
    fn name(&self) -> &'static str;

    async fn download_video(
        &self,
        url: &str,
        output_template: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), MaterializationError>;

    async fn download_subtitle(
        &self,
        url: &str,
        language: &str,
        output_template: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), MaterializationError>;
}
