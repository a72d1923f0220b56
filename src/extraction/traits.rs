use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::MetadataDocument;
use crate::error::ExtractionError;

/// Source of normalized metadata for a URL.
///
/// Implementations must honor `cancel` for any external work they start.
#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    async fn extract_metadata(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<MetadataDocument, ExtractionError>;
}
