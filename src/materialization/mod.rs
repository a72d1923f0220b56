// src/materialization/mod.rs
//
// Asset Materializer
//
// Downloads binary assets (video, subtitles) into per-resource directories.
//
// CRITICAL RULES:
// - Video failure is fatal to the caller
// - Subtitle failure is per language and never fatal
// - Output location is derived from the resource id, never shared

pub mod materializer;
pub mod traits;
pub mod ytdlp;

pub use materializer::{AssetHandle, AssetMaterializer, SubtitleAsset};
pub use traits::AssetDownloader;
pub use ytdlp::YtDlpDownloader;
