// src/infrastructure/asset_storage.rs
//
// On-disk layout for materialized assets
//
// CRITICAL RULES:
// - Every resource gets its own directory per asset kind
// - Every subtitle language gets its own directory inside that
// - Nothing is ever written outside the configured root
// - The produced file is picked deterministically (lexicographic order)
//
// Layout:
//   {root}/{platform}/videos/{resource_id}/video.<ext>
//   {root}/{platform}/subtitles/{resource_id}/{lang}/subtitle.<lang>.<ext>

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::MaterializationError;

static SAFE_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,34}$").expect("segment pattern is valid")
});

/// File suffixes yt-dlp leaves behind for interrupted or in-progress downloads.
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

/// Post-processing scratch files are named `<stem>.temp.<ext>`.
const TEMP_INFIX: &str = ".temp.";

fn is_partial(name: &str) -> bool {
    name.contains(TEMP_INFIX) || PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Kind of asset, which decides the top-level partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Video,
    Subtitle,
}

impl AssetKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetKind::Video => "videos",
            AssetKind::Subtitle => "subtitles",
        }
    }
}

/// Returns true if `segment` (a language tag or platform name) can safely be
/// used as a single path component.
pub fn is_safe_segment(segment: &str) -> bool {
    SAFE_SEGMENT.is_match(segment)
}

#[derive(Debug, Clone)]
pub struct AssetStorage {
    root: PathBuf,
    platform: String,
}

impl AssetStorage {
    pub fn new(root: impl Into<PathBuf>, platform: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            platform: platform.into(),
        }
    }

    /// Directory holding every asset of `kind` for one resource.
    pub fn resource_dir(&self, kind: AssetKind, resource_id: Uuid) -> PathBuf {
        self.root
            .join(&self.platform)
            .join(kind.dir_name())
            .join(resource_id.to_string())
    }

    /// Create (or reuse) the video directory for a resource.
    pub fn prepare_video_dir(&self, resource_id: Uuid) -> Result<PathBuf, MaterializationError> {
        let dir = self.resource_dir(AssetKind::Video, resource_id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Create (or reuse) the directory for one subtitle language of a resource.
    pub fn prepare_subtitle_dir(
        &self,
        resource_id: Uuid,
        language: &str,
    ) -> Result<PathBuf, MaterializationError> {
        if !is_safe_segment(language) {
            return Err(MaterializationError::InvalidLanguage(language.to_string()));
        }

        let dir = self
            .resource_dir(AssetKind::Subtitle, resource_id)
            .join(language);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Pick the file an external download produced in `dir`.
    ///
    /// Returns the lexicographically first regular file, ignoring partial
    /// download leftovers. An empty directory is `NoOutputProduced`.
    pub fn locate_output(&self, dir: &Path) -> Result<PathBuf, MaterializationError> {
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if is_partial(&name) {
                continue;
            }

            return Ok(entry.into_path());
        }

        Err(MaterializationError::NoOutputProduced(dir.to_path_buf()))
    }

    /// Remove every asset directory of a resource.
    ///
    /// Missing directories are not an error. Refuses to touch anything
    /// outside the storage root.
    pub fn discard(&self, resource_id: Uuid) -> std::io::Result<()> {
        for kind in [AssetKind::Video, AssetKind::Subtitle] {
            let dir = self.resource_dir(kind, resource_id);
            if !dir.starts_with(&self.root) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{} is outside the storage root", dir.display()),
                ));
            }
            if dir.exists() {
                fs::remove_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}
