// src/config.rs
//
// Pipeline configuration
//
// PRINCIPLES:
// - One explicit value, handed to constructors
// - Business logic never reads the process environment
// - Every field has a usable default

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::infrastructure::is_safe_segment;

const APP_DIR: &str = "media-harvester";

/// What to do when an extraction yields a native id that is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Every extraction creates a new record with a new id
    #[default]
    AlwaysCreate,
    /// Return the stored record and skip materialization
    ReuseExisting,
}

/// Settings for the external extraction/download tool (yt-dlp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Executable name or absolute path
    pub binary: String,
    /// Wall-clock limit for a single invocation
    pub timeout_seconds: u64,
    /// Passed as --socket-timeout
    pub socket_timeout_seconds: Option<u32>,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
    /// Netscape cookies.txt
    pub cookies_path: Option<PathBuf>,
    /// Also list automatic captions as available languages
    pub include_automatic_captions: bool,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            timeout_seconds: 600,
            socket_timeout_seconds: None,
            proxy: None,
            cookies_path: None,
            include_automatic_captions: false,
        }
    }
}

impl ToolSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Arguments shared by every invocation (network options).
    pub fn common_args(&self) -> Vec<String> {
        let mut args = vec!["--no-playlist".to_string(), "--no-warnings".to_string()];

        if let Some(secs) = self.socket_timeout_seconds {
            args.push("--socket-timeout".to_string());
            args.push(secs.to_string());
        }
        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }
        if let Some(cookies) = &self.cookies_path {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().to_string());
        }

        args
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvesterConfig {
    /// Storage partition name, e.g. "youtube"
    pub platform: String,
    pub storage_root: PathBuf,
    pub database_path: PathBuf,
    pub pool_size: u32,
    /// Upper bound on concurrent subtitle downloads per request
    pub subtitle_concurrency: usize,
    pub duplicate_policy: DuplicatePolicy,
    pub tool: ToolSettings,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            platform: "youtube".to_string(),
            storage_root: data_dir.join("storage"),
            database_path: data_dir.join(format!("{}.db", APP_DIR)),
            pool_size: 8,
            subtitle_concurrency: 4,
            duplicate_policy: DuplicatePolicy::AlwaysCreate,
            tool: ToolSettings::default(),
        }
    }
}

impl HarvesterConfig {
    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn with_subtitle_concurrency(mut self, limit: usize) -> Self {
        self.subtitle_concurrency = limit;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_tool(mut self, tool: ToolSettings) -> Self {
        self.tool = tool;
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        // The platform becomes a directory name
        if !is_safe_segment(&self.platform) {
            return Err(AppError::Config(format!(
                "platform {:?} is not a valid directory name",
                self.platform
            )));
        }
        if self.tool.binary.trim().is_empty() {
            return Err(AppError::Config("tool binary cannot be empty".to_string()));
        }
        if self.tool.timeout_seconds == 0 {
            return Err(AppError::Config("tool timeout must be positive".to_string()));
        }
        if self.subtitle_concurrency == 0 {
            return Err(AppError::Config(
                "subtitle concurrency must be at least 1".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(AppError::Config("pool size must be at least 1".to_string()));
        }
        Ok(())
    }
}
