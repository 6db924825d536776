//! Catalog settings, read from an optional TOML file.
//!
//! Command-line flags and environment variables override these; see the
//! `catalog` binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::featured::FeaturedConfig;
use crate::videos::DEFAULT_VIDEO_LIMIT;

/// Character document inside the data directory.
pub const DATA_FILE: &str = "data.json";
/// Video document inside the data directory.
pub const VIDEOS_FILE: &str = "videos.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub data_dir: PathBuf,
    /// Root the `assets/...` paths are relative to. Enables the asset inventory.
    pub assets_dir: Option<PathBuf>,
    pub featured: FeaturedConfig,
    pub videos: VideoConfig,
    pub search: SearchConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            data_dir: PathBuf::from("data"),
            assets_dir: None,
            featured: FeaturedConfig::default(),
            videos: VideoConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub limit: usize,
}

impl Default for VideoConfig {
    fn default() -> Self {
        VideoConfig {
            limit: DEFAULT_VIDEO_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig { debounce_ms: 300 }
    }
}

impl CatalogConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.featured.target_count == 0 {
            return Err(CatalogError::Config(
                "featured.target_count must be at least 1".into(),
            ));
        }
        if self.videos.limit == 0 {
            return Err(CatalogError::Config("videos.limit must be at least 1".into()));
        }
        Ok(())
    }

    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join(DATA_FILE)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }
}
