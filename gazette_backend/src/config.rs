use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GazetteConfig {
    pub api_port: u16,
    pub paths: GazettePaths,
    pub feed: FeedConfig,
    pub upload: UploadConfig,
}

impl GazetteConfig {
    pub fn from_env() -> Result<Self> {
        let paths = GazettePaths::discover()?;
        let api_port = env::var("GAZETTE_API_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8080);
        Ok(Self {
            api_port,
            paths,
            feed: FeedConfig::from_env(),
            upload: UploadConfig::from_env(),
        })
    }

    pub fn new(api_port: u16, paths: GazettePaths) -> Self {
        Self {
            api_port,
            paths,
            feed: FeedConfig::default(),
            upload: UploadConfig::default(),
        }
    }

    pub fn with_feed(api_port: u16, paths: GazettePaths, feed: FeedConfig) -> Self {
        Self {
            api_port,
            paths,
            feed,
            upload: UploadConfig::default(),
        }
    }
}

/// Pagination and home-feed caching knobs. The page size is process
/// configuration, never a mutable global.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub page_size: usize,
    pub index_cache_ttl: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            index_cache_ttl: Duration::from_secs(20),
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let page_size = env::var("GAZETTE_PAGE_SIZE")
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.page_size);
        let index_cache_ttl = env::var("GAZETTE_INDEX_CACHE_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.index_cache_ttl);
        Self {
            page_size,
            index_cache_ttl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_upload_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Self {
        let max_upload_bytes = env::var("GAZETTE_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or_else(|| Self::default().max_upload_bytes);
        Self { max_upload_bytes }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GazettePaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub uploads_dir: PathBuf,
}

impl GazettePaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let db_path = data_dir.join("gazette.db");
        let uploads_dir = base.join("uploads");
        Ok(Self {
            base,
            data_dir,
            db_path,
            uploads_dir,
        })
    }
}
