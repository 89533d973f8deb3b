use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Size of each body chunk handed to the writer (curl receive buffer).
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Configuration loaded from `~/.config/drivedl/config.toml`.
///
/// Every field is optional in the file; missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Endpoint for the first request (`?export=download&id=<ID>` is appended).
    pub download_url: String,
    /// Endpoint used when the interstitial page carries an HTML confirmation form.
    pub confirm_url: String,
    /// Receive buffer / write chunk size in bytes.
    pub chunk_size: usize,
    /// TCP + TLS connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Abort when the transfer stays below this many bytes/sec ...
    pub low_speed_limit_bytes: u32,
    /// ... for this many seconds.
    pub low_speed_time_secs: u64,
    /// Maximum redirects followed per request.
    pub max_redirections: u32,
    pub user_agent: String,
    /// Bytes of a non-file response (interstitial or error page) kept in memory.
    pub interstitial_limit_bytes: usize,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            download_url: "https://drive.google.com/uc".to_string(),
            confirm_url: "https://drive.usercontent.google.com/download".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            connect_timeout_secs: 30,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            max_redirections: 10,
            user_agent: concat!("drivedl/", env!("CARGO_PKG_VERSION")).to_string(),
            interstitial_limit_bytes: 1024 * 1024,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("drivedl")?;
    Ok(xdg_dirs.get_config_home().join("drivedl").join("config.toml"))
}

/// Load configuration from the default location, falling back to defaults
/// when no file exists. Nothing is written to disk.
pub fn load() -> Result<DriveConfig> {
    let path = config_path()?;
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(DriveConfig::default());
    }
    load_from(&path)
}

/// Load configuration from an explicit path (must exist).
pub fn load_from(path: &Path) -> Result<DriveConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: DriveConfig = toml::from_str(&data)
        .with_context(|| format!("invalid config {}", path.display()))?;
    if cfg.chunk_size == 0 {
        anyhow::bail!("invalid config {}: chunk_size must be > 0", path.display());
    }
    tracing::info!("loaded config from {}", path.display());
    Ok(cfg)
}
