/// Client settings
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/painter-sync/settings.json
/// - macOS: ~/Library/Application Support/painter-sync/settings.json
/// - Windows: %APPDATA%\painter-sync\settings.json
///
/// Every field has a default, so older or hand-edited files still load.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::files;
use crate::protocol::SegmentationFormat;
use crate::sync::SyncDir;
use crate::watch::poller::{DEFAULT_POLL_INTERVAL, DEFAULT_STALL_AFTER};

const APP_DIR: &str = "painter-sync";
const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_SYNC_DIR: &str = "painter_sync";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Root of the directory shared with the worker
    #[serde(default = "default_sync_dir")]
    pub sync_dir: PathBuf,
    /// Milliseconds between directory scans while watching the worker
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Consecutive failed scans before progress is shown as stalled
    #[serde(default = "default_stall_after")]
    pub stall_after: u32,
    /// Output encoding preselected for folder segmentation
    #[serde(default)]
    pub segmentation_format: SegmentationFormat,
}

// Default value functions
fn default_sync_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_SYNC_DIR)
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_stall_after() -> u32 {
    DEFAULT_STALL_AFTER
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sync_dir: default_sync_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            stall_after: default_stall_after(),
            segmentation_format: SegmentationFormat::default(),
        }
    }
}

impl Settings {
    /// Where settings live unless the caller picks another file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings, falling back to defaults when the file is missing.
    /// A malformed file is still an error so it is not silently replaced.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_vec_pretty(self)
            .map_err(|err| write_err(io::Error::new(io::ErrorKind::InvalidData, err)))?;
        files::atomic_write(path, &json).map_err(write_err)
    }

    pub fn sync(&self) -> SyncDir {
        SyncDir::new(&self.sync_dir)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
