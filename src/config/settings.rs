//! Installer settings for backrest-setup
//!
//! Tunables for the generated override and backup plans: listen address,
//! niceness, schedules and retention counts. Every field has a default, so a
//! missing or partial settings file is fine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::paths::InstallPaths;
use crate::error::SetupError;

/// Release metadata endpoint for the latest Backrest release
pub const DEFAULT_RELEASE_API_URL: &str =
    "https://api.github.com/repos/garethgeorge/backrest/releases/latest";

/// Installer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Address Backrest listens on (BACKREST_PORT)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Niceness of the Backrest service
    #[serde(default = "default_nice")]
    pub nice: i32,

    /// Snapshots kept by the hourly local plan
    #[serde(default = "default_hourly_retention")]
    pub hourly_retention: u32,

    /// Snapshots kept by the daily remote plan
    #[serde(default = "default_daily_retention")]
    pub daily_retention: u32,

    /// Cron expression for the local plan
    #[serde(default = "default_hourly_schedule")]
    pub hourly_schedule: String,

    /// Cron expression for the remote plan
    #[serde(default = "default_daily_schedule")]
    pub daily_schedule: String,

    /// Seconds to wait after restarting the service
    #[serde(default = "default_startup_wait_secs")]
    pub startup_wait_secs: u64,

    /// Latest-release metadata URL
    #[serde(default = "default_release_api_url")]
    pub release_api_url: String,

    /// Packages installed regardless of remote type
    #[serde(default = "default_base_packages")]
    pub base_packages: Vec<String>,
}

fn default_listen_address() -> String {
    "0.0.0.0:9898".to_string()
}

fn default_nice() -> i32 {
    10
}

fn default_hourly_retention() -> u32 {
    24
}

fn default_daily_retention() -> u32 {
    7
}

fn default_hourly_schedule() -> String {
    "0 * * * *".to_string()
}

fn default_daily_schedule() -> String {
    "0 3 * * *".to_string()
}

fn default_startup_wait_secs() -> u64 {
    5
}

fn default_release_api_url() -> String {
    DEFAULT_RELEASE_API_URL.to_string()
}

fn default_base_packages() -> Vec<String> {
    ["ca-certificates", "util-linux", "fuse3"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            nice: default_nice(),
            hourly_retention: default_hourly_retention(),
            daily_retention: default_daily_retention(),
            hourly_schedule: default_hourly_schedule(),
            daily_schedule: default_daily_schedule(),
            startup_wait_secs: default_startup_wait_secs(),
            release_api_url: default_release_api_url(),
            base_packages: default_base_packages(),
        }
    }
}

impl Settings {
    /// Resolve which settings file to read
    ///
    /// 1. explicit `--config` path
    /// 2. `BACKREST_SETUP_CONFIG` env var
    /// 3. `/etc/backrest-setup/config.json`
    pub fn resolve_path(explicit: Option<&Path>, paths: &InstallPaths) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(custom) = std::env::var("BACKREST_SETUP_CONFIG") {
            return PathBuf::from(custom);
        }
        paths.settings_file()
    }

    /// Load settings from disk, or use defaults if the file doesn't exist
    pub fn load_or_default(path: &Path) -> Result<Self, SetupError> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| SetupError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
            SetupError::Config(format!("Failed to parse settings file: {}", e))
        })?;

        Ok(settings)
    }

    /// Port part of the listen address, used to filter `ss` output
    pub fn listen_port(&self) -> Option<&str> {
        self.listen_address
            .rsplit_once(':')
            .map(|(_, port)| port)
            .filter(|port| !port.is_empty())
    }
}
