//! Install progress record
//!
//! The installer never rolls back, so a failed run can leave the host half
//! configured. After every step the progress so far is written as pretty JSON,
//! which `status` shows and a rerun of `install` simply overwrites.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SetupError, SetupResult};
use crate::models::RemoteType;

/// Install steps, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallStep {
    Packages,
    Directories,
    Architecture,
    Release,
    Credentials,
    Service,
    Registration,
}

impl InstallStep {
    pub const ALL: [InstallStep; 7] = [
        Self::Packages,
        Self::Directories,
        Self::Architecture,
        Self::Release,
        Self::Credentials,
        Self::Service,
        Self::Registration,
    ];
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Packages => write!(f, "Install packages"),
            Self::Directories => write!(f, "Create directories"),
            Self::Architecture => write!(f, "Detect architecture"),
            Self::Release => write!(f, "Download release"),
            Self::Credentials => write!(f, "Write credentials"),
            Self::Service => write!(f, "Configure service"),
            Self::Registration => write!(f, "Register repositories"),
        }
    }
}

/// A step that finished
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: InstallStep,
    pub completed_at: DateTime<Utc>,
}

/// The step that stopped the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedStep {
    pub step: InstallStep,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// How far the last install got
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallProgress {
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    #[serde(default)]
    pub completed: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<FailedStep>,
}

impl InstallProgress {
    /// Start a new run
    pub fn start(remote: Option<RemoteType>) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            remote,
            release: None,
            completed: Vec::new(),
            failed: None,
        }
    }

    pub fn complete(&mut self, step: InstallStep) {
        self.completed.push(StepRecord {
            step,
            completed_at: Utc::now(),
        });
    }

    pub fn fail(&mut self, step: InstallStep, error: &SetupError) {
        self.failed = Some(FailedStep {
            step,
            error: error.to_string(),
            failed_at: Utc::now(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn is_complete(&self) -> bool {
        self.finished_at.is_some() && self.failed.is_none()
    }

    /// When `step` finished, if it did
    pub fn completed_at(&self, step: InstallStep) -> Option<DateTime<Utc>> {
        self.completed
            .iter()
            .find(|r| r.step == step)
            .map(|r| r.completed_at)
    }

    /// The last step that completed
    pub fn last_completed(&self) -> Option<InstallStep> {
        self.completed.last().map(|r| r.step)
    }
}

/// Reads and writes the progress file
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Write `progress`, replacing the previous record
    pub fn save(&self, progress: &InstallProgress) -> SetupResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|e| SetupError::Io(format!("Failed to create state directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(progress)
            .map_err(|e| SetupError::Json(format!("Failed to serialize progress: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, json)
            .map_err(|e| SetupError::Io(format!("Failed to write progress file: {}", e)))?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            SetupError::Io(format!("Failed to replace progress file: {}", e))
        })
    }

    /// Read the last record, if any
    pub fn load(&self) -> SetupResult<Option<InstallProgress>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| SetupError::Io(format!("Failed to read progress file: {}", e)))?;

        let progress = serde_json::from_str(&contents)
            .map_err(|e| SetupError::Json(format!("Failed to parse progress file: {}", e)))?;

        Ok(Some(progress))
    }

    /// Get the path to the progress file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_log() -> (ProgressLog, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let log = ProgressLog::new(temp_dir.path().join("state").join("progress.json"));
        (log, temp_dir)
    }

    #[test]
    fn test_load_missing() {
        let (log, _temp) = create_test_log();
        assert!(log.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let (log, _temp) = create_test_log();

        let mut progress = InstallProgress::start(Some(RemoteType::Webdav));
        progress.complete(InstallStep::Packages);
        progress.complete(InstallStep::Directories);
        progress.fail(
            InstallStep::Architecture,
            &SetupError::UnsupportedArchitecture("mips".into()),
        );
        log.save(&progress).unwrap();

        let loaded = log.load().unwrap().unwrap();
        assert_eq!(loaded.remote, Some(RemoteType::Webdav));
        assert_eq!(loaded.last_completed(), Some(InstallStep::Directories));
        assert!(loaded.completed_at(InstallStep::Packages).is_some());
        assert!(loaded.completed_at(InstallStep::Release).is_none());
        let failed = loaded.failed.unwrap();
        assert_eq!(failed.step, InstallStep::Architecture);
        assert!(failed.error.contains("mips"));
        assert!(loaded.finished_at.is_none());
    }

    #[test]
    fn test_finished_run() {
        let mut progress = InstallProgress::start(None);
        assert!(!progress.is_complete());
        for step in InstallStep::ALL {
            progress.complete(step);
        }
        progress.finish();
        assert!(progress.is_complete());
    }

    #[test]
    fn test_step_serialization() {
        let json = serde_json::to_string(&InstallStep::Registration).unwrap();
        assert_eq!(json, "\"registration\"");
    }
}
