//! Path management for backrest-setup
//!
//! Every file or directory the installer creates, writes or removes is
//! resolved here.
//!
//! ## Path Resolution
//!
//! - Home-relative paths (source data, repositories, Backrest's own config)
//!   use `BACKREST_SETUP_HOME` if set, otherwise the user's home directory.
//! - System paths (`/opt`, `/etc`, `/var/lib`) sit under a root prefix, `/`
//!   outside of tests.

use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::SetupError;

/// Name of the managed systemd service
pub const SERVICE_NAME: &str = "backrest";

/// Manages all paths used by backrest-setup
#[derive(Debug, Clone)]
pub struct InstallPaths {
    /// Home directory the data and repository paths hang off
    home: PathBuf,
    /// Prefix for system paths
    root: PathBuf,
}

impl InstallPaths {
    /// Create a new InstallPaths instance rooted at `/`
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, SetupError> {
        let home = if let Ok(custom) = std::env::var("BACKREST_SETUP_HOME") {
            PathBuf::from(custom)
        } else {
            BaseDirs::new()
                .map(|dirs| dirs.home_dir().to_path_buf())
                .ok_or_else(|| SetupError::Config("Could not determine home directory".into()))?
        };

        Ok(Self {
            home,
            root: PathBuf::from("/"),
        })
    }

    /// Create InstallPaths with custom home and root (useful for testing)
    pub fn with_roots(home: PathBuf, root: PathBuf) -> Self {
        Self { home, root }
    }

    fn system(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    /// Directory holding everything Backrest backs up (~/backrest/source)
    pub fn source_dir(&self) -> PathBuf {
        self.home.join("backrest").join("source")
    }

    /// Local repository (~/backrest/repos/local)
    pub fn local_repo_dir(&self) -> PathBuf {
        self.home.join("backrest").join("repos").join("local")
    }

    /// Mount point for the remote share (~/backrest/repos/remote)
    pub fn remote_mount_dir(&self) -> PathBuf {
        self.home.join("backrest").join("repos").join("remote")
    }

    /// Backrest's own configuration store (~/.config/backrest)
    pub fn user_config_dir(&self) -> PathBuf {
        self.home.join(".config").join(SERVICE_NAME)
    }

    /// Release install directory (/opt/backrest)
    pub fn install_dir(&self) -> PathBuf {
        self.system("opt").join(SERVICE_NAME)
    }

    /// The installed Backrest binary
    pub fn backrest_binary(&self) -> PathBuf {
        self.install_dir().join("backrest")
    }

    /// Unit file written by Backrest's bundled installer
    pub fn unit_file(&self) -> PathBuf {
        self.system("etc/systemd/system")
            .join(format!("{}.service", SERVICE_NAME))
    }

    /// Override directory (backrest.service.d)
    pub fn override_dir(&self) -> PathBuf {
        self.system("etc/systemd/system")
            .join(format!("{}.service.d", SERVICE_NAME))
    }

    /// Override file inside the override directory
    pub fn override_file(&self) -> PathBuf {
        self.override_dir().join("override.conf")
    }

    /// Encrypted credentials directory (/etc/backrest/credentials)
    pub fn credentials_dir(&self) -> PathBuf {
        self.system("etc").join(SERVICE_NAME).join("credentials")
    }

    /// Path of one encrypted credential file
    pub fn credential_file(&self, name: &str) -> PathBuf {
        self.credentials_dir().join(format!("{}.cred", name))
    }

    /// Default location of the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.system("etc/backrest-setup").join("config.json")
    }

    /// Directory for the install progress record
    pub fn state_dir(&self) -> PathBuf {
        self.system("var/lib/backrest-setup")
    }

    /// Install progress record
    pub fn progress_file(&self) -> PathBuf {
        self.state_dir().join("progress.json")
    }

    /// Ensure the data directories exist
    ///
    /// Creates the source and local repository directories, plus the remote
    /// mount point when `with_remote` is set. Existing directories are left
    /// alone.
    pub fn ensure_directories(&self, with_remote: bool) -> Result<(), SetupError> {
        std::fs::create_dir_all(self.source_dir())
            .map_err(|e| SetupError::io("Failed to create source directory", e))?;

        std::fs::create_dir_all(self.local_repo_dir())
            .map_err(|e| SetupError::io("Failed to create local repository directory", e))?;

        if with_remote {
            std::fs::create_dir_all(self.remote_mount_dir())
                .map_err(|e| SetupError::io("Failed to create remote mount directory", e))?;
        }

        Ok(())
    }
}
