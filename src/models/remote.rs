//! Remote storage model
//!
//! A remote share (CIFS or WebDAV) mounted before each remote backup and
//! unmounted after it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SetupError, SetupResult};
use crate::secret::SecretString;

/// Kind of remote share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteType {
    /// SMB/CIFS share, mounted with mount.cifs
    Cifs,
    /// WebDAV endpoint, mounted with davfs2
    Webdav,
}

impl RemoteType {
    /// Parse remote type from its command-line spelling
    pub fn parse(s: &str) -> SetupResult<Self> {
        match s {
            "cifs" => Ok(Self::Cifs),
            "webdav" => Ok(Self::Webdav),
            other => Err(SetupError::UnsupportedRemoteType(other.to_string())),
        }
    }

    /// Package providing the mount helper
    pub fn package(&self) -> &'static str {
        match self {
            Self::Cifs => "cifs-utils",
            Self::Webdav => "davfs2",
        }
    }

    /// Filesystem type passed to `mount -t`
    pub fn fs_type(&self) -> &'static str {
        match self {
            Self::Cifs => "cifs",
            Self::Webdav => "davfs",
        }
    }
}

impl fmt::Display for RemoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cifs => write!(f, "cifs"),
            Self::Webdav => write!(f, "webdav"),
        }
    }
}

/// Where the remote share lives, without its credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub kind: RemoteType,
    /// `//server/share` for CIFS, an https URL for WebDAV
    pub path: String,
}

/// Remote login and password, zeroed on drop
#[derive(Debug)]
pub struct RemoteSecrets {
    pub login: SecretString,
    pub password: SecretString,
}

/// Fully validated remote storage configuration
#[derive(Debug)]
pub struct RemoteConfig {
    pub target: RemoteTarget,
    pub secrets: RemoteSecrets,
}

impl RemoteConfig {
    /// Validate the four `--remote-*` flags
    ///
    /// Returns `Ok(None)` when none of them is set. If any is set, all four
    /// must be; the type is checked only once the set is complete.
    pub fn from_flags(
        kind: Option<String>,
        path: Option<String>,
        login: Option<String>,
        password: Option<String>,
    ) -> SetupResult<Option<Self>> {
        let mut missing = Vec::new();
        if kind.is_none() {
            missing.push("--remote-type");
        }
        if path.is_none() {
            missing.push("--remote-path");
        }
        if login.is_none() {
            missing.push("--remote-login");
        }
        if password.is_none() {
            missing.push("--remote-password");
        }

        match (kind, path, login, password) {
            (None, None, None, None) => Ok(None),
            (Some(kind), Some(path), Some(login), Some(password)) => {
                let kind = RemoteType::parse(&kind)?;
                Ok(Some(Self {
                    target: RemoteTarget { kind, path },
                    secrets: RemoteSecrets {
                        login: login.into(),
                        password: password.into(),
                    },
                }))
            }
            _ => Err(SetupError::IncompleteRemoteConfig { missing }),
        }
    }

    /// Split into the part that stays in memory and the secrets, so the
    /// secrets can be dropped as soon as they are written out
    pub fn into_parts(self) -> (RemoteTarget, RemoteSecrets) {
        (self.target, self.secrets)
    }
}
