//! Host CPU architecture, as named by release assets

use std::fmt;

use crate::error::{SetupError, SetupResult};

/// Architectures with a prebuilt Backrest release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86_64,
    Arm64,
    Armv7,
}

impl Architecture {
    /// Map `uname -m` output to a release architecture
    pub fn from_machine(machine: &str) -> SetupResult<Self> {
        match machine.trim() {
            "x86_64" => Ok(Self::X86_64),
            "aarch64" | "arm64" => Ok(Self::Arm64),
            "armv7l" => Ok(Self::Armv7),
            other => Err(SetupError::UnsupportedArchitecture(other.to_string())),
        }
    }

    /// Label used in release asset names
    pub fn asset_tag(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
            Self::Armv7 => "armv7",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.asset_tag())
    }
}
