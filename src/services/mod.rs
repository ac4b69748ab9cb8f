//! External collaborators
//!
//! Thin wrappers over the package manager, the release API, systemd-creds,
//! systemctl and the Backrest CLI. Each returns a `SetupResult` so the
//! installer decides what is fatal.

pub mod backrest;
pub mod credentials;
pub mod packages;
pub mod release;
pub mod systemd;

pub use backrest::BackrestCli;
pub use release::{GitHubReleases, Release, ReleaseAsset, ReleaseSource};
