//! backrest-setup - install, inspect and remove a Backrest backup service
//!
//! This library provides the installer behind the `backrest-setup` binary.
//! It installs OS packages, downloads the Backrest release matching the host
//! CPU, writes encrypted credentials and a systemd override, and registers
//! repositories and backup plans through Backrest's own CLI.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Fixed paths and installer settings
//! - `error`: Custom error types
//! - `models`: Remote storage and architecture types
//! - `exec`: External command runner
//! - `services`: Package manager, release, credential, systemd and Backrest wrappers
//! - `install`: Step sequencer and progress record
//! - `cli`: Command handlers
//! - `secret`: Zeroizing secret strings
//!
//! # Example
//!
//! ```rust,ignore
//! use backrest_setup::config::{InstallPaths, Settings};
//! use backrest_setup::exec::SystemRunner;
//! use backrest_setup::install::Installer;
//! use backrest_setup::services::GitHubReleases;
//!
//! let paths = InstallPaths::new()?;
//! let settings = Settings::default();
//! let releases = GitHubReleases::new(&settings.release_api_url)?;
//! let mut runner = SystemRunner::new();
//! Installer::new(&paths, &settings, &mut runner, &releases).run(None)?;
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod install;
pub mod models;
pub mod secret;
pub mod services;

pub use error::{SetupError, SetupResult};
