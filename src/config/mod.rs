//! Configuration module for backrest-setup
//!
//! This module provides configuration management including:
//! - Fixed install, unit, credential and data paths
//! - Optional installer settings file

pub mod paths;
pub mod settings;

pub use paths::{InstallPaths, SERVICE_NAME};
pub use settings::Settings;
