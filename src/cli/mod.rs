//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the installer and services.

pub mod install;
pub mod status;
pub mod uninstall;

pub use install::{handle_install_command, InstallArgs};
pub use status::handle_status_command;
pub use uninstall::{handle_uninstall_command, UninstallSummary};
