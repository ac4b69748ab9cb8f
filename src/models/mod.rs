//! Core data models for backrest-setup
//!
//! The installer owns no durable data; these types describe validated
//! command-line input and host facts.

pub mod arch;
pub mod remote;

pub use arch::Architecture;
pub use remote::{RemoteConfig, RemoteSecrets, RemoteTarget, RemoteType};
