//! Install CLI command
//!
//! Validates the remote storage flags, then hands over to the step
//! sequencer.

use clap::Args;

use crate::config::{InstallPaths, Settings};
use crate::error::SetupResult;
use crate::exec::CommandRunner;
use crate::install::{InstallReport, Installer};
use crate::models::RemoteConfig;
use crate::services::ReleaseSource;

/// Remote storage options for `install`
///
/// Either none or all four must be given.
#[derive(Args, Default)]
pub struct InstallArgs {
    /// Remote share type: cifs or webdav
    #[arg(long, value_name = "TYPE", env = "BACKREST_REMOTE_TYPE")]
    pub remote_type: Option<String>,

    /// Remote share location (//server/share or https URL)
    #[arg(long, value_name = "PATH", env = "BACKREST_REMOTE_PATH")]
    pub remote_path: Option<String>,

    /// Login for the remote share
    #[arg(long, value_name = "LOGIN", env = "BACKREST_REMOTE_LOGIN")]
    pub remote_login: Option<String>,

    /// Password for the remote share
    #[arg(
        long,
        value_name = "PASS",
        env = "BACKREST_REMOTE_PASSWORD",
        hide_env_values = true
    )]
    pub remote_password: Option<String>,
}

impl InstallArgs {
    /// Validate into a remote configuration (`None` for local-only)
    pub fn into_remote(self) -> SetupResult<Option<RemoteConfig>> {
        RemoteConfig::from_flags(
            self.remote_type,
            self.remote_path,
            self.remote_login,
            self.remote_password,
        )
    }
}

/// Handle the install command
pub fn handle_install_command<R: CommandRunner, S: ReleaseSource + ?Sized>(
    paths: &InstallPaths,
    settings: &Settings,
    runner: &mut R,
    releases: &S,
    args: InstallArgs,
) -> SetupResult<InstallReport> {
    let remote = args.into_remote()?;

    println!("Installing Backrest...");
    let report = Installer::new(paths, settings, runner, releases).run(remote)?;

    println!();
    println!("Backrest {} installed ({})", report.release, report.arch);
    println!("Web UI:           http://{}", report.listen_address);
    println!("Source directory: {}", paths.source_dir().display());
    println!("Local repository: {}", paths.local_repo_dir().display());
    match &report.remote {
        Some(target) => {
            println!(
                "Remote ({}):     {} mounted at {}",
                target.kind,
                target.path,
                paths.remote_mount_dir().display()
            );
        }
        None => println!("Remote:           not configured"),
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetupError;
    use crate::exec::recording::RecordingRunner;
    use crate::services::release::testing::FakeReleases;
    use tempfile::TempDir;

    #[test]
    fn test_incomplete_flags_fail_before_any_command() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::with_roots(temp.path().join("home"), temp.path().join("root"));
        let mut runner = RecordingRunner::new();
        let args = InstallArgs {
            remote_login: Some("u".into()),
            ..InstallArgs::default()
        };

        let err = handle_install_command(
            &paths,
            &Settings::default(),
            &mut runner,
            &FakeReleases::standard(),
            args,
        )
        .unwrap_err();

        assert!(matches!(err, SetupError::IncompleteRemoteConfig { .. }));
        assert!(runner.commands.is_empty());
        assert!(!paths.progress_file().exists());
    }

    #[test]
    fn test_unsupported_type_fails_before_packages() {
        let temp = TempDir::new().unwrap();
        let paths = InstallPaths::with_roots(temp.path().join("home"), temp.path().join("root"));
        let mut runner = RecordingRunner::new();
        let args = InstallArgs {
            remote_type: Some("foo".into()),
            remote_path: Some("x".into()),
            remote_login: Some("u".into()),
            remote_password: Some("p".into()),
        };

        let err = handle_install_command(
            &paths,
            &Settings::default(),
            &mut runner,
            &FakeReleases::standard(),
            args,
        )
        .unwrap_err();

        assert!(matches!(err, SetupError::UnsupportedRemoteType(_)));
        assert!(runner.matching(&["apt-get"]).is_empty());
    }
}
