//! OS package installation through apt

use tracing::info;

use crate::config::Settings;
use crate::error::SetupResult;
use crate::exec::{CommandRunner, CommandSpec};
use crate::models::RemoteType;

/// Packages to install: the base set plus the mount helper for `remote`
pub fn package_set(settings: &Settings, remote: Option<RemoteType>) -> Vec<String> {
    let mut packages = settings.base_packages.clone();
    if let Some(kind) = remote {
        packages.push(kind.package().to_string());
    }
    packages
}

/// Refresh the package index and install `packages`
pub fn install_packages<R: CommandRunner>(runner: &mut R, packages: &[String]) -> SetupResult<()> {
    info!(packages = %packages.join(" "), "installing packages");

    runner.run_checked(
        &CommandSpec::new("apt-get")
            .arg("update")
            .env("DEBIAN_FRONTEND", "noninteractive"),
    )?;

    runner.run_checked(
        &CommandSpec::new("apt-get")
            .args(["install", "-y"])
            .args(packages.iter().cloned())
            .env("DEBIAN_FRONTEND", "noninteractive"),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::recording::RecordingRunner;
    use crate::exec::CommandOutput;

    #[test]
    fn test_package_set_local_only() {
        let packages = package_set(&Settings::default(), None);
        assert_eq!(packages, vec!["ca-certificates", "util-linux", "fuse3"]);
    }

    #[test]
    fn test_package_set_adds_mount_helper() {
        let cifs = package_set(&Settings::default(), Some(RemoteType::Cifs));
        assert_eq!(cifs.last().map(String::as_str), Some("cifs-utils"));

        let webdav = package_set(&Settings::default(), Some(RemoteType::Webdav));
        assert_eq!(webdav.last().map(String::as_str), Some("davfs2"));
        assert!(!webdav.contains(&"cifs-utils".to_string()));
    }

    #[test]
    fn test_install_runs_update_then_install() {
        let mut runner = RecordingRunner::new();
        install_packages(&mut runner, &["davfs2".to_string()]).unwrap();

        assert_eq!(
            runner.lines(),
            vec!["apt-get update", "apt-get install -y davfs2"]
        );
        assert!(runner.commands[1]
            .get_env()
            .contains(&("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())));
    }

    #[test]
    fn test_failed_update_stops_before_install() {
        let mut runner = RecordingRunner::new()
            .respond(&["apt-get", "update"], CommandOutput::failed(100, "no network"));

        let err = install_packages(&mut runner, &["fuse3".to_string()]).unwrap_err();
        assert_eq!(err.exit_code(), 100);
        assert_eq!(runner.commands.len(), 1);
    }
}
