//! systemd unit override and service control

use std::fs;
use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{InstallPaths, Settings, SERVICE_NAME};
use crate::error::{SetupError, SetupResult};
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};

use super::credentials::{credential_names, PASSWORD_CREDENTIAL};

/// Render the override unit for the service
///
/// Declares the listen address, the runtime path of the decrypted
/// repository password, the niceness and one `LoadCredentialEncrypted=`
/// per credential file.
pub fn render_override(settings: &Settings, paths: &InstallPaths, with_remote: bool) -> String {
    let mut unit = String::from("[Service]\n");
    unit.push_str(&format!(
        "Environment=\"BACKREST_PORT={}\"\n",
        settings.listen_address
    ));
    unit.push_str(&format!(
        "Environment=\"RESTIC_PASSWORD_FILE=%d/{}\"\n",
        PASSWORD_CREDENTIAL
    ));
    unit.push_str(&format!("Nice={}\n", settings.nice));
    for name in credential_names(with_remote) {
        unit.push_str(&format!(
            "LoadCredentialEncrypted={}:{}\n",
            name,
            paths.credential_file(name).display()
        ));
    }
    unit
}

/// Write the override, replacing any previous one
pub fn write_override(paths: &InstallPaths, contents: &str) -> SetupResult<()> {
    let dir = paths.override_dir();
    fs::create_dir_all(&dir)
        .map_err(|e| SetupError::io(format!("Failed to create {}", dir.display()), e))?;
    fs::write(paths.override_file(), contents)
        .map_err(|e| SetupError::io("Failed to write service override", e))?;
    Ok(())
}

fn systemctl(args: &[&str]) -> CommandSpec {
    CommandSpec::new("systemctl").args(args.iter().copied())
}

/// Reload units, enable and restart the service, then give it `wait` to
/// come up
pub fn reload_and_restart<R: CommandRunner>(runner: &mut R, wait: Duration) -> SetupResult<()> {
    runner.run_checked(&systemctl(&["daemon-reload"]))?;
    runner.run_checked(&systemctl(&["enable", SERVICE_NAME]))?;
    runner.run_checked(&systemctl(&["restart", SERVICE_NAME]))?;

    info!(seconds = wait.as_secs(), "waiting for service to start");
    thread::sleep(wait);
    Ok(())
}

/// Reload unit files
pub fn daemon_reload<R: CommandRunner>(runner: &mut R) -> SetupResult<CommandOutput> {
    runner.run_checked(&systemctl(&["daemon-reload"]))
}

/// Stop and disable the service, tolerating failures
pub fn stop_and_disable<R: CommandRunner>(runner: &mut R) {
    for action in ["stop", "disable"] {
        if let Err(e) = runner.run_checked(&systemctl(&[action, SERVICE_NAME])) {
            warn!(error = %e, "systemctl {} failed", action);
        }
    }
}

/// `systemctl status` output
pub fn service_status<R: CommandRunner>(runner: &mut R) -> SetupResult<CommandOutput> {
    runner.run_checked(&systemctl(&["status", SERVICE_NAME, "--no-pager"]))
}

/// Listening TCP sockets mentioning `port`
pub fn listening_on<R: CommandRunner>(runner: &mut R, port: &str) -> SetupResult<Vec<String>> {
    let output = runner.run_checked(&CommandSpec::new("ss").arg("-tlnp"))?;
    let needle = format!(":{}", port);
    Ok(output
        .stdout
        .lines()
        .filter(|line| {
            line.split_whitespace()
                .any(|field| field.ends_with(&needle))
        })
        .map(str::to_string)
        .collect())
}
