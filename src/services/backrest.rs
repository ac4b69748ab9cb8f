//! Backrest CLI driver
//!
//! Registers repositories, backup plans and mount hooks through the
//! installed `backrest` binary. Backrest owns the resulting configuration;
//! nothing here tracks it afterwards.

use std::path::Path;

use tracing::info;

use crate::config::{InstallPaths, Settings};
use crate::error::SetupResult;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use crate::models::{RemoteTarget, RemoteType};

use super::credentials::{REMOTE_LOGIN_CREDENTIAL, REMOTE_PASSWORD_CREDENTIAL};

pub const LOCAL_REPO_ID: &str = "local";
pub const REMOTE_REPO_ID: &str = "remote";
pub const LOCAL_PLAN_ID: &str = "local-hourly";
pub const REMOTE_PLAN_ID: &str = "remote-daily";
pub const MOUNT_HOOK_ID: &str = "remote-mount";
pub const UNMOUNT_HOOK_ID: &str = "remote-unmount";

/// Environment variable the service exposes the repository password file in
const PASSWORD_ENV: &str = "RESTIC_PASSWORD_FILE";

/// When a hook fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookTrigger {
    PreBackup,
    PostBackup,
}

impl HookTrigger {
    fn as_arg(&self) -> &'static str {
        match self {
            Self::PreBackup => "pre-backup",
            Self::PostBackup => "post-backup",
        }
    }
}

/// A scheduled backup plan
#[derive(Debug, Clone)]
pub struct PlanSpec<'a> {
    pub id: &'a str,
    pub repo: &'a str,
    pub source: &'a Path,
    pub cron: &'a str,
    pub keep_last: u32,
}

/// Builds commands against one Backrest binary
#[derive(Debug, Clone)]
pub struct BackrestCli {
    binary: String,
}

impl BackrestCli {
    pub fn new(paths: &InstallPaths) -> Self {
        Self {
            binary: paths.backrest_binary().to_string_lossy().into_owned(),
        }
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(self.binary.clone())
    }

    /// `repo add`
    pub fn repo_add(&self, id: &str, uri: &Path, hooks: &[&str]) -> CommandSpec {
        let mut cmd = self
            .command()
            .args(["repo", "add", "--id", id, "--uri"])
            .arg(uri.to_string_lossy())
            .args(["--password-env", PASSWORD_ENV]);
        for hook in hooks {
            cmd = cmd.args(["--hook", *hook]);
        }
        cmd
    }

    /// `plan add`, at idle I/O and low CPU priority
    pub fn plan_add(&self, plan: &PlanSpec<'_>) -> CommandSpec {
        self.command()
            .args(["plan", "add", "--id", plan.id, "--repo", plan.repo, "--path"])
            .arg(plan.source.to_string_lossy())
            .args(["--cron", plan.cron, "--keep-last"])
            .arg(plan.keep_last.to_string())
            .args(["--io-priority", "idle", "--cpu-priority", "low"])
    }

    /// `hook add`
    pub fn hook_add(&self, id: &str, trigger: HookTrigger, command: &str) -> CommandSpec {
        self.command()
            .args(["hook", "add", "--id", id, "--on", trigger.as_arg(), "--command", command])
    }

    pub fn repo_list(&self) -> CommandSpec {
        self.command().args(["repo", "list"])
    }

    pub fn plan_list(&self) -> CommandSpec {
        self.command().args(["plan", "list"])
    }
}

/// Quote `s` for a POSIX shell
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn read_credential(name: &str) -> String {
    format!("\"$(cat \"$CREDENTIALS_DIRECTORY/{}\")\"", name)
}

/// Shell command mounting the remote share at `mount_dir`
///
/// The login and password are read from the service's decrypted credentials
/// when the hook runs; the command itself only references their paths.
pub fn mount_command(target: &RemoteTarget, mount_dir: &Path) -> String {
    let source = shell_quote(&target.path);
    let mount_point = shell_quote(&mount_dir.to_string_lossy());
    let login = read_credential(REMOTE_LOGIN_CREDENTIAL);
    let password = read_credential(REMOTE_PASSWORD_CREDENTIAL);

    match target.kind {
        RemoteType::Cifs => format!(
            "mount -t {} {} {} -o username={},password={}",
            target.kind.fs_type(),
            source,
            mount_point,
            login,
            password
        ),
        // mount.davfs reads username and password from stdin
        RemoteType::Webdav => format!(
            "printf '%s\\n%s\\n' {} {} | mount -t {} {} {}",
            login,
            password,
            target.kind.fs_type(),
            source,
            mount_point
        ),
    }
}

/// Shell command unmounting `mount_dir`
pub fn unmount_command(mount_dir: &Path) -> String {
    format!("umount {}", shell_quote(&mount_dir.to_string_lossy()))
}

/// Register the local repository and its hourly plan
pub fn register_local<R: CommandRunner>(
    runner: &mut R,
    cli: &BackrestCli,
    paths: &InstallPaths,
    settings: &Settings,
) -> SetupResult<()> {
    info!(repo = LOCAL_REPO_ID, "registering local repository");
    runner.run_checked(&cli.repo_add(LOCAL_REPO_ID, &paths.local_repo_dir(), &[]))?;

    let source = paths.source_dir();
    runner.run_checked(&cli.plan_add(&PlanSpec {
        id: LOCAL_PLAN_ID,
        repo: LOCAL_REPO_ID,
        source: &source,
        cron: &settings.hourly_schedule,
        keep_last: settings.hourly_retention,
    }))?;
    Ok(())
}

/// Register the mount hooks, the remote repository and its daily plan
pub fn register_remote<R: CommandRunner>(
    runner: &mut R,
    cli: &BackrestCli,
    paths: &InstallPaths,
    settings: &Settings,
    target: &RemoteTarget,
) -> SetupResult<()> {
    let mount_dir = paths.remote_mount_dir();
    info!(kind = %target.kind, repo = REMOTE_REPO_ID, "registering remote repository");

    runner.run_checked(&cli.hook_add(
        MOUNT_HOOK_ID,
        HookTrigger::PreBackup,
        &mount_command(target, &mount_dir),
    ))?;
    runner.run_checked(&cli.hook_add(
        UNMOUNT_HOOK_ID,
        HookTrigger::PostBackup,
        &unmount_command(&mount_dir),
    ))?;

    runner.run_checked(&cli.repo_add(
        REMOTE_REPO_ID,
        &mount_dir,
        &[MOUNT_HOOK_ID, UNMOUNT_HOOK_ID],
    ))?;

    let source = paths.source_dir();
    runner.run_checked(&cli.plan_add(&PlanSpec {
        id: REMOTE_PLAN_ID,
        repo: REMOTE_REPO_ID,
        source: &source,
        cron: &settings.daily_schedule,
        keep_last: settings.daily_retention,
    }))?;
    Ok(())
}

/// `backrest repo list` output
pub fn list_repos<R: CommandRunner>(runner: &mut R, cli: &BackrestCli) -> SetupResult<CommandOutput> {
    runner.run_checked(&cli.repo_list())
}

/// `backrest plan list` output
pub fn list_plans<R: CommandRunner>(runner: &mut R, cli: &BackrestCli) -> SetupResult<CommandOutput> {
    runner.run_checked(&cli.plan_list())
}
