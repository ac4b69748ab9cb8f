//! Install step sequencer
//!
//! Runs the install steps strictly in order. The first failing step aborts
//! the run; nothing is retried or rolled back, but every completed or failed
//! step is written to the progress record.

pub mod progress;

use std::time::Duration;

use tracing::{info, warn};

use crate::config::{InstallPaths, Settings};
use crate::error::SetupResult;
use crate::exec::{CommandRunner, CommandSpec};
use crate::models::{Architecture, RemoteConfig, RemoteTarget};
use crate::services::{backrest, credentials, packages, release, systemd, BackrestCli, ReleaseSource};

pub use progress::{InstallProgress, InstallStep, ProgressLog};

/// What a finished install did
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub release: String,
    pub arch: Architecture,
    pub remote: Option<RemoteTarget>,
    pub listen_address: String,
}

/// Drives one install run
pub struct Installer<'a, R: CommandRunner, S: ReleaseSource + ?Sized> {
    paths: &'a InstallPaths,
    settings: &'a Settings,
    runner: &'a mut R,
    releases: &'a S,
    log: ProgressLog,
}

impl<'a, R: CommandRunner, S: ReleaseSource + ?Sized> Installer<'a, R, S> {
    pub fn new(
        paths: &'a InstallPaths,
        settings: &'a Settings,
        runner: &'a mut R,
        releases: &'a S,
    ) -> Self {
        Self {
            paths,
            settings,
            runner,
            releases,
            log: ProgressLog::new(paths.progress_file()),
        }
    }

    /// Run every step for a validated configuration
    pub fn run(mut self, remote: Option<RemoteConfig>) -> SetupResult<InstallReport> {
        let (target, secrets) = match remote.map(RemoteConfig::into_parts) {
            Some((target, secrets)) => (Some(target), Some(secrets)),
            None => (None, None),
        };
        let remote_kind = target.as_ref().map(|t| t.kind);
        let mut progress = InstallProgress::start(remote_kind);

        self.step(&mut progress, InstallStep::Packages, |me| {
            let set = packages::package_set(me.settings, remote_kind);
            packages::install_packages(&mut *me.runner, &set)
        })?;

        self.step(&mut progress, InstallStep::Directories, |me| {
            me.paths.ensure_directories(remote_kind.is_some())
        })?;

        let arch = self.step(&mut progress, InstallStep::Architecture, |me| {
            let output = me.runner.run_checked(&CommandSpec::new("uname").arg("-m"))?;
            Architecture::from_machine(&output.stdout)
        })?;
        info!(%arch, "detected architecture");

        let tag = self.step(&mut progress, InstallStep::Release, |me| {
            release::install_release(&mut *me.runner, me.releases, me.paths, arch)
        })?;
        progress.release = Some(tag.clone());

        self.step(&mut progress, InstallStep::Credentials, move |me| {
            credentials::provision_credentials(&mut *me.runner, me.paths, secrets)
        })?;

        self.step(&mut progress, InstallStep::Service, |me| {
            let unit = systemd::render_override(me.settings, me.paths, remote_kind.is_some());
            systemd::write_override(me.paths, &unit)?;
            systemd::reload_and_restart(
                &mut *me.runner,
                Duration::from_secs(me.settings.startup_wait_secs),
            )
        })?;

        self.step(&mut progress, InstallStep::Registration, |me| {
            let cli = BackrestCli::new(me.paths);
            backrest::register_local(&mut *me.runner, &cli, me.paths, me.settings)?;
            if let Some(target) = &target {
                backrest::register_remote(&mut *me.runner, &cli, me.paths, me.settings, target)?;
            }
            Ok(())
        })?;

        progress.finish();
        self.record(&progress);
        info!("install complete");

        Ok(InstallReport {
            release: tag,
            arch,
            remote: target,
            listen_address: self.settings.listen_address.clone(),
        })
    }

    /// Run one step and record its outcome
    fn step<T>(
        &mut self,
        progress: &mut InstallProgress,
        step: InstallStep,
        f: impl FnOnce(&mut Self) -> SetupResult<T>,
    ) -> SetupResult<T> {
        info!(step = %step, "starting");
        match f(&mut *self) {
            Ok(value) => {
                progress.complete(step);
                self.record(progress);
                Ok(value)
            }
            Err(e) => {
                progress.fail(step, &e);
                self.record(progress);
                Err(e)
            }
        }
    }

    // The record is informational; failing to write it never fails the run.
    fn record(&self, progress: &InstallProgress) {
        if let Err(e) = self.log.save(progress) {
            warn!(error = %e, path = %self.log.path().display(), "could not record install progress");
        }
    }
}
