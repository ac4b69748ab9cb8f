//! Uninstall CLI command
//!
//! Always removes the service, its override and the install directory.
//! Repository data, Backrest's config and the credentials go too unless the
//! operator asks to keep them. Every removal is best effort.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::config::InstallPaths;
use crate::error::SetupResult;
use crate::exec::CommandRunner;
use crate::services::systemd;

/// Outcome of an uninstall
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallSummary {
    /// Whether configuration and repository data were kept
    pub kept_data: bool,
    /// Paths that existed and were removed
    pub removed: Vec<String>,
    /// Paths that could not be removed
    pub failed: Vec<String>,
}

/// Handle the uninstall command, reading the answer from `input`
pub fn handle_uninstall_command<R: CommandRunner, I: BufRead, W: Write>(
    paths: &InstallPaths,
    runner: &mut R,
    input: &mut I,
    out: &mut W,
) -> SetupResult<UninstallSummary> {
    // An unreadable answer counts as the default, and the service still goes
    let answer = match prompt_string(input, out, "Keep configuration and repository data? [y/N]: ") {
        Ok(answer) => answer,
        Err(e) => {
            warn!(error = %e, "could not read answer, assuming no");
            String::new()
        }
    };
    let kept_data = parse_keep_answer(&answer);

    let mut summary = UninstallSummary {
        kept_data,
        removed: Vec::new(),
        failed: Vec::new(),
    };

    writeln!(out, "Stopping Backrest...")?;
    systemd::stop_and_disable(runner);

    remove_path(&paths.unit_file(), &mut summary);
    remove_path(&paths.override_dir(), &mut summary);
    remove_path(&paths.install_dir(), &mut summary);

    if kept_data {
        info!("keeping configuration and repository data");
    } else {
        remove_path(&paths.local_repo_dir(), &mut summary);
        remove_mount_point(&paths.remote_mount_dir(), &mut summary);
        remove_path(&paths.user_config_dir(), &mut summary);
        remove_path(&paths.credentials_dir(), &mut summary);
        remove_path(&paths.progress_file(), &mut summary);
    }

    if let Err(e) = systemd::daemon_reload(runner) {
        warn!(error = %e, "daemon-reload failed");
    }

    for path in &summary.removed {
        writeln!(out, "Removed {}", path)?;
    }
    for path in &summary.failed {
        writeln!(out, "Could not remove {}", path)?;
    }
    if kept_data {
        writeln!(out, "Repository data, configuration and credentials were kept.")?;
    }
    writeln!(out, "Backrest has been uninstalled.")?;

    Ok(summary)
}

/// `y` or `yes` in any case keeps the data; anything else, including an
/// empty answer, does not
pub fn parse_keep_answer(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn prompt_string<I: BufRead, W: Write>(input: &mut I, out: &mut W, prompt: &str) -> SetupResult<String> {
    write!(out, "{}", prompt)?;
    out.flush()?;

    let mut answer = Vec::new();
    input.read_until(b'\n', &mut answer)?;

    Ok(String::from_utf8_lossy(&answer).trim().to_string())
}

fn remove_path(path: &Path, summary: &mut UninstallSummary) {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(_) => return,
    };
    record(path, result, summary);
}

// The mount point may still have the remote share mounted on it; only an
// empty directory is removed so the share's contents are never touched.
fn remove_mount_point(path: &Path, summary: &mut UninstallSummary) {
    if !path.exists() {
        return;
    }
    record(path, fs::remove_dir(path), summary);
}

fn record(path: &Path, result: std::io::Result<()>, summary: &mut UninstallSummary) {
    let shown = path.display().to_string();
    match result {
        Ok(()) => summary.removed.push(shown),
        Err(e) => {
            warn!(path = %shown, error = %e, "could not remove");
            summary.failed.push(shown);
        }
    }
}
