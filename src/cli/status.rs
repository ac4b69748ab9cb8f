//! Status CLI command
//!
//! Read-only, best-effort inspection. Every check may fail on its own and
//! falls back to a fixed message; the command itself never fails because of
//! the host's state.

use std::io::Write;

use tabled::{Table, Tabled};
use tracing::debug;

use crate::config::{InstallPaths, Settings};
use crate::error::SetupResult;
use crate::exec::CommandRunner;
use crate::install::{InstallProgress, InstallStep, ProgressLog};
use crate::services::{backrest, systemd, BackrestCli};

pub const SERVICE_FALLBACK: &str = "Backrest service is not installed or not running.";
pub const PORTS_FALLBACK: &str = "No listening ports found for Backrest.";
pub const REPOS_FALLBACK: &str = "Unable to list repositories.";
pub const PLANS_FALLBACK: &str = "Unable to list backup plans.";
pub const PROGRESS_FALLBACK: &str = "No install progress recorded.";

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "When")]
    when: String,
}

/// Handle the status command, writing the report to `out`
pub fn handle_status_command<R: CommandRunner, W: Write>(
    paths: &InstallPaths,
    settings: &Settings,
    runner: &mut R,
    out: &mut W,
) -> SetupResult<()> {
    let cli = BackrestCli::new(paths);

    section(out, "Service")?;
    match systemd::service_status(runner) {
        Ok(output) => writeln!(out, "{}", output.stdout.trim_end())?,
        Err(e) => fallback(out, SERVICE_FALLBACK, &e)?,
    }

    section(out, "Listening ports")?;
    let ports = match settings.listen_port() {
        Some(port) => systemd::listening_on(runner, port),
        None => Ok(Vec::new()),
    };
    match ports {
        Ok(lines) if !lines.is_empty() => {
            for line in lines {
                writeln!(out, "{}", line)?;
            }
        }
        Ok(_) => writeln!(out, "{}", PORTS_FALLBACK)?,
        Err(e) => fallback(out, PORTS_FALLBACK, &e)?,
    }

    section(out, "Repositories")?;
    match backrest::list_repos(runner, &cli) {
        Ok(output) => writeln!(out, "{}", output.stdout.trim_end())?,
        Err(e) => fallback(out, REPOS_FALLBACK, &e)?,
    }

    section(out, "Backup plans")?;
    match backrest::list_plans(runner, &cli) {
        Ok(output) => writeln!(out, "{}", output.stdout.trim_end())?,
        Err(e) => fallback(out, PLANS_FALLBACK, &e)?,
    }

    section(out, "Last install")?;
    match ProgressLog::new(paths.progress_file()).load() {
        Ok(Some(progress)) => writeln!(out, "{}", render_progress(&progress))?,
        Ok(None) => writeln!(out, "{}", PROGRESS_FALLBACK)?,
        Err(e) => fallback(out, PROGRESS_FALLBACK, &e)?,
    }

    Ok(())
}

fn section<W: Write>(out: &mut W, title: &str) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title)?;
    writeln!(out, "{}", "=".repeat(title.len()))
}

fn fallback<W: Write>(out: &mut W, message: &str, err: &dyn std::fmt::Display) -> std::io::Result<()> {
    debug!(error = %err, "status check failed");
    writeln!(out, "{}", message)
}

/// Render recorded progress as a table of steps
pub fn render_progress(progress: &InstallProgress) -> String {
    let rows: Vec<StepRow> = InstallStep::ALL
        .iter()
        .map(|&step| {
            let (status, when) = match (&progress.failed, progress.completed_at(step)) {
                (_, Some(at)) => ("done".to_string(), at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
                (Some(failed), None) if failed.step == step => (
                    format!("failed: {}", failed.error),
                    failed.failed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                ),
                _ => ("pending".to_string(), String::new()),
            };
            StepRow {
                step: step.to_string(),
                status,
                when,
            }
        })
        .collect();

    let mut text = format!(
        "Started: {}",
        progress.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(release) = &progress.release {
        text.push_str(&format!("\nRelease: {}", release));
    }
    if let Some(remote) = progress.remote {
        text.push_str(&format!("\nRemote:  {}", remote));
    }
    text.push('\n');
    text.push_str(&Table::new(rows).to_string());
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SetupError;
    use crate::exec::recording::RecordingRunner;
    use crate::exec::CommandOutput;
    use tempfile::TempDir;

    fn test_paths(temp: &TempDir) -> InstallPaths {
        InstallPaths::with_roots(temp.path().join("home"), temp.path().join("root"))
    }

    #[test]
    fn test_status_with_nothing_installed() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(&temp);
        let binary = paths.backrest_binary().to_string_lossy().into_owned();
        let mut runner = RecordingRunner::new()
            .respond(&["systemctl"], CommandOutput::failed(4, "Unit backrest.service could not be found."))
            .without_program("ss")
            .without_program(&binary);
        let mut out = Vec::new();

        handle_status_command(&paths, &Settings::default(), &mut runner, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(SERVICE_FALLBACK));
        assert!(text.contains(PORTS_FALLBACK));
        assert!(text.contains(REPOS_FALLBACK));
        assert!(text.contains(PLANS_FALLBACK));
        assert!(text.contains(PROGRESS_FALLBACK));
    }

    #[test]
    fn test_status_with_running_service() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(&temp);
        let binary = paths.backrest_binary().to_string_lossy().into_owned();
        let mut runner = RecordingRunner::new()
            .respond(&["systemctl"], CommandOutput::ok("● backrest.service - Backrest\n   Active: active (running)\n"))
            .respond(&["ss"], CommandOutput::ok("LISTEN 0 4096 0.0.0.0:9898 0.0.0.0:*\n"))
            .respond(&[binary.as_str(), "repo"], CommandOutput::ok("local\n"))
            .respond(&[binary.as_str(), "plan"], CommandOutput::ok("local-hourly\n"));
        let mut out = Vec::new();

        handle_status_command(&paths, &Settings::default(), &mut runner, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("active (running)"));
        assert!(text.contains("0.0.0.0:9898"));
        assert!(text.contains("local-hourly"));
        assert!(!text.contains(SERVICE_FALLBACK));
        assert!(!text.contains(PORTS_FALLBACK));
    }

    #[test]
    fn test_render_progress_marks_failed_step() {
        let mut progress = InstallProgress::start(None);
        progress.complete(InstallStep::Packages);
        progress.fail(
            InstallStep::Directories,
            &SetupError::Io("permission denied".into()),
        );

        let table = render_progress(&progress);
        assert!(table.contains("Install packages"));
        assert!(table.contains("done"));
        assert!(table.contains("failed: I/O error: permission denied"));
        assert!(table.contains("pending"));
    }

    #[test]
    fn test_status_shows_recorded_progress() {
        let temp = TempDir::new().unwrap();
        let paths = test_paths(&temp);
        let mut progress = InstallProgress::start(None);
        progress.complete(InstallStep::Packages);
        ProgressLog::new(paths.progress_file()).save(&progress).unwrap();
        let mut runner = RecordingRunner::new();
        let mut out = Vec::new();

        handle_status_command(&paths, &Settings::default(), &mut runner, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Install packages"));
        assert!(!text.contains(PROGRESS_FALLBACK));
    }
}
