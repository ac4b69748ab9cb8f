use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::error::{ContextKind, ErrorKind};
use clap::{CommandFactory, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use backrest_setup::cli::{
    handle_install_command, handle_status_command, handle_uninstall_command, InstallArgs,
};
use backrest_setup::config::{InstallPaths, Settings};
use backrest_setup::exec::SystemRunner;
use backrest_setup::services::GitHubReleases;
use backrest_setup::SetupError;

#[derive(Parser)]
#[command(
    name = "backrest-setup",
    version,
    about = "Install, inspect and remove a Backrest backup service",
    long_about = "backrest-setup installs Backrest (a web UI and scheduler for Restic) \
                  as a systemd service, stores its secrets as encrypted systemd \
                  credentials, and registers an hourly local backup plan plus an \
                  optional daily plan on a CIFS or WebDAV share."
)]
struct Cli {
    /// Installer settings file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install and configure Backrest
    Install(InstallArgs),

    /// Show service, port, repository and plan status
    Status,

    /// Remove Backrest, optionally keeping its data
    Uninstall,
}

fn main() -> ExitCode {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return parse_error(e),
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .downcast_ref::<SetupError>()
                .map(SetupError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1))
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn parse_error(e: clap::Error) -> ExitCode {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = e.print();
            ExitCode::SUCCESS
        }
        ErrorKind::InvalidSubcommand => {
            let command = e
                .get(ContextKind::InvalidSubcommand)
                .map(|v| v.to_string())
                .unwrap_or_default();
            eprintln!("Unknown command: {}", command);
            eprintln!();
            let _ = Cli::command().print_help();
            ExitCode::from(1)
        }
        _ => e.exit(),
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let paths = InstallPaths::new()?;
    let settings_path = Settings::resolve_path(cli.config.as_deref(), &paths);
    let mut runner = SystemRunner::new();

    match command {
        Commands::Install(args) => {
            let settings = Settings::load_or_default(&settings_path)?;
            let releases = GitHubReleases::new(&settings.release_api_url)?;
            if let Err(e) = handle_install_command(&paths, &settings, &mut runner, &releases, args) {
                if !e.is_precondition() {
                    warn!(
                        progress = %paths.progress_file().display(),
                        "install stopped partway; `backrest-setup status` shows the completed steps"
                    );
                }
                return Err(e.into());
            }
        }
        Commands::Status => {
            let settings = load_settings_or_default(&settings_path);
            let mut out = io::stdout().lock();
            if let Err(e) = handle_status_command(&paths, &settings, &mut runner, &mut out) {
                warn!(error = %e, "status output incomplete");
            }
        }
        Commands::Uninstall => {
            let mut input = io::stdin().lock();
            let mut out = io::stdout().lock();
            if let Err(e) = handle_uninstall_command(&paths, &mut runner, &mut input, &mut out) {
                warn!(error = %e, "uninstall incomplete");
            }
        }
    }

    Ok(())
}

/// Settings for the read-only and removal paths, which never fail on a bad file
fn load_settings_or_default(path: &Path) -> Settings {
    Settings::load_or_default(path).unwrap_or_else(|e| {
        warn!(error = %e, "using default settings");
        Settings::default()
    })
}
