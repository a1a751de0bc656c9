//! Anvil CLI
//!
//! Queries AppArmor status, unconfined processes and audit logs through the
//! privileged utilities, and loads or disables profiles.

use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use anvil_cli::jobs::{Job, Lookup, run_jobs};
use anvil_cli::sinks::{LogsPrinter, Printer, ProcessesPrinter, ProfilesPrinter};
use anvil_core::command::CommandCaller;
use anvil_core::config;
use anvil_core::relay::{RelaySinks, StderrDiagnostics};
use anvil_core::tracing_init::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "anvil", version, about = "AppArmor status, logs and profile control")]
struct Cli {
    /// Settings file layered over the global settings
    #[arg(long, global = true, env = "ANVIL_CONFIG")]
    config: Option<PathBuf>,

    /// Privilege-escalation prefix, e.g. "sudo -n" (empty string disables)
    #[arg(long, global = true)]
    escalation: Option<String>,

    /// Output logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List loaded profiles and their modes
    Status,
    /// List processes with network access and no profile
    Unconfined,
    /// Show AppArmor entries from the kernel log
    Logs,
    /// Run status, unconfined and logs queries concurrently
    Refresh,
    /// Load (or replace) a profile from a file
    Load {
        /// Path to the profile file
        path: PathBuf,
    },
    /// Disable a loaded profile
    Disable {
        /// Profile name
        name: String,
    },
    /// List the abstractions profiles can include
    Abstractions,
    /// Print the path of a profile file
    Locate {
        /// Profile name
        name: String,
    },
}

impl Commands {
    fn jobs(&self) -> Vec<Job> {
        match self {
            Self::Status => vec![Job::Status],
            Self::Unconfined => vec![Job::Unconfined],
            Self::Logs => vec![Job::Logs],
            Self::Refresh => vec![Job::Status, Job::Unconfined, Job::Logs],
            Self::Load { path } => vec![Job::LoadProfile(path.display().to_string())],
            Self::Disable { name } => vec![Job::DisableProfile(name.clone())],
            Self::Abstractions | Self::Locate { .. } => Vec::new(),
        }
    }

    fn lookup(&self) -> Option<Lookup> {
        match self {
            Self::Abstractions => Some(Lookup::Abstractions),
            Self::Locate { name } => Some(Lookup::Locate(name.clone())),
            _ => None,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = config::load_config(cli.config.as_deref())?;
    if let Some(escalation) = &cli.escalation {
        settings.commands.escalation = escalation.split_whitespace().map(String::from).collect();
    }
    init_tracing(
        &settings.logging.level,
        cli.log_json || settings.logging.json,
    );
    for path in &settings.sources {
        debug!(path = %path.display(), "Loaded config file");
    }

    let caller = CommandCaller::new(settings.commands);
    info!(
        escalation = ?caller.escalation(),
        command = ?cli.command,
        "Starting anvil"
    );

    if let Some(lookup) = cli.command.lookup() {
        let text = tokio::task::spawn_blocking(move || lookup.run(&caller)).await?;
        std::io::stdout().lock().write_all(text.as_bytes())?;
        return Ok(());
    }

    let sinks = RelaySinks {
        profiles: Rc::new(ProfilesPrinter(Printer::stdout())),
        processes: Rc::new(ProcessesPrinter(Printer::stdout())),
        logs: Rc::new(LogsPrinter(Printer::stdout())),
        diagnostics: Rc::new(StderrDiagnostics),
    };

    let delivered = run_jobs(caller, cli.command.jobs(), sinks).await;
    info!(delivered, "Done");
    Ok(())
}
