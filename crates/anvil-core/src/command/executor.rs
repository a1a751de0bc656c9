use std::io;
use std::process::Command;

use nix::unistd::geteuid;
use tracing::{debug, warn};

use super::types::{CommandError, CommandResult};
use crate::config::CommandConfig;

/// Status document returned when the status query cannot run.
pub const EMPTY_STATUS_JSON: &str = r#"{"version": "1", "profiles": {}, "processes": {}}"#;

/// Check if the current process is running as root.
pub fn is_root() -> bool {
    geteuid().is_root()
}

pub fn load_profile_fallback(path: &str) -> String {
    format!("Error: could not load profile {path}")
}

pub fn disable_profile_fallback(name: &str) -> String {
    format!("Error: could not disable profile {name}")
}

/// Directory assumed to hold a profile when it cannot be located.
pub const DEFAULT_PROFILE_DIR: &str = "/etc/apparmor.d/";

/// Runs the configured AppArmor utilities behind the escalation prefix.
#[derive(Debug, Clone)]
pub struct CommandCaller {
    templates: CommandConfig,
    escalation: Vec<String>,
}

impl CommandCaller {
    /// Build a caller from argv templates. The escalation prefix is dropped
    /// when the process is already root.
    pub fn new(templates: CommandConfig) -> Self {
        let escalation = if is_root() {
            Vec::new()
        } else {
            templates.escalation.clone()
        };
        Self {
            templates,
            escalation,
        }
    }

    /// The prefix actually prepended to every command.
    pub fn escalation(&self) -> &[String] {
        &self.escalation
    }

    /// Run `argv` behind the escalation prefix and capture its output.
    ///
    /// Returns `Ok` for every command that ran, whatever its exit status.
    pub fn run<S: AsRef<str>>(&self, argv: &[S]) -> Result<CommandResult, CommandError> {
        if argv.is_empty() {
            return Err(CommandError::SpawnFailed {
                command: String::new(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
            });
        }

        let full: Vec<&str> = self
            .escalation
            .iter()
            .map(String::as_str)
            .chain(argv.iter().map(AsRef::as_ref))
            .collect();
        let cmd_line = full.join(" ");
        debug!("exec (capture): {cmd_line}");

        let output = Command::new(full[0])
            .args(&full[1..])
            .output()
            .map_err(|source| CommandError::SpawnFailed {
                command: cmd_line.clone(),
                source,
            })?;

        let result = CommandResult {
            command: cmd_line,
            exit_status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(exit_status = result.exit_status, "finished: {}", result.command);
        Ok(result)
    }

    /// Run `argv` and return its stdout, or `fallback` if it could not be
    /// started or exited non-zero.
    pub fn run_or<S: AsRef<str>>(&self, argv: &[S], fallback: &str) -> String {
        match self.run(argv).and_then(CommandResult::into_stdout) {
            Ok(stdout) => stdout,
            Err(e) => {
                warn!(command = e.command(), error = %e, "command failed, using fallback");
                fallback.to_string()
            }
        }
    }

    /// Profiles and confined processes as reported by `aa-status --json`.
    pub fn get_status_text(&self) -> String {
        self.run_or(&self.templates.status, EMPTY_STATUS_JSON)
    }

    /// Processes with open network sockets and no profile.
    pub fn get_unconfined_text(&self) -> String {
        self.run_or(&self.templates.unconfined, "")
    }

    pub fn get_logs_text(&self) -> String {
        self.run_or(&self.templates.logs, "")
    }

    /// Load (or replace) the profile stored at `path`.
    pub fn load_profile(&self, path: &str) -> String {
        let argv = with_arg(&self.templates.load_profile, path);
        self.run_or(&argv, &load_profile_fallback(path))
    }

    pub fn disable_profile(&self, name: &str) -> String {
        let argv = with_arg(&self.templates.disable_profile, name);
        self.run_or(&argv, &disable_profile_fallback(name))
    }

    /// Directory holding the profile file `name`, with a trailing `/`.
    ///
    /// The locate template prints matching paths one per line; the first one
    /// wins. Falls back to [`DEFAULT_PROFILE_DIR`].
    pub fn locate_profile(&self, name: &str) -> String {
        let argv = with_arg(&self.templates.locate_profile, name);
        let found = self.run_or(&argv, "");
        let Some(path) = found.lines().map(str::trim).find(|l| !l.is_empty()) else {
            debug!(name, "profile not found, assuming default directory");
            return DEFAULT_PROFILE_DIR.to_string();
        };
        match path.rfind('/') {
            Some(idx) => path[..=idx].to_string(),
            None => DEFAULT_PROFILE_DIR.to_string(),
        }
    }

    /// Names of the abstractions available for profiles to include.
    pub fn get_abstractions(&self) -> Vec<String> {
        self.run_or(&self.templates.abstractions, "")
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect()
    }
}

fn with_arg(template: &[String], arg: &str) -> Vec<String> {
    let mut argv = template.to_vec();
    argv.push(arg.to_string());
    argv
}
