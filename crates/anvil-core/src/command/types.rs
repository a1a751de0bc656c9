//! Command executor types.

/// Captured outcome of one finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Full command line as run, escalation prefix included.
    pub command: String,
    /// Exit code, or -1 when the child was terminated by a signal.
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub const fn success(&self) -> bool {
        self.exit_status == 0
    }

    /// Consume the result, keeping stdout only when the command succeeded.
    pub fn into_stdout(self) -> Result<String, CommandError> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(CommandError::NonZeroExit {
                command: self.command,
                status: self.exit_status,
                stderr: self.stderr,
            })
        }
    }
}

/// Errors from running an external command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The executable or the escalation tool could not be started.
    #[error("failed to execute `{command}`: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and reported failure.
    #[error("`{command}` exited with status {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: i32,
        stderr: String,
    },
}

impl CommandError {
    /// Command line the error refers to.
    pub fn command(&self) -> &str {
        match self {
            Self::SpawnFailed { command, .. } | Self::NonZeroExit { command, .. } => command,
        }
    }
}
