//! Background jobs: run one privileged command and submit its result.
//!
//! Jobs run on tokio's blocking pool while the relay consumer runs on the
//! calling task. Nothing here schedules work; the caller picks the jobs.

use std::sync::Arc;

use tracing::{info, warn};

use anvil_core::command::CommandCaller;
use anvil_core::log_record::parse_logs;
use anvil_core::relay::{NotifyWake, Relay, RelayHandle, RelaySinks};

/// One unit of background work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Status,
    Unconfined,
    Logs,
    LoadProfile(String),
    DisableProfile(String),
}

impl Job {
    /// Run the command on the current thread (blocking) and submit the result.
    pub fn run(&self, caller: &CommandCaller, relay: &RelayHandle) {
        match self {
            Self::Status => relay.submit_profile_update(caller.get_status_text()),
            Self::Unconfined => relay.submit_process_update(caller.get_unconfined_text()),
            Self::Logs => relay.submit_log_update(parse_logs(&caller.get_logs_text())),
            Self::LoadProfile(path) => relay.submit_diagnostic(or_done(
                caller.load_profile(path),
                || format!("Loaded profile {path}"),
            )),
            Self::DisableProfile(name) => relay.submit_diagnostic(or_done(
                caller.disable_profile(name),
                || format!("Disabled profile {name}"),
            )),
        }
    }
}

/// Tools like `apparmor_parser -r` print nothing on success.
fn or_done(output: String, done: impl FnOnce() -> String) -> String {
    if output.trim().is_empty() {
        done()
    } else {
        output
    }
}

/// A lookup answered directly, without going through the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Abstractions,
    Locate(String),
}

impl Lookup {
    /// Run the lookup (blocking) and render its answer as text.
    pub fn run(&self, caller: &CommandCaller) -> String {
        match self {
            Self::Abstractions => {
                let names = caller.get_abstractions();
                if names.is_empty() {
                    return "No abstractions found.\n".to_string();
                }
                names.iter().map(|name| format!("{name}\n")).collect()
            }
            Self::Locate(name) => format!("{}{name}\n", caller.locate_profile(name)),
        }
    }
}

/// Run `jobs` concurrently on the blocking pool and dispatch every result to
/// `sinks` on the current task. Returns once all jobs finished and their
/// results were delivered, with the number of messages dispatched.
#[allow(clippy::future_not_send)] // the relay and its sinks stay on this task
pub async fn run_jobs(caller: CommandCaller, jobs: Vec<Job>, sinks: RelaySinks) -> usize {
    let wake = Arc::new(NotifyWake::new());
    let relay = Relay::new(wake.clone(), sinks);
    let caller = Arc::new(caller);

    let workers: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let caller = Arc::clone(&caller);
            let handle = relay.handle();
            info!(?job, "Starting job");
            tokio::task::spawn_blocking(move || job.run(&caller, &handle))
        })
        .collect();

    let handle = relay.handle();
    let all_done = async move {
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "Job worker failed");
                handle.submit_diagnostic(format!("Error: background job failed: {e}"));
            }
        }
    };

    relay.run_until(&wake, all_done).await
}
