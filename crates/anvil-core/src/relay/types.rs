//! Relay collaborator interfaces.

use std::io::{self, Write};
use std::rc::Rc;

use crate::message::LogBatch;

/// Consumer-side collaborator that accepts finished data.
///
/// Sinks are only ever called from the consumer thread.
pub trait DataSink<T> {
    fn add_data(&self, payload: T);
}

/// Error channel for diagnostic text. Never a UI-facing sink.
pub trait DiagnosticChannel {
    fn write(&self, text: &str);
}

/// Writes each diagnostic as one line on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrDiagnostics;

impl DiagnosticChannel for StderrDiagnostics {
    fn write(&self, text: &str) {
        if let Err(e) = write_line(&mut std::io::stderr().lock(), text) {
            tracing::warn!(error = %e, "Failed to write diagnostic");
        }
    }
}

fn write_line(out: &mut impl Write, text: &str) -> io::Result<()> {
    writeln!(out, "{}", text.trim_end())?;
    out.flush()
}

/// The collaborators a [`Relay`](super::Relay) dispatches to.
///
/// They are shared with the caller, who keeps them alive for at least as long
/// as the relay.
#[derive(Clone)]
pub struct RelaySinks {
    pub profiles: Rc<dyn DataSink<String>>,
    pub processes: Rc<dyn DataSink<String>>,
    pub logs: Rc<dyn DataSink<LogBatch>>,
    pub diagnostics: Rc<dyn DiagnosticChannel>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn diagnostic_is_written_as_one_line() {
        let mut out = Vec::new();
        write_line(&mut out, "Error: could not load profile x\n\n").unwrap();
        assert_eq!(out, b"Error: could not load profile x\n");
    }

    #[test]
    fn write_failure_is_reported_not_swallowed() {
        let err = write_line(&mut BrokenPipe, "lost").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
