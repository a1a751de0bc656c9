//! Update messages carried from command producers to the consumer thread.

use std::sync::Arc;

use crate::log_record::LogRecord;

/// Shared, ordered batch of parsed log records.
pub type LogBatch = Vec<Arc<LogRecord>>;

/// Discriminant of an [`UpdateMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    None,
    ProfileSummary,
    ProcessSummary,
    LogBatch,
    DiagnosticText,
}

/// One unit of work for the consumer. The payload lives inside the variant,
/// so it always matches the kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpdateMessage {
    #[default]
    None,
    /// Raw profile status listing.
    ProfileSummary(String),
    /// Raw process listing.
    ProcessSummary(String),
    LogBatch(LogBatch),
    /// Command or parse problem meant for the error channel, not a sink.
    DiagnosticText(String),
}

impl UpdateMessage {
    pub fn profile_summary(text: impl Into<String>) -> Self {
        Self::ProfileSummary(text.into())
    }

    pub fn process_summary(text: impl Into<String>) -> Self {
        Self::ProcessSummary(text.into())
    }

    pub const fn log_batch(records: LogBatch) -> Self {
        Self::LogBatch(records)
    }

    pub fn diagnostic_text(text: impl Into<String>) -> Self {
        Self::DiagnosticText(text.into())
    }

    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::None => MessageKind::None,
            Self::ProfileSummary(_) => MessageKind::ProfileSummary,
            Self::ProcessSummary(_) => MessageKind::ProcessSummary,
            Self::LogBatch(_) => MessageKind::LogBatch,
            Self::DiagnosticText(_) => MessageKind::DiagnosticText,
        }
    }
}
