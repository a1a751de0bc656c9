//! `Anvil` Core Library
//!
//! Shared functionality for `Anvil` components:
//! - Privileged command execution with fallback values
//! - Cross-thread update relay (message model, synchronized queue, wake primitives)
//! - Kernel audit log record parsing
//! - Configuration resolution and hierarchy
//! - Common error types

pub mod command;
pub mod config;
pub mod error;
pub mod log_record;
pub mod message;
pub mod queue;
pub mod relay;
pub mod tracing_init;

pub use command::{CommandCaller, CommandError, CommandResult};
pub use config::Config;
pub use error::{Error, Result};
pub use log_record::LogRecord;
pub use message::{MessageKind, UpdateMessage};
pub use queue::SyncQueue;
pub use relay::{Relay, RelayHandle, RelaySinks};
