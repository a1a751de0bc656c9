//! Relay module: hands command results from producer threads to the single
//! consumer thread.
//!
//! Data flow:
//! ```text
//! producer thread → RelayHandle::submit_* → SyncQueue → WakeSignal::signal
//! consumer thread → wake → Relay::on_wake → drain → sink.add_data
//! ```

mod pipeline;
mod types;
mod wake;

pub use pipeline::{Relay, RelayHandle};
pub use types::*;
pub use wake::{CondvarWake, NotifyWake, WakeSignal};
