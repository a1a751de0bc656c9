//! Anvil CLI Library
//!
//! Headless front end for the AppArmor relay: terminal sinks and the
//! background jobs that feed them.

pub mod jobs;
pub mod sinks;
