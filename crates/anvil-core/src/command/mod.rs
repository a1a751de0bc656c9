//! Synchronous execution of the privileged AppArmor utilities.
//!
//! Every call blocks the calling thread until the child exits. There is no
//! timeout and no cancellation, so callers run these on worker threads.

mod executor;
mod types;

pub use executor::{
    CommandCaller, DEFAULT_PROFILE_DIR, EMPTY_STATUS_JSON, disable_profile_fallback, is_root,
    load_profile_fallback,
};
pub use types::{CommandError, CommandResult};
