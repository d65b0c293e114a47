//! # Invocation Handlers
//!
//! Maps named contract functions with string arguments onto the typed
//! contract APIs.

pub mod dispatcher;

pub use dispatcher::{dispatch, is_read_only, DispatchError, Invocation, READ_ONLY};
