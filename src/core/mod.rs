//! Core seams shared across the crate
//!
//! Error types for the session and submission layers, and the collaborator
//! traits the session store depends on so that storage and navigation can be
//! swapped out in tests.

pub mod errors;
pub mod traits;

pub use errors::{SessionError, SubmitError};
pub use traits::{KeyValueStore, NavigationContext};
