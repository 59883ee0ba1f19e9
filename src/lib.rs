//! clear-convey: AI copy rewriting with revision threads
//!
//! This library provides:
//! - Weighted encoding of single- and multi-choice style preferences
//! - A durable session of rewrite threads and their versions
//! - Share links that resume a thread
//! - A controller that sends rewrites to the service and records the result
//! - A terminal front end (`convey`)

pub mod config;
pub mod controller;
pub mod core;
pub mod detect;
pub mod preferences;
pub mod rewrite;
pub mod session;
pub mod share;
pub mod storage;
pub mod transport;

pub use config::Config;
pub use controller::{Submission, ThreadController};
pub use preferences::{encode, flatten_chips, SelectionState};
pub use session::{SessionState, SessionStore};
