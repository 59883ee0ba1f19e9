//! Transport layer for terminal interaction

pub mod cli;

pub use cli::{AppContext, ExportFormat, OutputFormat, StyleArgs};
