//! Rewrite service collaborator
//!
//! The service receives the user's text plus encoded preferences and returns
//! a revision together with the authoritative thread id. [`RewriteService`]
//! is the seam the controller depends on; [`HttpRewriteService`] talks to
//! the real backend and [`SimRewriteService`] answers locally.

pub mod analysis;
mod client;
mod error;
#[cfg(feature = "sim")]
mod sim;
mod types;

pub use analysis::ChangeAnalysis;
pub use client::{HttpRewriteService, DEFAULT_SERVICE_URL};
pub use error::RewriteError;
#[cfg(feature = "sim")]
pub use sim::SimRewriteService;
pub use types::{ResponseMetadata, RewriteRequest, RewriteResponse};

use async_trait::async_trait;

/// Trait for rewrite backends
#[async_trait]
pub trait RewriteService: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Request one revision; implementations never retry
    async fn revise(&self, request: &RewriteRequest) -> Result<RewriteResponse, RewriteError>;
}
