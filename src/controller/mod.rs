//! Rewrite orchestration
//!
//! [`ThreadController`] turns a submission into one rewrite request, calls
//! the service exactly once and folds a successful answer into the session
//! under the thread id the service issued. Failures leave the session as it
//! was.
//!
//! The store lock is only taken before and after the network call, never
//! across it, so overlapping submissions are allowed and land in completion
//! order.

use crate::core::SubmitError;
use crate::preferences::{encode, flatten_chips, SelectionState, Similarity, SingleCategory};
use crate::rewrite::{RewriteRequest, RewriteService};
use crate::session::{RequestType, RewriteVersion, SessionStore, WordCount};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Content type sent when the caller has no better hint
pub const DEFAULT_CONTENT_TYPE: &str = "other";

/// One rewrite request as the user composed it
#[derive(Debug, Clone)]
pub struct Submission<'a> {
    pub input_text: &'a str,
    pub selection: &'a SelectionState,
    pub content_type: &'a str,
    pub similarity: Similarity,
    /// Refine the current thread instead of starting a new one
    pub refine: bool,
}

impl<'a> Submission<'a> {
    pub fn new(input_text: &'a str, selection: &'a SelectionState) -> Self {
        Self {
            input_text,
            selection,
            content_type: DEFAULT_CONTENT_TYPE,
            similarity: Similarity::default(),
            refine: false,
        }
    }

    pub fn with_content_type(mut self, content_type: &'a str) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_similarity(mut self, similarity: Similarity) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn refining(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }
}

/// Progress of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A request is about to be sent
    Started { refinement: bool },
    /// The revision was recorded
    Completed {
        thread_id: String,
        version_number: usize,
    },
    /// The service call failed; the session is unchanged
    Failed { message: String },
}

/// Callback invoked as a submission progresses
pub type ControllerListener = Box<dyn Fn(&ControllerEvent) + Send + Sync>;

pub struct ThreadController {
    service: Arc<dyn RewriteService>,
    store: Arc<Mutex<SessionStore>>,
    listeners: Vec<ControllerListener>,
}

impl ThreadController {
    pub fn new(service: Arc<dyn RewriteService>, store: Arc<Mutex<SessionStore>>) -> Self {
        Self {
            service,
            store,
            listeners: Vec::new(),
        }
    }

    /// Shared handle to the session store
    pub fn store(&self) -> &Arc<Mutex<SessionStore>> {
        &self.store
    }

    /// Register a callback run on each submission event
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&ControllerEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Build the request a submission would send
    ///
    /// The current thread id is attached only when refining.
    pub async fn build_request(&self, submission: &Submission<'_>) -> RewriteRequest {
        let thread_id = if submission.refine {
            let store = self.store.lock().await;
            store.state().current_thread_id().map(str::to_string)
        } else {
            None
        };
        if submission.refine && thread_id.is_none() {
            tracing::debug!("Refinement requested without a current thread; starting a new one");
        }

        RewriteRequest {
            text: submission.input_text.to_string(),
            content_type: submission.content_type.to_string(),
            similarity: submission.similarity,
            chips: flatten_chips(submission.selection),
            chip_weights: encode(submission.selection),
            thread_id,
            social_platform: submission
                .selection
                .single(SingleCategory::SocialPlatform)
                .map(str::to_string),
        }
    }

    /// Request a revision and record it
    ///
    /// Returns `Ok(None)` without contacting the service when the input is
    /// blank.
    pub async fn submit(
        &self,
        submission: Submission<'_>,
    ) -> Result<Option<RewriteVersion>, SubmitError> {
        if submission.input_text.trim().is_empty() {
            tracing::debug!("Ignoring empty submission");
            return Ok(None);
        }

        let request = self.build_request(&submission).await;
        let request_type = if request.thread_id.is_some() {
            RequestType::Refinement
        } else {
            RequestType::Initial
        };

        self.emit(&ControllerEvent::Started {
            refinement: request_type == RequestType::Refinement,
        });
        tracing::info!(
            "Requesting {} rewrite from {} service",
            request_type,
            self.service.name()
        );

        let response = match self.service.revise(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Rewrite failed: {}", e);
                self.emit(&ControllerEvent::Failed {
                    message: e.to_string(),
                });
                return Err(SubmitError::RewriteFailed(e));
            }
        };

        let word_count = response
            .word_count()
            .unwrap_or_else(|| WordCount::of(submission.input_text, &response.revised));
        let version = RewriteVersion {
            output_text: response.revised.clone(),
            timestamp: Utc::now(),
            request_type,
            content_type: request.content_type,
            social_platform: request.social_platform,
            similarity: request.similarity,
            chip_selections: submission.selection.clone(),
            word_count,
            analysis: response.analysis.clone(),
        };

        if let Some(sent) = request.thread_id.as_deref() {
            if sent != response.thread_id {
                tracing::info!(
                    "Service moved refinement of {} to thread {}",
                    sent,
                    response.thread_id
                );
            }
        }

        let version_number = {
            let mut store = self.store.lock().await;
            store.record_version(
                &response.thread_id,
                version.clone(),
                Some(submission.input_text),
            );
            store
                .thread(&response.thread_id)
                .map_or(0, |thread| thread.versions().len())
        };

        self.emit(&ControllerEvent::Completed {
            thread_id: response.thread_id,
            version_number,
        });
        Ok(Some(version))
    }

    /// Start a new thread from an existing revision
    ///
    /// `version_number` 0 branches from the thread's original text.
    pub async fn branch(
        &self,
        thread_id: &str,
        version_number: usize,
        selection: &SelectionState,
        content_type: &str,
        similarity: Similarity,
    ) -> Result<Option<RewriteVersion>, SubmitError> {
        let text = {
            let store = self.store.lock().await;
            store.version_text(thread_id, version_number)?.to_string()
        };
        tracing::info!("Branching from version {} of {}", version_number, thread_id);

        let submission = Submission::new(&text, selection)
            .with_content_type(content_type)
            .with_similarity(similarity);
        self.submit(submission).await
    }

    fn emit(&self, event: &ControllerEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}
