//! Threads, versions and the durable session
//!
//! A [`Thread`] is one lineage: the original text a user submitted and every
//! revision the rewrite service produced for it. A [`SessionState`] holds all
//! threads of a browsing session plus the thread currently being refined.
//! [`SessionStore`] owns the state and persists it after every change.

mod events;
mod export;
mod store;

pub use events::{SessionEvent, SessionListener};
pub use store::{SessionStore, SESSION_KEY, THREAD_ID_KEY};

use crate::preferences::{SelectionState, Similarity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a rewrite started a thread or refined an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Initial,
    Refinement,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestType::Initial => write!(f, "initial"),
            RequestType::Refinement => write!(f, "refinement"),
        }
    }
}

/// Word counts before and after a rewrite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub original: usize,
    pub revised: usize,
}

impl WordCount {
    /// Count whitespace-separated words of both texts
    pub fn of(original: &str, revised: &str) -> Self {
        Self {
            original: original.split_whitespace().count(),
            revised: revised.split_whitespace().count(),
        }
    }
}

/// One AI response, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteVersion {
    pub output_text: String,
    pub timestamp: DateTime<Utc>,
    pub request_type: RequestType,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_platform: Option<String>,
    pub similarity: Similarity,
    /// Selection snapshot at request time
    pub chip_selections: SelectionState,
    pub word_count: WordCount,
    /// Change analysis as returned by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,
}

/// One lineage of an original text and its versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    thread_id: String,
    original_text: String,
    start_time: DateTime<Utc>,
    versions: Vec<RewriteVersion>,
}

impl Thread {
    /// Start a thread with its first version
    pub(crate) fn new(thread_id: &str, original_text: &str, first: RewriteVersion) -> Self {
        Self {
            thread_id: thread_id.to_string(),
            original_text: original_text.to_string(),
            start_time: Utc::now(),
            versions: vec![first],
        }
    }

    pub(crate) fn push_version(&mut self, version: RewriteVersion) {
        self.versions.push(version);
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Versions in chronological order
    pub fn versions(&self) -> &[RewriteVersion] {
        &self.versions
    }

    pub fn latest(&self) -> Option<&RewriteVersion> {
        self.versions.last()
    }

    /// Short title taken from the first line of the original text
    pub fn title(&self) -> String {
        let first_line = self.original_text.lines().next().unwrap_or_default();
        let title: String = first_line.chars().take(50).collect();
        let title = title.trim();
        if title.is_empty() {
            format!("Thread {}", self.start_time.format("%H:%M"))
        } else if title.len() < self.original_text.trim().len() {
            format!("{}...", title)
        } else {
            title.to_string()
        }
    }

    /// Text at `version_number`, where 0 is the original
    pub fn text_at(&self, version_number: usize) -> Option<&str> {
        match version_number {
            0 => Some(&self.original_text),
            n => self.versions.get(n - 1).map(|v| v.output_text.as_str()),
        }
    }

    /// Flattened display list: the original, then each version numbered from 1
    pub fn version_list(&self) -> Vec<VersionEntry> {
        std::iter::once(VersionEntry::Original {
            content: self.original_text.clone(),
        })
        .chain(
            self.versions
                .iter()
                .enumerate()
                .map(|(i, v)| VersionEntry::Version {
                    version_number: i + 1,
                    content: v.output_text.clone(),
                }),
        )
        .collect()
    }
}

/// One row of a reconstructed thread history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VersionEntry {
    Original {
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    Version {
        version_number: usize,
        content: String,
    },
}

impl VersionEntry {
    pub fn content(&self) -> &str {
        match self {
            VersionEntry::Original { content } | VersionEntry::Version { content, .. } => content,
        }
    }
}

/// The full durable session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default)]
    current_thread_id: Option<String>,
    #[serde(default)]
    threads: BTreeMap<String, Thread>,
}

impl SessionState {
    pub fn current_thread_id(&self) -> Option<&str> {
        self.current_thread_id.as_deref()
    }

    pub fn current_thread(&self) -> Option<&Thread> {
        self.current_thread_id
            .as_deref()
            .and_then(|id| self.threads.get(id))
    }

    pub fn thread(&self, thread_id: &str) -> Option<&Thread> {
        self.threads.get(thread_id)
    }

    /// Threads keyed by id
    pub fn threads(&self) -> impl Iterator<Item = &Thread> {
        self.threads.values()
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Total number of versions across all threads
    pub fn version_count(&self) -> usize {
        self.threads.values().map(|t| t.versions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty() && self.current_thread_id.is_none()
    }

    /// Parse stored state one thread at a time
    ///
    /// A thread that fails to parse is left out instead of discarding its
    /// siblings. Returns the state and the number of threads left out.
    fn from_stored_json(raw: &str) -> serde_json::Result<(Self, usize)> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct StoredState {
            #[serde(default)]
            current_thread_id: Option<String>,
            #[serde(default)]
            threads: BTreeMap<String, serde_json::Value>,
        }

        let stored: StoredState = serde_json::from_str(raw)?;
        let mut skipped = 0;
        let threads = stored
            .threads
            .into_iter()
            .filter_map(|(id, value)| match serde_json::from_value::<Thread>(value) {
                Ok(thread) => Some((id, thread)),
                Err(e) => {
                    tracing::warn!("Unreadable stored thread {}: {}", id, e);
                    skipped += 1;
                    None
                }
            })
            .collect();

        Ok((
            Self {
                current_thread_id: stored.current_thread_id,
                threads,
            },
            skipped,
        ))
    }

    /// Drop threads that violate the non-empty invariant (hand-edited or
    /// truncated data), returning how many were removed
    fn retain_valid_threads(&mut self) -> usize {
        let before = self.threads.len();
        self.threads
            .retain(|id, thread| !thread.versions.is_empty() && *id == thread.thread_id);
        before - self.threads.len()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::version;
    use super::*;

    #[test]
    fn test_version_list_order() {
        let mut thread = Thread::new("t", "X", version("Y"));
        thread.push_version(version("Z"));

        assert_eq!(
            thread.version_list(),
            vec![
                VersionEntry::Original {
                    content: "X".to_string()
                },
                VersionEntry::Version {
                    version_number: 1,
                    content: "Y".to_string()
                },
                VersionEntry::Version {
                    version_number: 2,
                    content: "Z".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_version_entry_wire_shape() {
        let thread = Thread::new("t", "X", version("Y"));
        let json = serde_json::to_value(thread.version_list()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "type": "original", "content": "X" },
                { "type": "version", "versionNumber": 1, "content": "Y" }
            ])
        );
    }

    #[test]
    fn test_text_at() {
        let thread = Thread::new("t", "draft", version("polished"));
        assert_eq!(thread.text_at(0), Some("draft"));
        assert_eq!(thread.text_at(1), Some("polished"));
        assert_eq!(thread.text_at(2), None);
    }

    #[test]
    fn test_title_truncates() {
        let long = "a".repeat(80);
        let thread = Thread::new("t", &long, version("b"));
        assert_eq!(thread.title(), format!("{}...", "a".repeat(50)));

        let short = Thread::new("t", "Short line", version("b"));
        assert_eq!(short.title(), "Short line");

        let multi = Thread::new("t", "First\nSecond", version("b"));
        assert_eq!(multi.title(), "First...");
    }

    #[test]
    fn test_word_count() {
        let count = WordCount::of("one  two\nthree", "  ");
        assert_eq!(count, WordCount { original: 3, revised: 0 });
    }

    #[test]
    fn test_invalid_threads_are_dropped() {
        let json = serde_json::json!({
            "currentThreadId": "good",
            "threads": {
                "good": {
                    "threadId": "good",
                    "originalText": "x",
                    "startTime": "2026-01-01T00:00:00Z",
                    "versions": [serde_json::to_value(version("y")).unwrap()]
                },
                "empty": {
                    "threadId": "empty",
                    "originalText": "x",
                    "startTime": "2026-01-01T00:00:00Z",
                    "versions": []
                }
            }
        });
        let mut state: SessionState = serde_json::from_value(json).unwrap();
        assert_eq!(state.retain_valid_threads(), 1);
        assert_eq!(state.thread_count(), 1);
        assert!(state.current_thread().is_some());
    }
}
