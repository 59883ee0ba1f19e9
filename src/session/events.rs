//! Session change notifications

/// A state transition of the [`super::SessionStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// State was (re)loaded from persistence
    Loaded { threads: usize },
    /// A version was appended to a thread
    VersionRecorded {
        thread_id: String,
        version_number: usize,
        new_thread: bool,
    },
    /// The current thread changed
    CurrentThreadChanged { thread_id: Option<String> },
    /// All state and durable storage were wiped
    Cleared,
    /// State was replaced by an import
    Imported { threads: usize },
}

/// Callback invoked after each session transition
pub type SessionListener = Box<dyn Fn(&SessionEvent) + Send + Sync>;
