//! Durable session store
//!
//! [`SessionStore`] is the single owner of [`SessionState`]. Every mutation is
//! written through to the [`KeyValueStore`] and mirrored into the
//! [`NavigationContext`] before the call returns. Storage faults are logged
//! and never undo or block the in-memory change.

use super::events::{SessionEvent, SessionListener};
use super::export;
use super::{RewriteVersion, SessionState, Thread, VersionEntry};
use crate::core::{KeyValueStore, NavigationContext, SessionError};
use std::sync::Arc;

/// Key holding the serialized session state
pub const SESSION_KEY: &str = "convey_session";

/// Key holding the standalone current thread id
pub const THREAD_ID_KEY: &str = "convey_thread_id";

pub struct SessionStore {
    state: SessionState,
    persistence: Arc<dyn KeyValueStore>,
    navigation: Arc<dyn NavigationContext>,
    listeners: Vec<SessionListener>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store over its collaborators and load persisted state
    ///
    /// No [`SessionEvent::Loaded`] is emitted for this initial load since
    /// nothing can have subscribed yet. Inspect [`SessionStore::state`]
    /// instead.
    pub fn open(
        persistence: Arc<dyn KeyValueStore>,
        navigation: Arc<dyn NavigationContext>,
    ) -> Self {
        let mut store = Self {
            state: SessionState::default(),
            persistence,
            navigation,
            listeners: Vec::new(),
        };
        store.restore();
        store
    }

    /// Rebuild state from persistence
    ///
    /// Missing or corrupt data yields an empty session. A thread id carried
    /// by the navigation context wins over anything persisted.
    pub fn load(&mut self) -> &SessionState {
        self.restore();
        self.emit(&SessionEvent::Loaded {
            threads: self.state.thread_count(),
        });
        &self.state
    }

    fn restore(&mut self) {
        let mut state = self.read_persisted_state();

        let dropped = state.retain_valid_threads();
        if dropped > 0 {
            tracing::warn!("Dropped {} invalid thread(s) from stored session", dropped);
        }

        if state.current_thread_id.is_none() {
            state.current_thread_id = self.read_persisted_thread_id();
        }

        if let Some(linked) = self.navigation.thread_id() {
            if state.current_thread_id.as_deref() != Some(linked.as_str()) {
                tracing::debug!("Link thread {} overrides stored current thread", linked);
            }
            if !state.threads.contains_key(&linked) {
                tracing::debug!("Link thread {} is not in the local session", linked);
            }
            state.current_thread_id = Some(linked);
        }

        self.state = state;
        tracing::info!(
            "Session loaded: {} thread(s), {} version(s)",
            self.state.thread_count(),
            self.state.version_count()
        );
    }

    /// Record a successful rewrite under `thread_id`
    ///
    /// Creates the thread with `original_if_new` on first sight, otherwise
    /// appends. The thread becomes current.
    pub fn record_version(
        &mut self,
        thread_id: &str,
        version: RewriteVersion,
        original_if_new: Option<&str>,
    ) -> &SessionState {
        let previous = self.state.current_thread_id.clone();

        let (version_number, new_thread) = match self.state.threads.get_mut(thread_id) {
            Some(thread) => {
                thread.push_version(version);
                (thread.versions().len(), false)
            }
            None => {
                let original = original_if_new.unwrap_or_else(|| {
                    tracing::warn!("New thread {} recorded without original text", thread_id);
                    ""
                });
                self.state.threads.insert(
                    thread_id.to_string(),
                    Thread::new(thread_id, original, version),
                );
                (1, true)
            }
        };
        self.state.current_thread_id = Some(thread_id.to_string());

        self.persist();

        tracing::debug!(
            "Recorded version {} in thread {} (new: {})",
            version_number,
            thread_id,
            new_thread
        );
        self.emit(&SessionEvent::VersionRecorded {
            thread_id: thread_id.to_string(),
            version_number,
            new_thread,
        });
        if previous.as_deref() != Some(thread_id) {
            self.emit(&SessionEvent::CurrentThreadChanged {
                thread_id: Some(thread_id.to_string()),
            });
        }
        &self.state
    }

    /// Wipe the session, its durable keys and the link identifier
    pub fn clear(&mut self) -> &SessionState {
        let had_current = self.state.current_thread_id.is_some();
        for key in [SESSION_KEY, THREAD_ID_KEY] {
            if let Err(e) = self.persistence.remove(key) {
                tracing::warn!("Failed to remove {}: {:#}", key, e);
            }
        }
        if let Err(e) = self.navigation.set_thread_id(None) {
            tracing::warn!("Failed to clear link thread: {:#}", e);
        }

        self.state = SessionState::default();
        tracing::info!("Session cleared");
        self.emit(&SessionEvent::Cleared);
        if had_current {
            self.emit(&SessionEvent::CurrentThreadChanged { thread_id: None });
        }
        &self.state
    }

    /// Original text followed by every version, numbered from 1
    pub fn reconstruct_version_list(thread: &Thread) -> Vec<VersionEntry> {
        thread.version_list()
    }

    /// Text of version `version_number` of a thread (0 is the original)
    pub fn version_text(&self, thread_id: &str, version_number: usize) -> Result<&str, SessionError> {
        let thread = self
            .state
            .thread(thread_id)
            .ok_or_else(|| SessionError::ThreadNotFound(thread_id.to_string()))?;
        thread
            .text_at(version_number)
            .ok_or_else(|| SessionError::VersionNotFound {
                thread_id: thread_id.to_string(),
                version: version_number,
            })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn thread(&self, thread_id: &str) -> Option<&Thread> {
        self.state.thread(thread_id)
    }

    pub fn current_thread(&self) -> Option<&Thread> {
        self.state.current_thread()
    }

    /// Threads oldest first
    pub fn threads_by_start(&self) -> Vec<&Thread> {
        let mut threads: Vec<&Thread> = self.state.threads().collect();
        threads.sort_by(|a, b| {
            a.start_time()
                .cmp(&b.start_time())
                .then_with(|| a.thread_id().cmp(b.thread_id()))
        });
        threads
    }

    /// Register a callback run after each state transition
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Pretty JSON of the full session
    pub fn export_json(&self) -> Result<String, SessionError> {
        serde_json::to_string_pretty(&self.state)
            .map_err(|e| SessionError::InvalidState(format!("Failed to serialize session: {}", e)))
    }

    /// Human-readable lineage of every thread
    pub fn export_markdown(&self) -> String {
        export::to_markdown(&self.threads_by_start(), self.state.current_thread_id())
    }

    /// Replace the session with an exported one and persist it
    pub fn import_json(&mut self, json: &str) -> Result<&SessionState, SessionError> {
        let mut imported: SessionState = serde_json::from_str(json)
            .map_err(|e| SessionError::InvalidState(format!("Not a session export: {}", e)))?;

        let dropped = imported.retain_valid_threads();
        if dropped > 0 {
            tracing::warn!("Skipped {} invalid thread(s) while importing", dropped);
        }

        let previous = self.state.current_thread_id.take();
        self.state = imported;
        self.persist();

        tracing::info!("Imported {} thread(s)", self.state.thread_count());
        self.emit(&SessionEvent::Imported {
            threads: self.state.thread_count(),
        });
        if previous != self.state.current_thread_id {
            self.emit(&SessionEvent::CurrentThreadChanged {
                thread_id: self.state.current_thread_id.clone(),
            });
        }
        Ok(&self.state)
    }

    fn read_persisted_state(&self) -> SessionState {
        match self.persistence.get(SESSION_KEY) {
            Ok(Some(raw)) => match SessionState::from_stored_json(&raw) {
                Ok((state, 0)) => state,
                Ok((state, skipped)) => {
                    tracing::warn!("Skipped {} unreadable thread(s) in stored session", skipped);
                    state
                }
                Err(e) => {
                    tracing::warn!("Stored session is corrupt, starting empty: {}", e);
                    SessionState::default()
                }
            },
            Ok(None) => SessionState::default(),
            Err(e) => {
                tracing::warn!("Failed to read stored session: {:#}", e);
                SessionState::default()
            }
        }
    }

    fn read_persisted_thread_id(&self) -> Option<String> {
        match self.persistence.get(THREAD_ID_KEY) {
            Ok(value) => value
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read stored thread id: {:#}", e);
                None
            }
        }
    }

    /// Write state, thread id and link identifier
    fn persist(&self) {
        match serde_json::to_string(&self.state) {
            Ok(json) => {
                if let Err(e) = self.persistence.set(SESSION_KEY, &json) {
                    tracing::warn!("Failed to persist session: {:#}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize session: {}", e),
        }

        let current = self.state.current_thread_id();
        let stored = match current {
            Some(id) => self.persistence.set(THREAD_ID_KEY, id),
            None => self.persistence.remove(THREAD_ID_KEY),
        };
        if let Err(e) = stored {
            tracing::warn!("Failed to persist current thread id: {:#}", e);
        }

        if let Err(e) = self.navigation.set_thread_id(current) {
            tracing::warn!("Failed to update link thread: {:#}", e);
        }
    }

    fn emit(&self, event: &SessionEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::version;
    use super::*;
    use crate::share::ShareLink;
    use crate::storage::MemoryStore;
    use std::sync::Mutex;

    fn open_store() -> (Arc<MemoryStore>, Arc<ShareLink>, SessionStore) {
        let persistence = Arc::new(MemoryStore::new());
        let link = Arc::new(ShareLink::parse("https://clearconvey.app/").unwrap());
        let store = SessionStore::open(persistence.clone(), link.clone());
        (persistence, link, store)
    }

    /// Store whose writes always fail
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("disk unavailable")
        }
        fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk unavailable")
        }
        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk unavailable")
        }
    }

    #[test]
    fn test_opens_empty() {
        let (_persistence, _link, store) = open_store();
        assert!(store.state().is_empty());
        assert!(store.current_thread().is_none());
    }

    #[test]
    fn test_record_creates_then_appends() {
        let (_persistence, link, mut store) = open_store();

        store.record_version("t1", version("first"), Some("hello"));
        let thread = store.thread("t1").unwrap();
        assert_eq!(thread.original_text(), "hello");
        assert_eq!(thread.versions().len(), 1);
        assert_eq!(store.state().current_thread_id(), Some("t1"));
        assert_eq!(link.thread_id().as_deref(), Some("t1"));

        // The original is immutable once set
        store.record_version("t1", version("second"), Some("ignored"));
        let thread = store.thread("t1").unwrap();
        assert_eq!(thread.original_text(), "hello");
        assert_eq!(thread.versions().len(), 2);
        assert_eq!(store.state().thread_count(), 1);
    }

    #[test]
    fn test_new_thread_switches_current() {
        let (_persistence, link, mut store) = open_store();
        store.record_version("t1", version("a"), Some("one"));
        store.record_version("t2", version("b"), Some("two"));

        assert_eq!(store.state().thread_count(), 2);
        assert_eq!(store.state().current_thread_id(), Some("t2"));
        assert_eq!(link.thread_id().as_deref(), Some("t2"));
    }

    #[test]
    fn test_state_survives_reopen() {
        let (persistence, link, mut store) = open_store();
        store.record_version("t1", version("a"), Some("one"));
        store.record_version("t1", version("b"), None);
        let before = store.state().clone();
        drop(store);

        let reopened = SessionStore::open(persistence, link);
        assert_eq!(reopened.state(), &before);
    }

    #[test]
    fn test_writes_are_synchronous() {
        let (persistence, _link, mut store) = open_store();
        store.record_version("t1", version("a"), Some("one"));

        let raw = persistence.get(SESSION_KEY).unwrap().unwrap();
        let stored: SessionState = serde_json::from_str(&raw).unwrap();
        assert_eq!(&stored, store.state());
        assert_eq!(
            persistence.get(THREAD_ID_KEY).unwrap().as_deref(),
            Some("t1")
        );
    }

    #[test]
    fn test_corrupt_data_falls_back_to_empty() {
        let persistence = Arc::new(MemoryStore::new());
        persistence.set(SESSION_KEY, "{not json").unwrap();
        let link = Arc::new(ShareLink::parse("https://clearconvey.app/").unwrap());

        let store = SessionStore::open(persistence, link);
        assert!(store.state().is_empty());
    }

    #[test]
    fn test_standalone_thread_id_fills_current() {
        let persistence = Arc::new(MemoryStore::new());
        persistence.set(SESSION_KEY, r#"{"threads":{}}"#).unwrap();
        persistence.set(THREAD_ID_KEY, "t9").unwrap();
        let link = Arc::new(ShareLink::parse("https://clearconvey.app/").unwrap());

        let store = SessionStore::open(persistence, link);
        assert_eq!(store.state().current_thread_id(), Some("t9"));
    }

    #[test]
    fn test_link_overrides_persisted_thread() {
        let (persistence, _link, mut store) = open_store();
        store.record_version("t1", version("a"), Some("one"));
        store.record_version("t2", version("b"), Some("two"));
        drop(store);

        let link = Arc::new(ShareLink::parse("https://clearconvey.app/?thread=t1").unwrap());
        let store = SessionStore::open(persistence, link);
        assert_eq!(store.state().current_thread_id(), Some("t1"));
        assert_eq!(store.current_thread().unwrap().original_text(), "one");
    }

    #[test]
    fn test_load_clear_load_is_empty() {
        let (persistence, link, mut store) = open_store();
        store.record_version("t1", version("a"), Some("one"));

        store.load();
        store.clear();
        let state = store.load();

        assert!(state.is_empty());
        assert_eq!(state.thread_count(), 0);
        assert!(state.current_thread_id().is_none());
        assert!(persistence.is_empty());
        assert_eq!(link.thread_id(), None);
        assert_eq!(link.share_url(), "https://clearconvey.app/");
    }

    #[test]
    fn test_storage_failure_keeps_session_alive() {
        let link = Arc::new(ShareLink::parse("https://clearconvey.app/").unwrap());
        let mut store = SessionStore::open(Arc::new(BrokenStore), link.clone());

        store.record_version("t1", version("a"), Some("one"));
        store.record_version("t1", version("b"), None);

        assert_eq!(store.thread("t1").unwrap().versions().len(), 2);
        // The link is still kept in sync
        assert_eq!(link.thread_id().as_deref(), Some("t1"));
    }

    #[test]
    fn test_version_text() {
        let (_persistence, _link, mut store) = open_store();
        store.record_version("t1", version("better"), Some("draft"));

        assert_eq!(store.version_text("t1", 0).unwrap(), "draft");
        assert_eq!(store.version_text("t1", 1).unwrap(), "better");
        assert!(matches!(
            store.version_text("t1", 2),
            Err(SessionError::VersionNotFound { version: 2, .. })
        ));
        assert!(matches!(
            store.version_text("nope", 0),
            Err(SessionError::ThreadNotFound(_))
        ));
    }

    #[test]
    fn test_listeners_see_transitions() {
        let (_persistence, _link, mut store) = open_store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        store.record_version("t1", version("a"), Some("one"));
        store.record_version("t1", version("b"), None);
        store.clear();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                SessionEvent::VersionRecorded {
                    thread_id: "t1".to_string(),
                    version_number: 1,
                    new_thread: true,
                },
                SessionEvent::CurrentThreadChanged {
                    thread_id: Some("t1".to_string()),
                },
                SessionEvent::VersionRecorded {
                    thread_id: "t1".to_string(),
                    version_number: 2,
                    new_thread: false,
                },
                SessionEvent::Cleared,
                SessionEvent::CurrentThreadChanged { thread_id: None },
            ]
        );
    }

    #[test]
    fn test_loaded_only_from_explicit_load() {
        let (persistence, link, mut store) = open_store();
        store.record_version("t1", version("a"), Some("one"));
        drop(store);

        let mut store = SessionStore::open(persistence, link);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
        assert!(seen.lock().unwrap().is_empty());

        store.load();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![SessionEvent::Loaded { threads: 1 }]
        );
    }

    #[test]
    fn test_clear_without_current_thread() {
        let (_persistence, _link, mut store) = open_store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        store.clear();
        assert_eq!(*seen.lock().unwrap(), vec![SessionEvent::Cleared]);
    }

    #[test]
    fn test_import_reports_current_thread_change() {
        let (_persistence, _link, mut source) = open_store();
        source.record_version("t1", version("a"), Some("one"));
        let exported = source.export_json().unwrap();

        let (_persistence, _link, mut store) = open_store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        store.import_json(&exported).unwrap();
        // Same current thread again: no change to report
        store.import_json(&exported).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                SessionEvent::Imported { threads: 1 },
                SessionEvent::CurrentThreadChanged {
                    thread_id: Some("t1".to_string()),
                },
                SessionEvent::Imported { threads: 1 },
            ]
        );
    }

    #[test]
    fn test_unreadable_thread_keeps_siblings() {
        let (persistence, link, mut store) = open_store();
        store.record_version("bad", version("a"), Some("one"));
        store.record_version("good", version("b"), Some("two"));
        drop(store);

        let raw = persistence.get(SESSION_KEY).unwrap().unwrap();
        let mut stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
        stored["threads"]["bad"]["versions"][0]["timestamp"] = serde_json::json!("yesterday");
        persistence
            .set(SESSION_KEY, &serde_json::to_string(&stored).unwrap())
            .unwrap();

        let mut store = SessionStore::open(persistence.clone(), link);
        assert_eq!(store.state().thread_count(), 1);
        assert_eq!(store.thread("good").unwrap().original_text(), "two");
        assert!(store.thread("bad").is_none());

        // The intact thread survives the next write
        store.record_version("good", version("c"), None);
        let raw = persistence.get(SESSION_KEY).unwrap().unwrap();
        let stored: SessionState = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.thread("good").unwrap().versions().len(), 2);
    }

    #[test]
    fn test_export_import() {
        let (_persistence, _link, mut store) = open_store();
        store.record_version("t1", version("a"), Some("one"));
        store.record_version("t2", version("b"), Some("two"));
        let exported = store.export_json().unwrap();

        let (persistence, link, mut other) = open_store();
        other.import_json(&exported).unwrap();
        assert_eq!(other.state(), store.state());
        assert_eq!(link.thread_id().as_deref(), Some("t2"));
        assert!(persistence.get(SESSION_KEY).unwrap().is_some());
    }

    #[test]
    fn test_import_rejects_garbage() {
        let (_persistence, _link, mut store) = open_store();
        store.record_version("t1", version("a"), Some("one"));

        let result = store.import_json("[1, 2, 3]");
        assert!(matches!(result, Err(SessionError::InvalidState(_))));
        assert_eq!(store.state().thread_count(), 1);
    }

    #[test]
    fn test_export_markdown_lists_lineage() {
        let (_persistence, _link, mut store) = open_store();
        store.record_version("t1", version("Polished text"), Some("Rough text"));

        let markdown = store.export_markdown();
        assert!(markdown.contains("Rough text"));
        assert!(markdown.contains("### Version 1"));
        assert!(markdown.contains("Polished text"));
    }
}
