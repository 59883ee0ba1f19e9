//! Collaborator traits for the session layer
//!
//! These traits define the interfaces the session store depends on,
//! allowing infrastructure to be injected and tests to use in-memory fakes.

use anyhow::Result;

/// String-valued key/value persistence that survives restarts
///
/// A missing key is a valid "nothing stored" state and returns `Ok(None)`.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// A bookmarkable identifier for the thread currently being refined
///
/// On load an identifier found here overrides persisted state. The session
/// store rewrites it after every mutation.
pub trait NavigationContext: Send + Sync {
    /// Thread id carried by the current link, if any
    fn thread_id(&self) -> Option<String>;

    /// Point the link at `thread_id`, or drop the identifier when `None`
    fn set_thread_id(&self, thread_id: Option<&str>) -> Result<()>;
}
