//! Shareable session links
//!
//! The navigational identifier is the `thread` query parameter of a link
//! such as `https://clearconvey.app/?thread=abc123`. Opening a link that
//! carries one resumes that thread.

use crate::core::NavigationContext;
use anyhow::{Context, Result};
use std::sync::{Mutex, PoisonError};
use url::Url;

/// Query parameter holding the thread id
pub const THREAD_PARAM: &str = "thread";

/// A link whose `thread` parameter tracks the current thread
#[derive(Debug)]
pub struct ShareLink {
    url: Mutex<Url>,
}

impl ShareLink {
    pub fn new(url: Url) -> Self {
        Self {
            url: Mutex::new(url),
        }
    }

    /// Parse a link, e.g. one passed on the command line
    pub fn parse(link: &str) -> Result<Self> {
        let url = Url::parse(link.trim()).with_context(|| format!("Invalid link: {}", link))?;
        Ok(Self::new(url))
    }

    /// The link as it currently stands
    pub fn share_url(&self) -> String {
        self.url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_string()
    }
}

impl NavigationContext for ShareLink {
    fn thread_id(&self) -> Option<String> {
        let url = self.url.lock().unwrap_or_else(PoisonError::into_inner);
        url.query_pairs()
            .find(|(key, _)| key == THREAD_PARAM)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn set_thread_id(&self, thread_id: Option<&str>) -> Result<()> {
        let mut url = self.url.lock().unwrap_or_else(PoisonError::into_inner);
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != THREAD_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.set_query(None);
        if !kept.is_empty() || thread_id.is_some() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &kept {
                pairs.append_pair(key, value);
            }
            if let Some(id) = thread_id {
                pairs.append_pair(THREAD_PARAM, id);
            }
        }
        Ok(())
    }
}
