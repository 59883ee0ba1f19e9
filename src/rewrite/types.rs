//! Wire types of the rewrite service (camelCase JSON)

use super::RewriteError;
use crate::preferences::{Chips, Similarity, WeightedSelection};
use crate::session::WordCount;
use serde::{Deserialize, Serialize};

/// Body of `POST /revise`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRequest {
    pub text: String,
    pub content_type: String,
    pub similarity: Similarity,
    pub chips: Chips,
    pub chip_weights: WeightedSelection,
    /// Present only when refining an existing thread
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_platform: Option<String>,
}

/// Optional metadata block of a response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<WordCount>,
    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A successful rewrite
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteResponse {
    pub revised: String,
    /// Authoritative thread id for the lineage
    pub thread_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRewriteResponse {
    revised: Option<String>,
    thread_id: Option<String>,
    #[serde(default)]
    analysis: Option<serde_json::Value>,
    #[serde(default)]
    metadata: Option<serde_json::Value>,
    #[serde(default)]
    revision: Option<serde_json::Value>,
}

impl RewriteResponse {
    /// Parse and validate a response body
    ///
    /// A body without `revised` or with a missing/blank `threadId` is
    /// malformed. An unreadable `metadata` block is dropped.
    pub fn from_json(body: &str) -> Result<Self, RewriteError> {
        let raw: RawRewriteResponse = serde_json::from_str(body)
            .map_err(|e| RewriteError::Malformed(format!("Invalid JSON: {}", e)))?;

        let revised = raw
            .revised
            .ok_or_else(|| RewriteError::Malformed("Missing 'revised'".to_string()))?;
        let thread_id = raw
            .thread_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RewriteError::Malformed("Missing 'threadId'".to_string()))?;

        let metadata = raw.metadata.and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| tracing::debug!("Ignoring unreadable metadata: {}", e))
                .ok()
        });

        Ok(Self {
            revised,
            thread_id,
            analysis: raw.analysis.filter(|a| !a.is_null()),
            metadata,
            revision: raw.revision.filter(|r| !r.is_null()),
        })
    }

    /// Word counts reported by the service, if any
    pub fn word_count(&self) -> Option<WordCount> {
        self.metadata.as_ref().and_then(|m| m.word_count)
    }
}
