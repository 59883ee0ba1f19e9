//! Offline stand-in for the rewrite service
//!
//! Produces deterministic revisions locally so the CLI and tests can run
//! without a backend. Thread ids are issued the way the real service does:
//! a fresh id for a first submission, the request's id for a refinement.

use super::{ResponseMetadata, RewriteError, RewriteRequest, RewriteResponse, RewriteService};
use crate::preferences::{ChipValue, SimilarityBand};
use crate::session::WordCount;
use async_trait::async_trait;
use serde_json::json;

#[derive(Debug, Default)]
pub struct SimRewriteService {
    unavailable: bool,
}

impl SimRewriteService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A simulator that answers every request with a 503-style failure
    #[cfg(test)]
    pub(crate) fn unavailable() -> Self {
        Self { unavailable: true }
    }
}

#[async_trait]
impl RewriteService for SimRewriteService {
    fn name(&self) -> &str {
        "offline"
    }

    async fn revise(&self, request: &RewriteRequest) -> Result<RewriteResponse, RewriteError> {
        if self.unavailable {
            return Err(RewriteError::ServiceError(
                "Offline rewrite service unavailable".to_string(),
            ));
        }

        let length = match request.chips.get("length") {
            Some(ChipValue::One(value)) => Some(value.as_str()),
            _ => None,
        };
        let revised = polish(&request.text, length, &request.content_type);
        let thread_id = request
            .thread_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let band = request.similarity.band();
        let word_count = WordCount::of(&request.text, &revised);
        tracing::debug!(
            "Offline rewrite for thread {}: {} -> {} words",
            thread_id,
            word_count.original,
            word_count.revised
        );

        Ok(RewriteResponse {
            analysis: Some(json!({
                "rationale": rationale(band, length),
                "changes": [{
                    "type": "clarity",
                    "description": "Normalized spacing and sentence capitalization"
                }],
            })),
            metadata: Some(ResponseMetadata {
                word_count: Some(word_count),
                extra: serde_json::Map::new(),
            }),
            revision: None,
            revised,
            thread_id,
        })
    }
}

fn rationale(band: SimilarityBand, length: Option<&str>) -> String {
    let mut rationale = format!("{} rewrite", band.label());
    match length {
        Some("shorter") => rationale.push_str(", trimmed to the essentials"),
        Some("longer") => rationale.push_str(", expanded with a closing line"),
        _ => {}
    }
    rationale
}

/// Tidy whitespace and capitalization, then apply the length chip
fn polish(text: &str, length: Option<&str>, content_type: &str) -> String {
    let mut sentences: Vec<String> = split_sentences(text)
        .into_iter()
        .map(|s| capitalize(&s))
        .collect();

    match length {
        Some("shorter") if sentences.len() > 1 => {
            let keep = sentences.len().div_ceil(2);
            sentences.truncate(keep);
        }
        Some("longer") => sentences.push(closing_line(content_type).to_string()),
        _ => {}
    }

    sentences.join(" ")
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
        if word.ends_with(['.', '!', '?']) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

fn capitalize(sentence: &str) -> String {
    let mut chars = sentence.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn closing_line(content_type: &str) -> &'static str {
    match content_type {
        "email" => "Looking forward to hearing from you.",
        "social" => "Share your thoughts below.",
        "blog" | "webpage" => "Read on to learn more.",
        _ => "Thanks for reading.",
    }
}
