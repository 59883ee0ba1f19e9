//! Typed view over the service's change analysis
//!
//! The service returns `analysis` as free-form JSON. This module reads the
//! parts worth displaying and treats anything unreadable as absent.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeAnalysis {
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub metrics: Option<ChangeMetrics>,
}

/// One edit the service made
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Change {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
}

impl Change {
    /// Display marker for the change kind
    pub fn icon(&self) -> &'static str {
        match self.kind.as_str() {
            "clarity" => "◆",
            "concision" => "✂",
            "tone" => "♪",
            "structure" => "≡",
            "keyword" | "seo" => "#",
            _ => "•",
        }
    }

    /// Before/after pair when the service supplied both
    pub fn before_after(&self) -> Option<(&str, &str)> {
        match (&self.before, &self.after) {
            (Some(before), Some(after)) => Some((before.as_str(), after.as_str())),
            _ => None,
        }
    }
}

/// Headline numbers; the service sends them as numbers or strings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMetrics {
    #[serde(default)]
    pub readability_improvement: Option<serde_json::Value>,
    #[serde(default)]
    pub length_reduction: Option<serde_json::Value>,
    #[serde(default)]
    pub keyword_optimization: Option<serde_json::Value>,
}

impl ChangeMetrics {
    /// Non-empty metrics as `(label, value)` pairs
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        [
            ("Readability", &self.readability_improvement, ""),
            ("Length", &self.length_reduction, "% shorter"),
            ("Keywords", &self.keyword_optimization, ""),
        ]
        .into_iter()
        .filter_map(|(label, value, suffix)| {
            metric_text(value.as_ref()?).map(|text| (label, format!("{}{}", text, suffix)))
        })
        .collect()
    }
}

fn metric_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ChangeAnalysis {
    /// Read an analysis value, `None` if it has nothing displayable
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let analysis: ChangeAnalysis = serde_json::from_value(value.clone())
            .map_err(|e| tracing::debug!("Unreadable change analysis: {}", e))
            .ok()?;
        if analysis.is_empty() {
            None
        } else {
            Some(analysis)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rationale.as_deref().map_or(true, |r| r.trim().is_empty())
            && self.changes.is_empty()
            && self.metrics.as_ref().map_or(true, |m| m.entries().is_empty())
    }
}
