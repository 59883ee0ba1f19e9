//! How far a rewrite may drift from the original text

use serde::{Deserialize, Serialize};
use std::fmt;

/// Similarity setting in percent, clamped to 0..=100
///
/// Low values ask for conservative edits, high values for a creative rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Similarity(u8);

impl Similarity {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn band(self) -> SimilarityBand {
        match self.0 {
            0..=29 => SimilarityBand::Conservative,
            71..=u8::MAX => SimilarityBand::Creative,
            _ => SimilarityBand::Moderate,
        }
    }
}

impl Default for Similarity {
    fn default() -> Self {
        Self(50)
    }
}

impl From<u8> for Similarity {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Similarity> for u8 {
    fn from(value: Similarity) -> Self {
        value.0
    }
}

impl fmt::Display for Similarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Coarse description of a similarity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityBand {
    Conservative,
    Moderate,
    Creative,
}

impl SimilarityBand {
    pub fn label(self) -> &'static str {
        match self {
            SimilarityBand::Conservative => "Conservative changes",
            SimilarityBand::Moderate => "Moderate improvements",
            SimilarityBand::Creative => "Creative rewrite",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SimilarityBand::Conservative => "Minimal changes: fix grammar, improve clarity.",
            SimilarityBand::Moderate => "Balanced: moderate improvements.",
            SimilarityBand::Creative => "Bold rewrite: creative and significant changes.",
        }
    }
}
