//! Style preferences and their weighted encoding
//!
//! A [`SelectionState`] records which style chips the user picked. The
//! encoder turns it into the two request fields the rewrite service reads:
//! the flat `chips` object and the weighted `chipWeights` object.
//!
//! Single-choice categories carry full weight. The tone category is
//! multi-choice and order-sensitive: earlier picks matter more, and the
//! weight of a value is derived from its position only, so removing an
//! earlier pick promotes everything after it.

mod catalog;
mod similarity;

pub use catalog::{category_options, is_known_value, ChipOption};
pub use similarity::{Similarity, SimilarityBand};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Weight of the fourth multi-choice pick; later picks decay from here
const TAIL_BASE_WEIGHT: f64 = 0.4;
/// Per-position decay factor after the third pick
const TAIL_DECAY: f64 = 0.7;
/// Floor so that late picks are never dropped entirely
const MIN_WEIGHT: f64 = 0.05;

/// Style dimensions that accept at most one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SingleCategory {
    ContentType,
    Industry,
    Generation,
    Length,
    SocialPlatform,
    PostCount,
}

impl SingleCategory {
    pub const ALL: [SingleCategory; 6] = [
        SingleCategory::ContentType,
        SingleCategory::Industry,
        SingleCategory::Generation,
        SingleCategory::Length,
        SingleCategory::SocialPlatform,
        SingleCategory::PostCount,
    ];

    /// Wire identifier used in request payloads
    pub fn id(self) -> &'static str {
        match self {
            SingleCategory::ContentType => "contentType",
            SingleCategory::Industry => "industry",
            SingleCategory::Generation => "generation",
            SingleCategory::Length => "length",
            SingleCategory::SocialPlatform => "socialPlatform",
            SingleCategory::PostCount => "postCount",
        }
    }
}

/// Style dimensions that accept several ordered values
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MultiCategory {
    Tone,
}

impl MultiCategory {
    pub const ALL: [MultiCategory; 1] = [MultiCategory::Tone];

    /// Wire identifier used in request payloads
    pub fn id(self) -> &'static str {
        match self {
            MultiCategory::Tone => "tone",
        }
    }
}

/// Any style category, tagged with its selection kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Single(SingleCategory),
    Multi(MultiCategory),
}

impl Category {
    /// All categories in display order
    pub fn all() -> impl Iterator<Item = Category> {
        SingleCategory::ALL
            .into_iter()
            .map(Category::Single)
            .chain(MultiCategory::ALL.into_iter().map(Category::Multi))
    }

    pub fn id(self) -> &'static str {
        match self {
            Category::Single(c) => c.id(),
            Category::Multi(c) => c.id(),
        }
    }

    pub fn is_multi(self) -> bool {
        matches!(self, Category::Multi(_))
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        catalog::category_label(self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Raised when a category id does not name a known category
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown chip category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        let category = match id {
            "contentType" | "content-type" | "content_type" | "platform" => {
                Category::Single(SingleCategory::ContentType)
            }
            "industry" => Category::Single(SingleCategory::Industry),
            "generation" | "vibe" => Category::Single(SingleCategory::Generation),
            "length" => Category::Single(SingleCategory::Length),
            "socialPlatform" | "social-platform" | "social_platform" => {
                Category::Single(SingleCategory::SocialPlatform)
            }
            "postCount" | "post-count" | "post_count" => Category::Single(SingleCategory::PostCount),
            "tone" | "personality" => Category::Multi(MultiCategory::Tone),
            _ => return Err(UnknownCategory(id.to_string())),
        };
        Ok(category)
    }
}

/// The user's current style configuration
///
/// Invariants: a single-choice category holds at most one non-empty value,
/// and a multi-choice sequence never contains the same value twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawSelection")]
pub struct SelectionState {
    single_choice: BTreeMap<SingleCategory, String>,
    multi_choice: BTreeMap<MultiCategory, Vec<String>>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection from `category=value` pairs, applied as toggles in order
    ///
    /// Pairs with an unknown category or without a value are skipped.
    pub fn from_chip_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some((key, value)) = arg.split_once('=') else {
                tracing::warn!("Ignoring chip without a value: {}", arg);
                continue;
            };
            match key.parse::<Category>() {
                Ok(category) => {
                    let value = value.trim();
                    if !is_known_value(category, value) {
                        tracing::warn!("Chip value '{}' is not in the {} catalog", value, category);
                    }
                    selection.toggle(category, value);
                }
                Err(err) => tracing::warn!("{}", err),
            }
        }
        selection
    }

    /// Toggle a value in any category
    ///
    /// Returns true when the value is selected after the call.
    pub fn toggle(&mut self, category: Category, value: impl Into<String>) -> bool {
        match category {
            Category::Single(c) => self.toggle_single(c, value),
            Category::Multi(c) => self.toggle_multi(c, value),
        }
    }

    /// Select a single-choice value, or clear it when it is already selected
    pub fn toggle_single(&mut self, category: SingleCategory, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.is_empty() {
            return false;
        }
        if self.single_choice.get(&category) == Some(&value) {
            self.single_choice.remove(&category);
            false
        } else {
            self.single_choice.insert(category, value);
            true
        }
    }

    /// Append a multi-choice value, or remove it when it is already selected
    pub fn toggle_multi(&mut self, category: MultiCategory, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.is_empty() {
            return false;
        }
        let values = self.multi_choice.entry(category).or_default();
        if let Some(index) = values.iter().position(|v| *v == value) {
            values.remove(index);
            if values.is_empty() {
                self.multi_choice.remove(&category);
            }
            false
        } else {
            values.push(value);
            true
        }
    }

    /// Remove every value of a category
    pub fn clear_category(&mut self, category: Category) {
        match category {
            Category::Single(c) => {
                self.single_choice.remove(&c);
            }
            Category::Multi(c) => {
                self.multi_choice.remove(&c);
            }
        }
    }

    pub fn single(&self, category: SingleCategory) -> Option<&str> {
        self.single_choice.get(&category).map(String::as_str)
    }

    /// Values of a multi-choice category in selection order
    pub fn multi(&self, category: MultiCategory) -> &[String] {
        self.multi_choice
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.single_choice.is_empty() && self.multi_choice.values().all(Vec::is_empty)
    }

    /// Short `category=value` summary, multi values joined with `+`
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = self
            .single_choice
            .iter()
            .map(|(c, v)| format!("{}={}", c.id(), v))
            .collect();
        parts.extend(
            self.multi_choice
                .iter()
                .filter(|(_, values)| !values.is_empty())
                .map(|(c, values)| format!("{}={}", c.id(), values.join("+"))),
        );
        parts.join(", ")
    }
}

/// Untyped shape accepted when deserializing a selection
///
/// Unknown categories and malformed values are dropped instead of failing,
/// so a stale or hand-edited snapshot still loads.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawSelection {
    single_choice: BTreeMap<String, Value>,
    multi_choice: BTreeMap<String, Value>,
}

impl From<RawSelection> for SelectionState {
    fn from(raw: RawSelection) -> Self {
        let mut selection = SelectionState::new();

        for (key, value) in raw.single_choice {
            let (Ok(Category::Single(category)), Value::String(value)) = (key.parse::<Category>(), value)
            else {
                tracing::debug!("Dropping single-choice entry '{}'", key);
                continue;
            };
            if !value.is_empty() {
                selection.single_choice.insert(category, value);
            }
        }

        for (key, value) in raw.multi_choice {
            let (Ok(Category::Multi(category)), Value::Array(values)) = (key.parse::<Category>(), value)
            else {
                tracing::debug!("Dropping multi-choice entry '{}'", key);
                continue;
            };
            for value in values {
                if let Value::String(value) = value {
                    if !selection.multi(category).contains(&value) {
                        selection.toggle_multi(category, value);
                    }
                }
            }
        }

        selection
    }
}

/// One value with its relative importance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighted {
    pub value: String,
    pub weight: f64,
}

/// Weighted entry for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightedChoice {
    One(Weighted),
    Many(Vec<Weighted>),
}

/// Derived, read-only weighted view of a selection (`chipWeights` on the wire)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedSelection(BTreeMap<String, WeightedChoice>);

impl WeightedSelection {
    pub fn get(&self, category: Category) -> Option<&WeightedChoice> {
        self.0.get(category.id())
    }

    /// Weights of a multi-choice category in position order
    pub fn weights(&self, category: MultiCategory) -> Vec<f64> {
        match self.0.get(category.id()) {
            Some(WeightedChoice::Many(values)) => values.iter().map(|w| w.weight).collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Flat chip value (`chips` on the wire)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChipValue {
    One(String),
    Many(Vec<String>),
}

/// Flat `category id -> value(s)` map sent alongside the weights
pub type Chips = BTreeMap<String, ChipValue>;

/// Weight for the value at `position` (0-based) of a multi-choice sequence
pub fn positional_weight(position: usize) -> f64 {
    let raw = match position {
        0 => 1.0,
        1 => 0.8,
        2 => 0.6,
        p => {
            let exponent = i32::try_from(p - 3).unwrap_or(i32::MAX);
            (TAIL_BASE_WEIGHT * TAIL_DECAY.powi(exponent)).max(MIN_WEIGHT)
        }
    };
    round2(raw)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Encode a selection into its weighted request form
///
/// Single-choice values get weight 1. Multi-choice values are weighted by
/// position. Empty sequences and absent categories produce no key.
pub fn encode(selection: &SelectionState) -> WeightedSelection {
    let mut out = BTreeMap::new();

    for (category, value) in &selection.single_choice {
        out.insert(
            category.id().to_string(),
            WeightedChoice::One(Weighted {
                value: value.clone(),
                weight: 1.0,
            }),
        );
    }

    for (category, values) in &selection.multi_choice {
        if values.is_empty() {
            continue;
        }
        let weighted = values
            .iter()
            .enumerate()
            .map(|(position, value)| Weighted {
                value: value.clone(),
                weight: positional_weight(position),
            })
            .collect();
        out.insert(category.id().to_string(), WeightedChoice::Many(weighted));
    }

    WeightedSelection(out)
}

/// Flatten a selection into the `chips` object
///
/// Multi-choice entries are written first so a single-choice value wins on
/// a key collision.
pub fn flatten_chips(selection: &SelectionState) -> Chips {
    let mut chips = Chips::new();
    for (category, values) in &selection.multi_choice {
        if !values.is_empty() {
            chips.insert(category.id().to_string(), ChipValue::Many(values.clone()));
        }
    }
    for (category, value) in &selection.single_choice {
        chips.insert(category.id().to_string(), ChipValue::One(value.clone()));
    }
    chips
}
