//! Content type detection
//!
//! A keyword and length heuristic that guesses what kind of copy the user
//! pasted, so the CLI can suggest a content type before a rewrite.

use serde::Serialize;
use std::fmt;

/// Texts shorter than this (in characters) are not analyzed
const MIN_CHARS: usize = 10;
/// A guess must score above this to be reported
const MIN_CONFIDENCE: u8 = 40;

const KEYWORD_POINTS: u32 = 20;
const CHARACTERISTIC_POINTS: u32 = 30;
const LENGTH_BAND_POINTS: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedType {
    Social,
    Email,
    Blog,
    Webpage,
}

impl DetectedType {
    /// Candidates in tie-break order
    pub const ALL: [DetectedType; 4] = [
        DetectedType::Social,
        DetectedType::Email,
        DetectedType::Blog,
        DetectedType::Webpage,
    ];

    /// Content type value sent to the rewrite service
    pub fn id(self) -> &'static str {
        match self {
            DetectedType::Social => "social",
            DetectedType::Email => "email",
            DetectedType::Blog => "blog",
            DetectedType::Webpage => "webpage",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DetectedType::Social => "Social Media",
            DetectedType::Email => "Email",
            DetectedType::Blog => "Blog Post",
            DetectedType::Webpage => "Web Page",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            DetectedType::Social => &[
                "follow", "like", "share", "hashtag", "#", "@", "dm", "story", "post", "viral",
                "trending",
            ],
            DetectedType::Email => &[
                "subject",
                "dear",
                "sincerely",
                "regards",
                "unsubscribe",
                "inbox",
                "reply",
                "forward",
            ],
            DetectedType::Blog => &[
                "introduction",
                "conclusion",
                "paragraph",
                "section",
                "article",
                "readers",
                "subscribe",
            ],
            DetectedType::Webpage => &[
                "welcome",
                "about us",
                "services",
                "contact",
                "home",
                "navigation",
                "menu",
                "learn more",
            ],
        }
    }

    /// Structural trait typical of this kind of copy
    fn has_characteristic(self, text: &str, words: usize) -> bool {
        match self {
            DetectedType::Social => words < 50,
            DetectedType::Email => text.contains("\n\n") || words > 100,
            DetectedType::Blog => words > 200,
            DetectedType::Webpage => words > 20 && words < 150,
        }
    }

    fn in_length_band(self, words: usize) -> bool {
        match self {
            DetectedType::Social => words < 30,
            DetectedType::Email => words > 50 && words < 300,
            DetectedType::Blog => words > 150,
            DetectedType::Webpage => words > 20 && words < 100,
        }
    }

    fn score(self, text: &str, lowercase: &str, words: usize) -> u8 {
        let matched = self
            .keywords()
            .iter()
            .filter(|keyword| lowercase.contains(*keyword))
            .count();
        let mut score = u32::try_from(matched).unwrap_or(u32::MAX).saturating_mul(KEYWORD_POINTS);
        if self.has_characteristic(text, words) {
            score = score.saturating_add(CHARACTERISTIC_POINTS);
        }
        if self.in_length_band(words) {
            score = score.saturating_add(LENGTH_BAND_POINTS);
        }
        u8::try_from(score.min(100)).unwrap_or(100)
    }
}

impl fmt::Display for DetectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A content type guess with its confidence (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub kind: DetectedType,
    pub confidence: u8,
}

/// Guess the content type of `text`
///
/// Returns `None` for short texts or when no candidate is confident enough.
pub fn detect_content_type(text: &str) -> Option<Detection> {
    if text.chars().count() < MIN_CHARS {
        return None;
    }

    let lowercase = text.to_lowercase();
    let words = text.split_whitespace().count();

    let mut best: Option<Detection> = None;
    for kind in DetectedType::ALL {
        let confidence = kind.score(text, &lowercase, words);
        tracing::trace!("Content score {}: {}", kind, confidence);
        if best.map_or(true, |b| confidence > b.confidence) {
            best = Some(Detection { kind, confidence });
        }
    }

    best.filter(|b| b.confidence > MIN_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_ignored() {
        assert_eq!(detect_content_type("hi #yolo"), None);
        assert_eq!(detect_content_type(""), None);
    }

    #[test]
    fn test_detects_social_post() {
        let detection = detect_content_type("Follow us and share the news! #launch").unwrap();
        assert_eq!(detection.kind, DetectedType::Social);
        // follow, share, hashtag symbol + short text + very short text
        assert_eq!(detection.confidence, 100);
    }

    #[test]
    fn test_detects_email() {
        let body = "word ".repeat(60);
        let text = format!("Dear team,\n\n{}\n\nKind regards,\nSam", body);
        let detection = detect_content_type(&text).unwrap();
        assert_eq!(detection.kind, DetectedType::Email);
    }

    #[test]
    fn test_detects_blog() {
        let text = format!(
            "Introduction. {} In conclusion, thanks to our readers.",
            "lorem ipsum ".repeat(120)
        );
        let detection = detect_content_type(&text).unwrap();
        assert_eq!(detection.kind, DetectedType::Blog);
        assert_eq!(detection.confidence, 100);
    }

    #[test]
    fn test_length_alone_can_decide() {
        // 40 words, no keywords: social 30, webpage 55 wins
        let text = "plain ".repeat(40);
        let detection = detect_content_type(&text).unwrap();
        assert_eq!(detection.kind, DetectedType::Webpage);
        assert_eq!(detection.confidence, 55);

        // 12 words, no keywords: social scores 55 from length alone
        let text = "plain ".repeat(12);
        assert_eq!(detect_content_type(&text).unwrap().kind, DetectedType::Social);

        // 320 words without keywords: blog 55, email 30
        let text = "plain ".repeat(320);
        assert_eq!(detect_content_type(&text).unwrap().kind, DetectedType::Blog);
    }

    #[test]
    fn test_ties_prefer_earlier_candidates() {
        // 250 words without keywords: email and blog both score 55
        let text = "plain ".repeat(250);
        let detection = detect_content_type(&text).unwrap();
        assert_eq!(detection.kind, DetectedType::Email);
        assert_eq!(detection.confidence, 55);
    }
}
