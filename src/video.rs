//! Video reference parsing.
//!
//! Extracts the canonical 11-character video id from free-text chat messages
//! and decides whether a message is a video reference or a question for the
//! currently grounded transcript.

use crate::error::{ReferatError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Canonical YouTube video identifier (11 chars of `[0-9A-Za-z_-]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL for this id.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered pattern rules: long-form `v=` parameter first, then the
/// short-link path form.
fn reference_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"v=([0-9A-Za-z_-]{11})").expect("Invalid regex"),
            Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").expect("Invalid regex"),
        ]
    })
}

/// Extract a video id from arbitrary text, trying each pattern rule in order.
///
/// Returns `None` when no rule captures a valid id. Pure function of the
/// input text.
pub fn extract_video_id(text: &str) -> Option<VideoId> {
    for pattern in reference_patterns() {
        if let Some(caps) = pattern.captures(text) {
            return Some(VideoId(caps[1].to_string()));
        }
    }
    None
}

/// How an inbound message should be routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// The message references a video to summarize.
    VideoReference(VideoId),
    /// The message is a question about the current transcript.
    Question,
}

/// Classify an inbound message.
///
/// A message that mentions a YouTube host is treated as a video reference;
/// if no id can be extracted from it, that is an [`ReferatError::InvalidReference`]
/// rather than a question. Everything else is a question.
pub fn classify(text: &str) -> Result<MessageKind> {
    if text.contains("youtube.com") || text.contains("youtu.be") {
        return match extract_video_id(text) {
            Some(id) => Ok(MessageKind::VideoReference(id)),
            None => Err(ReferatError::InvalidReference),
        };
    }
    // Bare "watch?v=..." fragments still parse even without a host mention.
    if let Some(id) = extract_video_id(text) {
        return Ok(MessageKind::VideoReference(id));
    }
    Ok(MessageKind::Question)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
                .map(|v| v.as_str().to_string()),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ").map(|v| v.as_str().to_string()),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("watch?v=dQw4w9WgXcQ&t=5s").map(|v| v.as_str().to_string()),
            Some("dQw4w9WgXcQ".to_string())
        );

        assert_eq!(extract_video_id("hello, how are you?"), None);
        assert_eq!(extract_video_id(""), None);
        // Too-short token after v= is not an id.
        assert_eq!(extract_video_id("v=short"), None);
    }

    #[test]
    fn test_classify_reference() {
        let kind = classify("check this out https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert!(matches!(kind, MessageKind::VideoReference(ref id) if id.as_str() == "dQw4w9WgXcQ"));
    }

    #[test]
    fn test_classify_question() {
        assert_eq!(classify("what was the main point?").unwrap(), MessageKind::Question);
    }

    #[test]
    fn test_classify_broken_link() {
        let err = classify("https://www.youtube.com/watch?v=oops").unwrap_err();
        assert!(matches!(err, ReferatError::InvalidReference));
    }

    #[test]
    fn test_watch_url() {
        let id = extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(id.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }
}
