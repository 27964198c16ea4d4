//! Error types for Referat.

use thiserror::Error;

/// Why a transcript could not be retrieved for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableReason {
    /// The video has captions disabled (or no caption tracks at all).
    Disabled,
    /// The video or a usable caption track does not exist.
    NotFound,
    /// The transcript source could not be reached or answered with an error.
    Service,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailableReason::Disabled => write!(f, "disabled"),
            UnavailableReason::NotFound => write!(f, "not found"),
            UnavailableReason::Service => write!(f, "service error"),
        }
    }
}

/// Library-level error type for Referat operations.
#[derive(Error, Debug)]
pub enum ReferatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Message contains no parseable video reference")]
    InvalidReference,

    #[error("Transcript unavailable ({reason}): {detail}")]
    TranscriptUnavailable {
        reason: UnavailableReason,
        detail: String,
    },

    #[error("No video has been processed in this conversation yet")]
    NoActiveTranscript,

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ReferatError {
    /// Shorthand for a classified retrieval failure.
    pub fn unavailable(reason: UnavailableReason, detail: impl Into<String>) -> Self {
        ReferatError::TranscriptUnavailable {
            reason,
            detail: detail.into(),
        }
    }
}

/// Result type alias for Referat operations.
pub type Result<T> = std::result::Result<T, ReferatError>;
