//! Transcript retrieval for Referat.
//!
//! A [`CaptionSource`] exposes the upstream capabilities (list caption tracks,
//! fetch entries, fetch translated entries); [`TranscriptRetriever`] layers the
//! language-fallback policy on top and normalizes the timestamped entries into
//! a single text blob. Retrieval failures are classified and never retried —
//! a failed attempt at each fallback stage is terminal.

mod youtube;

pub use youtube::YoutubeCaptionSource;

use crate::error::{ReferatError, Result, UnavailableReason};
use crate::video::VideoId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A single timestamped caption fragment as delivered by the source.
///
/// Entries arrive in time order; the timestamps are only used upstream and are
/// discarded during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionEntry {
    /// Caption text.
    pub text: String,
    /// Offset from the start of the video, in seconds.
    pub start: f64,
    /// Duration of the fragment, in seconds.
    pub dur: f64,
}

/// A normalized, timestamp-free transcript. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    /// Reduce an ordered entry sequence to continuous text: blank entries are
    /// dropped, the rest are trimmed and joined with single spaces.
    pub fn from_entries(entries: &[CaptionEntry]) -> Self {
        let text = entries
            .iter()
            .map(|e| e.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self { text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }
}

/// An available caption track for a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// BCP-47-ish language code as reported by the source (e.g. "en", "ru").
    pub language: String,
    /// Opaque source-specific locator used to fetch the entries.
    pub base_url: String,
    /// Whether the source can translate this track into other languages.
    pub translatable: bool,
}

/// Upstream transcript source boundary.
///
/// Each call may fail independently; failures are classified by the
/// implementation and treated as terminal by the caller.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    /// List the caption tracks available for a video.
    ///
    /// A video with captions disabled yields
    /// [`UnavailableReason::Disabled`], a missing video
    /// [`UnavailableReason::NotFound`].
    async fn list_tracks(&self, video: &VideoId) -> Result<Vec<CaptionTrack>>;

    /// Fetch the timestamped entries of a track in its own language.
    async fn fetch_entries(&self, track: &CaptionTrack) -> Result<Vec<CaptionEntry>>;

    /// Fetch the entries of a track translated into `language`, using the
    /// source's own translation capability.
    async fn fetch_translated(
        &self,
        track: &CaptionTrack,
        language: &str,
    ) -> Result<Vec<CaptionEntry>>;
}

/// Retrieves transcripts with an ordered language-fallback policy.
pub struct TranscriptRetriever<S> {
    source: S,
    target_language: String,
    fallback_language: String,
}

impl<S: CaptionSource> TranscriptRetriever<S> {
    /// Create a retriever preferring `target_language`, falling back to a
    /// `fallback_language` track translated into the target.
    pub fn new(
        source: S,
        target_language: impl Into<String>,
        fallback_language: impl Into<String>,
    ) -> Self {
        Self {
            source,
            target_language: target_language.into(),
            fallback_language: fallback_language.into(),
        }
    }

    /// Fetch and normalize a transcript for `video`.
    ///
    /// Policy: target-language track first; else a translatable
    /// fallback-language track, translated into the target; else
    /// [`ReferatError::TranscriptUnavailable`]. No stage is retried.
    #[instrument(skip(self), fields(video = %video))]
    pub async fn fetch(&self, video: &VideoId) -> Result<Transcript> {
        let tracks = self.source.list_tracks(video).await?;
        debug!("Found {} caption track(s)", tracks.len());

        if tracks.is_empty() {
            return Err(ReferatError::unavailable(
                UnavailableReason::Disabled,
                format!("video {} has no caption tracks", video),
            ));
        }

        let entries = if let Some(track) = tracks
            .iter()
            .find(|t| t.language == self.target_language)
        {
            info!("Using {} caption track", track.language);
            self.source.fetch_entries(track).await?
        } else if let Some(track) = tracks
            .iter()
            .find(|t| t.language == self.fallback_language && t.translatable)
        {
            info!(
                "Translating {} caption track to {}",
                track.language, self.target_language
            );
            self.source
                .fetch_translated(track, &self.target_language)
                .await?
        } else {
            return Err(ReferatError::unavailable(
                UnavailableReason::NotFound,
                format!(
                    "video {} has no {} or translatable {} caption track",
                    video, self.target_language, self.fallback_language
                ),
            ));
        };

        let transcript = Transcript::from_entries(&entries);
        info!(
            "Normalized transcript: {} entries, {} chars",
            entries.len(),
            transcript.len()
        );
        Ok(transcript)
    }
}
