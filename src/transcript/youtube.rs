//! YouTube caption source implementation.
//!
//! Scrapes the watch page for the player's caption-track metadata and fetches
//! the timed-text XML for a selected track. Translation uses YouTube's own
//! `tlang` parameter on the track URL.

use super::{CaptionEntry, CaptionSource, CaptionTrack};
use crate::error::{ReferatError, Result, UnavailableReason};
use crate::video::VideoId;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

const WATCH_PAGE_TIMEOUT_SECS: u64 = 30;

/// Caption track entry as embedded in the player response JSON.
#[derive(Debug, Deserialize)]
struct RawTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    #[serde(rename = "isTranslatable", default)]
    is_translatable: bool,
}

/// YouTube caption source backed by the public watch page.
pub struct YoutubeCaptionSource {
    client: reqwest::Client,
}

impl YoutubeCaptionSource {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(WATCH_PAGE_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Use a pre-configured HTTP client (proxy, custom timeouts).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_watch_page(&self, video: &VideoId) -> Result<String> {
        let response = self
            .client
            .get(video.watch_url())
            // Skips the consent interstitial served in some regions.
            .header("Accept-Language", "en-US")
            .header("Cookie", "CONSENT=YES+1")
            .send()
            .await
            .map_err(|e| {
                ReferatError::unavailable(UnavailableReason::Service, e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(ReferatError::unavailable(
                UnavailableReason::Service,
                format!("watch page returned HTTP {}", response.status()),
            ));
        }

        response.text().await.map_err(|e| {
            ReferatError::unavailable(UnavailableReason::Service, e.to_string())
        })
    }

    async fn fetch_timedtext(&self, url: &str) -> Result<Vec<CaptionEntry>> {
        let response = self.client.get(url).send().await.map_err(|e| {
            ReferatError::unavailable(UnavailableReason::Service, e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(ReferatError::unavailable(
                UnavailableReason::Service,
                format!("timed-text endpoint returned HTTP {}", response.status()),
            ));
        }

        let body = response.text().await.map_err(|e| {
            ReferatError::unavailable(UnavailableReason::Service, e.to_string())
        })?;

        Ok(parse_timedtext(&body))
    }
}

impl Default for YoutubeCaptionSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptionSource for YoutubeCaptionSource {
    async fn list_tracks(&self, video: &VideoId) -> Result<Vec<CaptionTrack>> {
        let page = self.fetch_watch_page(video).await?;
        let tracks = extract_caption_tracks(&page, video)?;
        debug!(
            "Video {}: {} caption track(s) advertised",
            video,
            tracks.len()
        );
        Ok(tracks)
    }

    async fn fetch_entries(&self, track: &CaptionTrack) -> Result<Vec<CaptionEntry>> {
        self.fetch_timedtext(&track.base_url).await
    }

    async fn fetch_translated(
        &self,
        track: &CaptionTrack,
        language: &str,
    ) -> Result<Vec<CaptionEntry>> {
        let url = format!("{}&tlang={}", track.base_url, language);
        self.fetch_timedtext(&url).await
    }
}

/// Pull the `captionTracks` array out of the embedded player response.
///
/// The watch page inlines the player JSON; rather than parsing the whole
/// document we locate the array and hand it to serde. A page without the
/// marker is a video with captions disabled (or no video at all).
fn extract_caption_tracks(page: &str, video: &VideoId) -> Result<Vec<CaptionTrack>> {
    const MARKER: &str = "\"captionTracks\":";

    let Some(pos) = page.find(MARKER) else {
        if page.contains("\"status\":\"ERROR\"") || !page.contains("\"playabilityStatus\"") {
            return Err(ReferatError::unavailable(
                UnavailableReason::NotFound,
                format!("video {} is unavailable", video),
            ));
        }
        return Err(ReferatError::unavailable(
            UnavailableReason::Disabled,
            format!("video {} has captions disabled", video),
        ));
    };

    // The stream deserializer stops at the end of the array, ignoring the
    // rest of the page.
    let tail = &page[pos + MARKER.len()..];
    let raw: Vec<RawTrack> = serde_json::Deserializer::from_str(tail)
        .into_iter()
        .next()
        .ok_or_else(|| {
            ReferatError::unavailable(
                UnavailableReason::Service,
                "caption track metadata is truncated",
            )
        })?
        .map_err(|e| {
            ReferatError::unavailable(
                UnavailableReason::Service,
                format!("caption track metadata did not parse: {}", e),
            )
        })?;

    Ok(raw
        .into_iter()
        .map(|t| CaptionTrack {
            language: t.language_code,
            // The page embeds the URL with JSON escaping applied.
            base_url: t.base_url.replace("\\u0026", "&"),
            translatable: t.is_translatable,
        })
        .collect())
}

fn text_node_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<text start="([\d.]+)" dur="([\d.]+)"[^>]*>(.*?)</text>"#)
            .expect("Invalid regex")
    })
}

/// Parse timed-text XML (`<text start=".." dur="..">..</text>` nodes) into
/// ordered caption entries. Nodes with unparseable timestamps are skipped.
fn parse_timedtext(xml: &str) -> Vec<CaptionEntry> {
    text_node_regex()
        .captures_iter(xml)
        .filter_map(|caps| {
            let start: f64 = caps[1].parse().ok()?;
            let dur: f64 = caps[2].parse().ok()?;
            Some(CaptionEntry {
                text: unescape_entities(&caps[3]),
                start,
                dur,
            })
        })
        .collect()
}

/// Decode the named and numeric entities YouTube emits in caption text.
fn unescape_entities(text: &str) -> String {
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    let numeric = NUMERIC.get_or_init(|| Regex::new(r"&#(\d+);").expect("Invalid regex"));

    let text = numeric.replace_all(text, |caps: &regex::Captures| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> VideoId {
        crate::video::extract_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap()
    }

    #[test]
    fn test_parse_timedtext() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript>
            <text start="0.0" dur="2.5">Hello</text>
            <text start="2.5" dur="3.0">world &amp; friends</text>
            <text start="5.5" dur="1.0"></text>
        </transcript>"#;

        let entries = parse_timedtext(xml);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].text, "Hello");
        assert_eq!(entries[0].start, 0.0);
        assert_eq!(entries[1].text, "world & friends");
        assert_eq!(entries[1].dur, 3.0);
        assert_eq!(entries[2].text, "");
    }

    #[test]
    fn test_unescape_entities() {
        assert_eq!(unescape_entities("it&#39;s &quot;fine&quot;"), "it's \"fine\"");
        assert_eq!(unescape_entities("a &lt;b&gt; c"), "a <b> c");
        assert_eq!(unescape_entities("plain"), "plain");
    }

    #[test]
    fn test_extract_caption_tracks() {
        let page = r#"stuff "playabilityStatus":{"status":"OK"} more
            "captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[
                {"baseUrl":"https://www.youtube.com/api/timedtext?v=x&lang=en","languageCode":"en","isTranslatable":true},
                {"baseUrl":"https://www.youtube.com/api/timedtext?v=x&lang=ru","languageCode":"ru","isTranslatable":false}
            ],"audioTracks":[]}} tail"#;

        let tracks = extract_caption_tracks(page, &video()).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].language, "en");
        assert!(tracks[0].translatable);
        assert!(tracks[0].base_url.contains("&lang=en"));
        assert!(!tracks[1].translatable);
    }

    #[test]
    fn test_disabled_captions_classified() {
        let page = r#"stuff "playabilityStatus":{"status":"OK"} no captions here"#;
        let err = extract_caption_tracks(page, &video()).unwrap_err();
        assert!(matches!(
            err,
            ReferatError::TranscriptUnavailable {
                reason: UnavailableReason::Disabled,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_video_classified() {
        let page = r#"nothing useful at all"#;
        let err = extract_caption_tracks(page, &video()).unwrap_err();
        assert!(matches!(
            err,
            ReferatError::TranscriptUnavailable {
                reason: UnavailableReason::NotFound,
                ..
            }
        ));
    }
}
