//! YouTube scraping for Snakk.
//!
//! Drives the Apify platform to turn channel, playlist, and video URLs into
//! video records with plain-text subtitles attached, and fans a list of
//! sources out into concurrent scrape calls.

mod apify;
mod batch;

pub use apify::ApifyClient;
pub use batch::{BatchResult, BatchScraper, SourceFailure};

use crate::error::Result;
use crate::source::Source;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How scrape runs are issued against the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Start the actor directly, one run per source.
    #[default]
    Direct,
    /// Create a named task per source, run it, and delete it afterwards.
    Task,
}

/// One scraped video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub date: String,
    pub views: u64,
    pub duration: String,
    /// Plain-text subtitles; `None` when the video has none.
    pub subtitles: Option<String>,
    /// Source URL this record was scraped from.
    pub source: String,
}

impl Video {
    /// Whether the video carries usable transcript text.
    pub fn has_transcript(&self) -> bool {
        self.subtitles
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }

    /// Map one dataset item into a video record.
    ///
    /// The actor is loose about field shapes, so every field falls back to a
    /// default rather than failing the whole batch over one odd item.
    pub fn from_dataset_item(item: &serde_json::Value, source: &str) -> Self {
        Self {
            id: item["id"].as_str().unwrap_or_default().to_string(),
            title: item["title"].as_str().unwrap_or("Untitled").to_string(),
            url: item["url"].as_str().unwrap_or_default().to_string(),
            description: item["description"].as_str().unwrap_or_default().to_string(),
            date: item["date"].as_str().unwrap_or_default().to_string(),
            views: item["viewCount"].as_u64().unwrap_or(0),
            duration: item["duration"].as_str().unwrap_or_default().to_string(),
            subtitles: normalize_subtitles(&item["subtitles"]),
            source: source.to_string(),
        }
    }
}

/// Normalize the actor's `subtitles` field into plain text.
///
/// Depending on actor version this arrives as a plain string, a list of
/// per-language tracks, or not at all.
fn normalize_subtitles(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(tracks) => tracks.iter().find_map(|track| {
            track
                .get("plaintext")
                .or_else(|| track.get("srt"))
                .or_else(|| track.get("text"))
                .and_then(|v| v.as_str())
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        }),
        _ => None,
    }
}

/// Scraping backend seam.
///
/// The batch dispatcher only depends on this trait, so tests can drive it
/// with fakes instead of the live platform.
#[async_trait]
pub trait VideoScraper: Send + Sync {
    /// Scrape up to `max_videos` videos from one source URL, newest first.
    ///
    /// In task mode the implementation applies its own time budget and
    /// cleans up any server-side state it created before returning. Direct
    /// calls are bounded by the dispatcher instead.
    async fn scrape_source(
        &self,
        source: &Source,
        max_videos: u32,
        mode: RequestMode,
    ) -> Result<Vec<Video>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_dataset_item_full() {
        let item = json!({
            "id": "abc123def45",
            "title": "My Video",
            "url": "https://www.youtube.com/watch?v=abc123def45",
            "description": "A description",
            "date": "2024-03-01T00:00:00.000Z",
            "viewCount": 1234,
            "duration": "10:05",
            "subtitles": "hello world transcript",
        });

        let video = Video::from_dataset_item(&item, "https://www.youtube.com/@Chan");
        assert_eq!(video.id, "abc123def45");
        assert_eq!(video.title, "My Video");
        assert_eq!(video.views, 1234);
        assert_eq!(video.source, "https://www.youtube.com/@Chan");
        assert_eq!(video.subtitles.as_deref(), Some("hello world transcript"));
        assert!(video.has_transcript());
    }

    #[test]
    fn test_from_dataset_item_sparse() {
        let item = json!({ "id": "xyz" });
        let video = Video::from_dataset_item(&item, "src");
        assert_eq!(video.title, "Untitled");
        assert_eq!(video.views, 0);
        assert!(video.subtitles.is_none());
        assert!(!video.has_transcript());
    }

    #[test]
    fn test_normalize_subtitles_track_list() {
        let value = json!([
            { "language": "en", "plaintext": "first track text" },
            { "language": "de", "plaintext": "zweiter" },
        ]);
        assert_eq!(
            normalize_subtitles(&value).as_deref(),
            Some("first track text")
        );

        let srt_only = json!([{ "language": "en", "srt": "1\n00:00 --> 00:01\nhi" }]);
        assert_eq!(
            normalize_subtitles(&srt_only).as_deref(),
            Some("1\n00:00 --> 00:01\nhi")
        );
    }

    #[test]
    fn test_normalize_subtitles_empty_variants() {
        assert!(normalize_subtitles(&json!(null)).is_none());
        assert!(normalize_subtitles(&json!("")).is_none());
        assert!(normalize_subtitles(&json!("   ")).is_none());
        assert!(normalize_subtitles(&json!([])).is_none());
        assert!(normalize_subtitles(&json!([{ "language": "en" }])).is_none());
    }
}
