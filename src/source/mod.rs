//! Source URL classification for Snakk.
//!
//! Tags each input URL as a channel, playlist, or single video before it is
//! dispatched to the scraper. Classification is pure string inspection with
//! no network access: anything that does not match a known YouTube shape is
//! tagged `Unknown` and excluded from dispatch.

use crate::error::{Result, SnakkError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Kind of YouTube source a URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Channel,
    Playlist,
    Video,
    Unknown,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Channel => write!(f, "channel"),
            SourceKind::Playlist => write!(f, "playlist"),
            SourceKind::Video => write!(f, "video"),
            SourceKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// One input URL with its classification attached.
///
/// Immutable once built; the kind never changes after classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub kind: SourceKind,
}

impl Source {
    /// Classify a raw URL string into a source.
    pub fn classify(raw: &str) -> Self {
        Self {
            url: raw.trim().to_string(),
            kind: classify(raw),
        }
    }

    /// Whether this source has a shape the scraper understands.
    pub fn is_scrapeable(&self) -> bool {
        self.kind != SourceKind::Unknown
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.url, self.kind)
    }
}

fn is_youtube_host(host: &str) -> bool {
    let h = host.to_ascii_lowercase();
    h == "youtube.com" || h == "youtu.be" || h.ends_with(".youtube.com")
}

/// Classify a URL string.
///
/// Total and deterministic: never fails, unrecognized input comes back
/// as [`SourceKind::Unknown`].
pub fn classify(raw: &str) -> SourceKind {
    let parsed = match Url::parse(raw.trim()) {
        Ok(u) => u,
        Err(_) => return SourceKind::Unknown,
    };

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return SourceKind::Unknown;
    }

    let host = match parsed.host_str() {
        Some(h) if is_youtube_host(h) => h.to_ascii_lowercase(),
        _ => return SourceKind::Unknown,
    };

    // youtu.be/<id> is always a single video.
    if host == "youtu.be" {
        let has_id = parsed
            .path_segments()
            .and_then(|mut segs| segs.next())
            .map(|seg| !seg.trim().is_empty())
            .unwrap_or(false);
        return if has_id {
            SourceKind::Video
        } else {
            SourceKind::Unknown
        };
    }

    let mut segments = parsed.path_segments().into_iter().flatten();
    let first = segments.next().unwrap_or("");
    let second = segments.next().unwrap_or("");

    match first {
        // watch?v=<id>; a trailing list= parameter does not change the kind.
        "watch" => {
            if query_has(&parsed, "v") {
                SourceKind::Video
            } else {
                SourceKind::Unknown
            }
        }
        "shorts" | "embed" | "v" if !second.trim().is_empty() => SourceKind::Video,
        "playlist" => {
            if query_has(&parsed, "list") {
                SourceKind::Playlist
            } else {
                SourceKind::Unknown
            }
        }
        "c" | "channel" | "user" if !second.trim().is_empty() => SourceKind::Channel,
        handle if handle.starts_with('@') && handle.len() > 1 => SourceKind::Channel,
        _ => SourceKind::Unknown,
    }
}

fn query_has(url: &Url, key: &str) -> bool {
    url.query_pairs()
        .any(|(k, v)| k == key && !v.trim().is_empty())
}

/// Read a URLs file: one URL per line, blank lines and `#`-prefixed
/// comment lines ignored.
pub fn read_urls_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SnakkError::InvalidInput(format!("Could not read URLs file {}: {}", path.display(), e))
    })?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        return Err(SnakkError::InvalidInput(format!(
            "No URLs found in {}",
            path.display()
        )));
    }

    Ok(urls)
}
