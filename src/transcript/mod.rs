//! Transcript materialization.
//!
//! Turns aggregated video records into one plain-text document per video
//! plus a JSON metadata summary of the batch. Formatting only; videos
//! without subtitles are counted and skipped, never treated as errors.

use crate::error::Result;
use crate::scraper::Video;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const METADATA_FILENAME: &str = "metadata.json";
const MAX_TITLE_LENGTH: usize = 50;

/// Batch summary written next to the transcript documents.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub total_videos: usize,
    pub transcripts_written: usize,
    pub skipped_no_subtitles: usize,
    pub processed_at: DateTime<Utc>,
    pub videos: Vec<VideoMetadata>,
}

/// Per-video entry in the metadata summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub had_transcript: bool,
}

/// Outcome of materializing one batch.
#[derive(Debug, Default)]
pub struct MaterializeSummary {
    /// Paths of the documents written, in input order.
    pub written: Vec<PathBuf>,
    /// Videos skipped because they carried no subtitles.
    pub skipped_no_subtitles: usize,
}

/// Writes transcript documents into a flat output directory.
pub struct TranscriptWriter {
    output_dir: PathBuf,
}

impl TranscriptWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Write one document per video that has transcript text.
    pub fn write_all(&self, videos: &[Video]) -> Result<MaterializeSummary> {
        std::fs::create_dir_all(&self.output_dir)?;

        let mut summary = MaterializeSummary::default();

        for video in videos {
            if !video.has_transcript() {
                debug!("No subtitles for '{}', skipping", video.title);
                summary.skipped_no_subtitles += 1;
                continue;
            }

            let path = self.write_one(video)?;
            summary.written.push(path);
        }

        info!(
            "Materialized {} transcript(s), {} video(s) had no subtitles",
            summary.written.len(),
            summary.skipped_no_subtitles
        );
        Ok(summary)
    }

    /// Write a single video's document and return its path.
    pub fn write_one(&self, video: &Video) -> Result<PathBuf> {
        let stem = format!(
            "{}_{}",
            sanitize_filename(&video.title, MAX_TITLE_LENGTH),
            video.id
        );
        let path = self.unique_path(&stem);

        std::fs::write(&path, format_document(video))?;
        debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Write the batch metadata summary, returning its path.
    pub fn save_metadata(&self, videos: &[Video]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let with_transcripts = videos.iter().filter(|v| v.has_transcript()).count();
        let metadata = BatchMetadata {
            total_videos: videos.len(),
            transcripts_written: with_transcripts,
            skipped_no_subtitles: videos.len() - with_transcripts,
            processed_at: Utc::now(),
            videos: videos
                .iter()
                .map(|v| VideoMetadata {
                    id: v.id.clone(),
                    title: v.title.clone(),
                    url: v.url.clone(),
                    source: v.source.clone(),
                    had_transcript: v.has_transcript(),
                })
                .collect(),
        };

        let path = self.output_dir.join(METADATA_FILENAME);
        std::fs::write(&path, serde_json::to_string_pretty(&metadata)?)?;
        info!("Saved metadata to {}", path.display());
        Ok(path)
    }

    /// All transcript documents currently in the output directory, sorted.
    pub fn transcript_files(&self) -> Result<Vec<PathBuf>> {
        if !self.output_dir.exists() {
            return Ok(vec![]);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.output_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("txt"))
            .collect();
        files.sort();
        Ok(files)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Pick a path for `stem`.txt, appending a numeric suffix on collision.
    fn unique_path(&self, stem: &str) -> PathBuf {
        let candidate = self.output_dir.join(format!("{}.txt", stem));
        if !candidate.exists() {
            return candidate;
        }

        let mut n = 2;
        loop {
            let candidate = self.output_dir.join(format!("{}_{}.txt", stem, n));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Render one video as an upload-ready document.
fn format_document(video: &Video) -> String {
    let transcript = video.subtitles.as_deref().unwrap_or_default();
    format!(
        "# {}\n\n**URL:** {}\n**Date:** {}\n**Views:** {}\n**Duration:** {}\n\n\
         ## Description\n\n{}\n\n## Transcript\n\n{}\n\n---\nVideo ID: {}\n",
        video.title,
        video.url,
        video.date,
        format_views(video.views),
        video.duration,
        video.description,
        transcript,
        video.id,
    )
}

/// Strip filesystem-hostile characters and cap the length.
fn sanitize_filename(title: &str, max_length: usize) -> String {
    title
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .map(|c| if c == ' ' { '_' } else { c })
        .take(max_length)
        .collect()
}

/// Format a count with thousands separators.
fn format_views(views: u64) -> String {
    let digits = views.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, title: &str, subtitles: Option<&str>) -> Video {
        Video {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://www.youtube.com/watch?v={}", id),
            description: "About things.".to_string(),
            date: "2024-03-01".to_string(),
            views: 1234567,
            duration: "10:05".to_string(),
            subtitles: subtitles.map(str::to_string),
            source: "https://www.youtube.com/@Chan".to_string(),
        }
    }

    #[test]
    fn test_format_document() {
        let doc = format_document(&video("abc", "My Video", Some("hello world")));
        let expected = "# My Video\n\n\
                        **URL:** https://www.youtube.com/watch?v=abc\n\
                        **Date:** 2024-03-01\n\
                        **Views:** 1,234,567\n\
                        **Duration:** 10:05\n\n\
                        ## Description\n\nAbout things.\n\n\
                        ## Transcript\n\nhello world\n\n\
                        ---\nVideo ID: abc\n";
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("What? A <Great> Video: part 2", 50),
            "What_A_Great_Video_part_2"
        );
        let long = "x".repeat(80);
        assert_eq!(sanitize_filename(&long, 50).len(), 50);
    }

    #[test]
    fn test_format_views() {
        assert_eq!(format_views(0), "0");
        assert_eq!(format_views(999), "999");
        assert_eq!(format_views(1000), "1,000");
        assert_eq!(format_views(1234567), "1,234,567");
    }

    #[test]
    fn test_write_all_skips_videos_without_subtitles() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path());

        let videos = vec![
            video("aaa", "First", Some("transcript text")),
            video("bbb", "Second", None),
            video("ccc", "Third", Some("   ")),
        ];

        let summary = writer.write_all(&videos).unwrap();
        assert_eq!(summary.written.len(), 1);
        assert_eq!(summary.skipped_no_subtitles, 2);
        assert!(dir.path().join("First_aaa.txt").exists());
        assert!(!dir.path().join("Second_bbb.txt").exists());
    }

    #[test]
    fn test_collision_gets_numeric_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path());

        let first = writer.write_one(&video("", "Same Title", Some("one"))).unwrap();
        let second = writer.write_one(&video("", "Same Title", Some("two"))).unwrap();

        assert_ne!(first, second);
        assert!(first.ends_with("Same_Title_.txt"));
        assert!(second.ends_with("Same_Title__2.txt"));
    }

    #[test]
    fn test_metadata_counts_and_entries() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path());

        let videos = vec![
            video("aaa", "First", Some("text")),
            video("bbb", "Second", None),
        ];
        let path = writer.save_metadata(&videos).unwrap();

        let raw = std::fs::read_to_string(path).unwrap();
        let metadata: BatchMetadata = serde_json::from_str(&raw).unwrap();
        assert_eq!(metadata.total_videos, 2);
        assert_eq!(metadata.transcripts_written, 1);
        assert_eq!(metadata.skipped_no_subtitles, 1);
        assert_eq!(metadata.videos[0].id, "aaa");
        assert!(metadata.videos[0].had_transcript);
        assert!(!metadata.videos[1].had_transcript);
    }

    #[test]
    fn test_transcript_files_lists_only_txt() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path());

        writer.write_all(&[video("aaa", "First", Some("text"))]).unwrap();
        writer.save_metadata(&[]).unwrap();

        let files = writer.transcript_files().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("First_aaa.txt"));
    }
}
