//! Batch dispatch and aggregation.
//!
//! Fans a list of classified sources out into concurrent scrape calls,
//! tolerating individual failures, then merges the per-source results into
//! one ordered, deduplicated collection.

use super::{RequestMode, Video, VideoScraper};
use crate::error::{Result, SnakkError};
use crate::source::Source;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One source that could not be scraped, with the reason.
#[derive(Debug, Clone)]
pub struct SourceFailure {
    pub source: Source,
    pub reason: String,
}

/// Outcome of one batch dispatch.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Aggregated videos: newest-first within each source, source blocks in
    /// input order, duplicate video ids dropped (first source wins).
    pub videos: Vec<Video>,
    /// Sources whose scrape call failed or timed out.
    pub failures: Vec<SourceFailure>,
    /// Sources excluded before dispatch because their URL shape is unknown.
    pub skipped: Vec<Source>,
}

impl BatchResult {
    /// Number of aggregated videos carrying transcript text.
    pub fn videos_with_transcripts(&self) -> usize {
        self.videos.iter().filter(|v| v.has_transcript()).count()
    }
}

/// Dispatch coordinator for scraping many sources at once.
pub struct BatchScraper {
    scraper: Arc<dyn VideoScraper>,
    max_concurrent: usize,
    source_timeout: Duration,
}

impl BatchScraper {
    pub fn new(
        scraper: Arc<dyn VideoScraper>,
        max_concurrent: usize,
        source_timeout: Duration,
    ) -> Self {
        Self {
            scraper,
            max_concurrent: max_concurrent.max(1),
            source_timeout,
        }
    }

    /// Scrape every recognized source concurrently and aggregate the results.
    ///
    /// Unknown URLs are set aside before dispatch. Direct calls run under
    /// this dispatcher's per-source timeout; task-mode calls enforce the
    /// same budget themselves so their platform cleanup still runs after it
    /// expires. A failure in one call never cancels or delays the others;
    /// whichever calls succeed are merged.
    pub async fn scrape_all(
        &self,
        sources: Vec<Source>,
        max_videos_per_source: u32,
        mode: RequestMode,
    ) -> BatchResult {
        let (dispatchable, skipped): (Vec<Source>, Vec<Source>) =
            sources.into_iter().partition(Source::is_scrapeable);

        for source in &skipped {
            warn!("Skipping unrecognized URL: {}", source.url);
        }

        if dispatchable.is_empty() {
            return BatchResult {
                skipped,
                ..Default::default()
            };
        }

        info!(
            "Dispatching {} source(s), at most {} in flight",
            dispatchable.len(),
            self.max_concurrent
        );

        let mut settled: Vec<(usize, Source, Result<Vec<Video>>)> =
            stream::iter(dispatchable.into_iter().enumerate())
                .map(|(idx, source)| {
                    let scraper = Arc::clone(&self.scraper);
                    let timeout = self.source_timeout;
                    async move {
                        let call = scraper.scrape_source(&source, max_videos_per_source, mode);
                        // Task-mode calls bound themselves so their
                        // server-side cleanup still runs; cancelling them
                        // here by drop would leak the task.
                        let outcome = if mode == RequestMode::Task {
                            call.await
                        } else {
                            match tokio::time::timeout(timeout, call).await {
                                Ok(result) => result,
                                // The timeout drops the in-flight call.
                                Err(_) => Err(SnakkError::Scrape(format!(
                                    "timed out after {:?}",
                                    timeout
                                ))),
                            }
                        };
                        (idx, source, outcome)
                    }
                })
                .buffer_unordered(self.max_concurrent)
                .collect()
                .await;

        // Completion order is arbitrary; restore input order before merging.
        settled.sort_by_key(|(idx, _, _)| *idx);

        let mut result = BatchResult {
            skipped,
            ..Default::default()
        };
        let mut seen_ids: HashSet<String> = HashSet::new();

        for (_, source, outcome) in settled {
            match outcome {
                Ok(videos) => {
                    for video in videos {
                        // First source wins on duplicate ids. Records without
                        // an id are never duplicates of each other.
                        if !video.id.is_empty() && !seen_ids.insert(video.id.clone()) {
                            debug!("Dropping duplicate video {} from {}", video.id, source.url);
                            continue;
                        }
                        result.videos.push(video);
                    }
                }
                Err(e) => {
                    warn!("Scrape failed for {}: {}", source.url, e);
                    result.failures.push(SourceFailure {
                        source,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Batch complete: {} video(s), {} failure(s), {} skipped",
            result.videos.len(),
            result.failures.len(),
            result.skipped.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct Entry {
        outcome: std::result::Result<Vec<Video>, String>,
        delay: Duration,
    }

    #[derive(Default)]
    struct FakeScraper {
        entries: HashMap<String, Entry>,
    }

    impl FakeScraper {
        fn with_videos(mut self, url: &str, ids: &[&str]) -> Self {
            self.entries.insert(
                url.to_string(),
                Entry {
                    outcome: Ok(ids.iter().map(|id| video(id)).collect()),
                    delay: Duration::ZERO,
                },
            );
            self
        }

        fn with_slow_videos(mut self, url: &str, ids: &[&str], delay: Duration) -> Self {
            self.entries.insert(
                url.to_string(),
                Entry {
                    outcome: Ok(ids.iter().map(|id| video(id)).collect()),
                    delay,
                },
            );
            self
        }

        fn with_result(mut self, url: &str, videos: Vec<Video>) -> Self {
            self.entries.insert(
                url.to_string(),
                Entry {
                    outcome: Ok(videos),
                    delay: Duration::ZERO,
                },
            );
            self
        }

        fn with_failure(mut self, url: &str, reason: &str) -> Self {
            self.entries.insert(
                url.to_string(),
                Entry {
                    outcome: Err(reason.to_string()),
                    delay: Duration::ZERO,
                },
            );
            self
        }
    }

    #[async_trait]
    impl VideoScraper for FakeScraper {
        async fn scrape_source(
            &self,
            source: &Source,
            _max_videos: u32,
            _mode: RequestMode,
        ) -> Result<Vec<Video>> {
            let entry = match self.entries.get(&source.url) {
                Some(entry) => entry,
                None => return Ok(vec![]),
            };

            if !entry.delay.is_zero() {
                tokio::time::sleep(entry.delay).await;
            }

            match &entry.outcome {
                Ok(videos) => Ok(videos
                    .iter()
                    .cloned()
                    .map(|mut v| {
                        v.source = source.url.clone();
                        v
                    })
                    .collect()),
                Err(reason) => Err(SnakkError::Scrape(reason.clone())),
            }
        }
    }

    fn video(id: &str) -> Video {
        Video {
            id: id.to_string(),
            title: format!("Video {}", id),
            url: format!("https://www.youtube.com/watch?v={}", id),
            description: String::new(),
            date: String::new(),
            views: 0,
            duration: String::new(),
            subtitles: Some("some transcript".to_string()),
            source: String::new(),
        }
    }

    fn channel(name: &str) -> Source {
        Source::classify(&format!("https://www.youtube.com/@{}", name))
    }

    fn batch(scraper: FakeScraper) -> BatchScraper {
        BatchScraper::new(Arc::new(scraper), 4, Duration::from_secs(5))
    }

    fn ids(result: &BatchResult) -> Vec<&str> {
        result.videos.iter().map(|v| v.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let a = channel("A");
        let b = channel("B");
        let c = channel("C");
        let scraper = FakeScraper::default()
            .with_videos(&a.url, &["a1", "a2"])
            .with_failure(&b.url, "boom")
            .with_videos(&c.url, &["c1"]);

        let result = batch(scraper)
            .scrape_all(vec![a.clone(), b.clone(), c], 50, RequestMode::Direct)
            .await;

        assert_eq!(ids(&result), vec!["a1", "a2", "c1"]);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].source.url, b.url);
        assert!(result.failures[0].reason.contains("boom"));
        assert!(result.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_first_source_wins_dedupe() {
        let a = channel("A");
        let b = channel("B");
        let scraper = FakeScraper::default()
            .with_videos(&a.url, &["v1", "v2"])
            .with_videos(&b.url, &["v2", "v3"]);

        let result = batch(scraper)
            .scrape_all(vec![a.clone(), b], 50, RequestMode::Direct)
            .await;

        assert_eq!(ids(&result), vec!["v1", "v2", "v3"]);
        // The duplicate came from A, so A's copy survives.
        assert_eq!(result.videos[1].source, a.url);
    }

    #[tokio::test]
    async fn test_transcript_counts_survive_merge() {
        let a = channel("A");
        let b = channel("B");
        let mut v3 = video("v3");
        v3.subtitles = None;
        let scraper = FakeScraper::default()
            .with_videos(&a.url, &["v1", "v2"])
            .with_result(&b.url, vec![video("v2"), v3]);

        let result = batch(scraper)
            .scrape_all(vec![a, b], 50, RequestMode::Direct)
            .await;

        // B's duplicate of v2 is dropped; its transcriptless v3 still counts.
        assert_eq!(ids(&result), vec!["v1", "v2", "v3"]);
        assert_eq!(result.videos_with_transcripts(), 2);
    }

    #[tokio::test]
    async fn test_source_order_survives_completion_order() {
        let a = channel("A");
        let b = channel("B");
        let scraper = FakeScraper::default()
            .with_slow_videos(&a.url, &["a1"], Duration::from_millis(100))
            .with_videos(&b.url, &["b1"]);

        let result = batch(scraper)
            .scrape_all(vec![a, b], 50, RequestMode::Direct)
            .await;

        // B settles first but A's block still comes first in the output.
        assert_eq!(ids(&result), vec!["a1", "b1"]);
    }

    #[tokio::test]
    async fn test_timed_out_source_becomes_failure() {
        let a = channel("A");
        let b = channel("B");
        let scraper = FakeScraper::default()
            .with_slow_videos(&a.url, &["a1"], Duration::from_millis(500))
            .with_videos(&b.url, &["b1"]);

        let batcher = BatchScraper::new(Arc::new(scraper), 4, Duration::from_millis(50));
        let result = batcher.scrape_all(vec![a, b], 50, RequestMode::Direct).await;

        assert_eq!(ids(&result), vec!["b1"]);
        assert_eq!(result.failures.len(), 1);
        assert!(result.failures[0].reason.contains("timed out"));
    }

    #[tokio::test]
    async fn test_task_mode_runs_past_dispatch_timeout() {
        let a = channel("A");
        let scraper = FakeScraper::default()
            .with_slow_videos(&a.url, &["a1"], Duration::from_millis(200));

        // Task-mode calls own their budget and their cleanup, so the
        // dispatcher must not cancel them at its own deadline.
        let batcher = BatchScraper::new(Arc::new(scraper), 4, Duration::from_millis(50));
        let result = batcher.scrape_all(vec![a], 50, RequestMode::Task).await;

        assert_eq!(ids(&result), vec!["a1"]);
        assert!(result.failures.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_urls_skipped_without_dispatch() {
        let a = channel("A");
        let bogus = Source::classify("not-a-url");
        let scraper = FakeScraper::default().with_videos(&a.url, &["a1"]);

        let result = batch(scraper)
            .scrape_all(vec![bogus.clone(), a], 50, RequestMode::Direct)
            .await;

        assert_eq!(ids(&result), vec!["a1"]);
        assert!(result.failures.is_empty());
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].url, bogus.url);
    }

    #[tokio::test]
    async fn test_all_unknown_never_dispatches() {
        let result = batch(FakeScraper::default())
            .scrape_all(
                vec![Source::classify("nope"), Source::classify("also-nope")],
                50,
                RequestMode::Direct,
            )
            .await;

        assert!(result.videos.is_empty());
        assert!(result.failures.is_empty());
        assert_eq!(result.skipped.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_ids_are_not_deduped() {
        let a = channel("A");
        let b = channel("B");
        let scraper = FakeScraper::default()
            .with_videos(&a.url, &[""])
            .with_videos(&b.url, &[""]);

        let result = batch(scraper)
            .scrape_all(vec![a, b], 50, RequestMode::Direct)
            .await;

        assert_eq!(result.videos.len(), 2);
    }
}
