//! Apify REST client for the YouTube scraper actor.

use super::{RequestMode, Video, VideoScraper};
use crate::config::ScraperSettings;
use crate::error::{Result, SnakkError};
use crate::source::Source;
use async_trait::async_trait;
use serde_json::json;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

const APIFY_BASE_URL: &str = "https://api.apify.com/v2";

/// Per-request timeout for individual platform calls. Long actor runs are
/// covered by polling, not by a single long request.
const HTTP_TIMEOUT_SECS: u64 = 60;

/// Client for the Apify v2 API.
///
/// Runs the configured actor either directly (one run per source) or through
/// a short-lived named task that is deleted once its run settles.
pub struct ApifyClient {
    token: String,
    base_url: String,
    http: reqwest::Client,
    settings: ScraperSettings,
}

impl ApifyClient {
    pub fn new(token: String, settings: ScraperSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            token,
            base_url: APIFY_BASE_URL.to_string(),
            http,
            settings,
        })
    }

    /// Actor input for one source.
    fn run_input(&self, source: &Source, max_videos: u32) -> serde_json::Value {
        json!({
            "startUrls": [{ "url": source.url }],
            "maxResults": max_videos,
            "getSubtitles": true,
            "subtitlesLanguage": self.settings.subtitles_language,
            "subtitlesFormat": self.settings.subtitles_format,
        })
    }

    /// Start a direct actor run and return its run id.
    async fn start_run(&self, source: &Source, max_videos: u32) -> Result<String> {
        let url = format!(
            "{}/acts/{}/runs?token={}",
            self.base_url, self.settings.actor, self.token
        );

        let response = self
            .http
            .post(&url)
            .json(&self.run_input(source, max_videos))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.api_error("could not start actor run", response).await);
        }

        let payload: serde_json::Value = response.json().await?;
        let run_id = payload["data"]["id"]
            .as_str()
            .ok_or_else(|| SnakkError::Scrape("run response carried no run id".to_string()))?;

        debug!("Started actor run {} for {}", run_id, source.url);
        Ok(run_id.to_string())
    }

    /// Poll a run until it reaches a terminal status, returning its dataset id.
    ///
    /// Polls without an internal deadline; callers bound the wait with their
    /// own timeout and cancel by dropping the future.
    async fn wait_for_run(&self, run_id: &str) -> Result<String> {
        let url = format!("{}/actor-runs/{}?token={}", self.base_url, run_id, self.token);

        loop {
            tokio::time::sleep(Duration::from_secs(self.settings.poll_interval_seconds)).await;

            let response = self.http.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(self.api_error("run status check failed", response).await);
            }

            let payload: serde_json::Value = response.json().await?;
            let status = payload["data"]["status"].as_str().unwrap_or("UNKNOWN");

            match status {
                "SUCCEEDED" => {
                    let dataset_id = payload["data"]["defaultDatasetId"].as_str().ok_or_else(
                        || SnakkError::Scrape("run succeeded without a dataset id".to_string()),
                    )?;
                    return Ok(dataset_id.to_string());
                }
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(SnakkError::Scrape(format!(
                        "actor run {} ended as {}",
                        run_id, status
                    )));
                }
                other => debug!("Run {} still {}", run_id, other),
            }
        }
    }

    /// Fetch dataset items and map them into video records, newest first.
    async fn fetch_dataset(
        &self,
        dataset_id: &str,
        source: &Source,
        limit: u32,
    ) -> Result<Vec<Video>> {
        let url = format!(
            "{}/datasets/{}/items?token={}&format=json&limit={}",
            self.base_url, dataset_id, self.token, limit
        );

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(self.api_error("dataset fetch failed", response).await);
        }

        let items: Vec<serde_json::Value> = response.json().await?;
        let mut videos: Vec<Video> = items
            .iter()
            .map(|item| Video::from_dataset_item(item, &source.url))
            .collect();

        // The actor does not guarantee ordering; newest first by upload date.
        videos.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(videos)
    }

    /// Create a named task wrapping the actor with this source's input.
    async fn create_task(&self, source: &Source, max_videos: u32) -> Result<String> {
        let url = format!("{}/actor-tasks?token={}", self.base_url, self.token);
        let body = json!({
            "actId": self.settings.actor,
            "name": task_name(&source.url),
            "options": { "memoryMbytes": self.settings.task_memory_mbytes },
            "input": self.run_input(source, max_videos),
        });

        let response = self.http.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(self.api_error("could not create task", response).await);
        }

        let payload: serde_json::Value = response.json().await?;
        let task_id = payload["data"]["id"]
            .as_str()
            .ok_or_else(|| SnakkError::Scrape("task response carried no task id".to_string()))?;

        debug!("Created task {} for {}", task_id, source.url);
        Ok(task_id.to_string())
    }

    /// Start a run of a previously created task and return its run id.
    async fn start_task_run(&self, task_id: &str) -> Result<String> {
        let url = format!(
            "{}/actor-tasks/{}/runs?token={}",
            self.base_url, task_id, self.token
        );

        let response = self.http.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(self.api_error("could not start task run", response).await);
        }

        let payload: serde_json::Value = response.json().await?;
        let run_id = payload["data"]["id"]
            .as_str()
            .ok_or_else(|| SnakkError::Scrape("task run response carried no run id".to_string()))?;

        Ok(run_id.to_string())
    }

    /// Delete a task. Best effort: a leftover task is only clutter.
    async fn delete_task(&self, task_id: &str) {
        let url = format!(
            "{}/actor-tasks/{}?token={}",
            self.base_url, task_id, self.token
        );

        match self.http.delete(&url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Deleted task {}", task_id);
            }
            Ok(response) => {
                warn!("Could not delete task {}: HTTP {}", task_id, response.status());
            }
            Err(e) => warn!("Could not delete task {}: {}", task_id, e),
        }
    }

    async fn scrape_direct(&self, source: &Source, max_videos: u32) -> Result<Vec<Video>> {
        let run_id = self.start_run(source, max_videos).await?;
        let dataset_id = self.wait_for_run(&run_id).await?;
        self.fetch_dataset(&dataset_id, source, max_videos).await
    }

    async fn scrape_via_task(&self, source: &Source, max_videos: u32) -> Result<Vec<Video>> {
        let task_id = self.create_task(source, max_videos).await?;
        let budget = Duration::from_secs(self.settings.source_timeout_seconds);

        // Bounded here rather than by the caller: the task below must still
        // be deleted when the run overshoots the budget.
        let result = match tokio::time::timeout(budget, async {
            let run_id = self.start_task_run(&task_id).await?;
            let dataset_id = self.wait_for_run(&run_id).await?;
            self.fetch_dataset(&dataset_id, source, max_videos).await
        })
        .await
        {
            Ok(result) => result,
            Err(_) => Err(SnakkError::Scrape(format!("timed out after {:?}", budget))),
        };

        self.delete_task(&task_id).await;
        result
    }

    /// Turn a non-success response into a scrape error carrying the status.
    async fn api_error(&self, context: &str, response: reqwest::Response) -> SnakkError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SnakkError::Scrape(format!("HTTP {}: {}: {}", status, context, body))
    }
}

#[async_trait]
impl VideoScraper for ApifyClient {
    async fn scrape_source(
        &self,
        source: &Source,
        max_videos: u32,
        mode: RequestMode,
    ) -> Result<Vec<Video>> {
        info!("Scraping {} (up to {} videos)", source.url, max_videos);

        let videos = match mode {
            RequestMode::Direct => self.scrape_direct(source, max_videos).await?,
            RequestMode::Task => self.scrape_via_task(source, max_videos).await?,
        };

        info!("Scraped {} video(s) from {}", videos.len(), source.url);
        Ok(videos)
    }
}

/// Build a platform-safe task name from a source URL.
///
/// Task names must be unique per account, so a millisecond timestamp is
/// appended to the URL's tail.
fn task_name(url: &str) -> String {
    let tail: String = url
        .rsplit('/')
        .next()
        .unwrap_or("source")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .take(20)
        .collect::<String>()
        .to_ascii_lowercase();
    let tail = if tail.is_empty() { "source".to_string() } else { tail };

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    format!("snakk-{}-{}", tail, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_name_is_platform_safe() {
        let name = task_name("https://www.youtube.com/@Some_Channel!");
        assert!(name.starts_with("snakk-somechannel-"));
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn test_task_name_handles_bare_input() {
        let name = task_name("///");
        assert!(name.starts_with("snakk-source-"));
    }

    #[test]
    fn test_run_input_shape() {
        let client = ApifyClient::new("tok".to_string(), ScraperSettings::default()).unwrap();
        let source = Source::classify("https://www.youtube.com/@Chan");
        let input = client.run_input(&source, 25);

        assert_eq!(input["startUrls"][0]["url"], "https://www.youtube.com/@Chan");
        assert_eq!(input["maxResults"], 25);
        assert_eq!(input["getSubtitles"], true);
        assert_eq!(input["subtitlesLanguage"], "en");
        assert_eq!(input["subtitlesFormat"], "plaintext");
    }
}
