//! Configuration settings for Snakk.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub scraper: ScraperSettings,
    pub gemini: GeminiSettings,
    pub chat: ChatSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory where transcript documents and metadata.json are written.
    pub transcript_dir: String,
    /// Log level used when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.snakk".to_string(),
            transcript_dir: "~/.snakk/transcripts".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Scraper (Apify) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    /// Apify actor to run, in REST id form (`user~actor-name`).
    pub actor: String,
    /// Default maximum videos to fetch per source URL.
    pub max_videos: u32,
    /// Maximum scrape calls in flight at once during a batch.
    pub max_concurrent: usize,
    /// Overall time budget for one source (run + poll + dataset fetch).
    pub source_timeout_seconds: u64,
    /// Interval between actor run status polls.
    pub poll_interval_seconds: u64,
    /// Subtitle language requested from the actor.
    pub subtitles_language: String,
    /// Subtitle format requested from the actor.
    pub subtitles_format: String,
    /// Memory to allocate when running in task mode.
    pub task_memory_mbytes: u32,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            actor: "streamers~youtube-scraper".to_string(),
            max_videos: 50,
            max_concurrent: 4,
            // Actor runs routinely take minutes per source.
            source_timeout_seconds: 900,
            poll_interval_seconds: 5,
            subtitles_language: "en".to_string(),
            subtitles_format: "plaintext".to_string(),
            task_memory_mbytes: 1024,
        }
    }
}

/// Gemini API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// Model used for chat completions.
    pub model: String,
    /// Interval between file state polls while an upload is processing.
    pub upload_poll_seconds: u64,
    /// How long to wait for an uploaded file to become active.
    pub upload_timeout_seconds: u64,
    /// Retries for transient API failures (429/5xx/transport).
    pub max_retries: usize,
    /// Initial retry backoff in milliseconds.
    pub initial_backoff_ms: u64,
    /// Backoff cap in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            upload_poll_seconds: 2,
            upload_timeout_seconds: 120,
            max_retries: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8000,
        }
    }
}

/// Chat session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Maximum conversation messages kept before trimming the oldest.
    pub max_history: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { max_history: 30 }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SnakkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("snakk")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded transcript output directory path.
    pub fn transcript_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.transcript_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse_from_empty_toml() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.scraper.max_videos, 50);
        assert_eq!(settings.scraper.actor, "streamers~youtube-scraper");
        assert_eq!(settings.gemini.model, "gemini-2.5-flash");
        assert_eq!(settings.chat.max_history, 30);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [scraper]
            max_videos = 10
            max_concurrent = 2
            "#,
        )
        .unwrap();
        assert_eq!(settings.scraper.max_videos, 10);
        assert_eq!(settings.scraper.max_concurrent, 2);
        assert_eq!(settings.scraper.poll_interval_seconds, 5);
        assert_eq!(settings.general.log_level, "warn");
    }
}
