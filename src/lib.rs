//! Snakk - YouTube Transcript Chat
//!
//! A CLI tool that scrapes YouTube transcripts through the Apify platform and
//! lets you chat with them through Gemini.
//!
//! The name "Snakk" comes from the Norwegian word for "talk."
//!
//! # Overview
//!
//! Snakk allows you to:
//! - Classify YouTube channel, playlist, and video URLs
//! - Scrape many sources concurrently with partial-failure tolerance
//! - Materialize transcripts as local text documents plus batch metadata
//! - Upload transcripts to Gemini and chat with the whole corpus
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `source` - URL classification
//! - `scraper` - Apify client and the concurrent batch dispatcher
//! - `transcript` - Transcript document materialization
//! - `gemini` - Gemini file upload and chat client
//! - `chat` - Interactive session state and in-loop commands
//!
//! # Example
//!
//! ```rust,no_run
//! use snakk::config::Settings;
//! use snakk::scraper::{ApifyClient, BatchScraper, RequestMode};
//! use snakk::source::Source;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let token = std::env::var("APIFY_API_TOKEN")?;
//!     let scraper = Arc::new(ApifyClient::new(token, settings.scraper.clone())?);
//!     let batcher = BatchScraper::new(scraper, 4, Duration::from_secs(900));
//!
//!     let sources = vec![Source::classify("https://www.youtube.com/@veritasium")];
//!     let result = batcher.scrape_all(sources, 10, RequestMode::Direct).await;
//!     println!("Scraped {} video(s)", result.videos.len());
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod gemini;
pub mod scraper;
pub mod source;
pub mod transcript;

pub use error::{Result, SnakkError};
