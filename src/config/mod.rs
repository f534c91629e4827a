//! Configuration module for Snakk.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{ChatSettings, GeminiSettings, GeneralSettings, ScraperSettings, Settings};
