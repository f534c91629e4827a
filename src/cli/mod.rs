//! CLI module for Snakk.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Snakk - YouTube Transcript Chat
///
/// A CLI tool that scrapes YouTube transcripts and lets you chat with them
/// through Gemini. The name "Snakk" comes from the Norwegian word for "talk."
#[derive(Parser, Debug)]
#[command(name = "snakk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Snakk and verify credentials
    Init,

    /// Check credentials, directories, and configuration
    Doctor,

    /// Scrape one YouTube URL, then chat with its transcripts
    Run {
        /// YouTube video, channel, or playlist URL (prompted if omitted)
        url: Option<String>,

        /// Maximum videos to fetch from a channel or playlist
        #[arg(short, long)]
        max_videos: Option<u32>,
    },

    /// Scrape many YouTube URLs concurrently, then chat
    Batch {
        /// YouTube URLs to scrape (interactive menu if none given)
        urls: Vec<String>,

        /// Read URLs from a file (one per line, '#' lines are comments)
        #[arg(short, long)]
        file: Option<String>,

        /// Maximum videos to fetch per channel or playlist
        #[arg(short, long)]
        max_videos: Option<u32>,

        /// Run each source through a short-lived actor task
        #[arg(long)]
        use_tasks: bool,

        /// Stop after writing transcripts instead of starting a chat
        #[arg(long)]
        skip_chat: bool,
    },

    /// Chat with previously saved transcripts
    Chat {
        /// Gemini model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Manage files uploaded to Gemini
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum FilesAction {
    /// List files currently stored with Gemini
    List,

    /// Delete every uploaded file
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "scraper.max_videos")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
