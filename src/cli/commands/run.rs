//! Run command: scrape one URL and chat with its transcripts.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SnakkError;
use crate::scraper::RequestMode;
use crate::source::{Source, SourceKind};
use anyhow::Result;
use console::style;
use std::io::{self, Write};

use super::batch::{prompt_max_videos, resolve_max_videos, scrape_and_chat};

/// Run the single-source command.
pub async fn run_single(
    url: Option<String>,
    max_videos: Option<u32>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Scrape) {
        Output::error(&format!("{}", e));
        Output::info("Run 'snakk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let url = match url {
        Some(url) => url,
        None => prompt_url()?,
    };
    if url.trim().is_empty() {
        return Err(SnakkError::InvalidInput("no URL provided".to_string()).into());
    }

    let max_videos = match max_videos {
        Some(value) => resolve_max_videos(Some(value), &settings)?,
        None => prompt_max_videos(settings.scraper.max_videos)?,
    };

    let source = Source::classify(&url);
    match source.kind {
        SourceKind::Unknown => {
            Output::error(&format!(
                "{} does not look like a YouTube video, channel, or playlist URL.",
                source.url
            ));
            return Err(SnakkError::UnknownSource(source.url).into());
        }
        SourceKind::Video => Output::info("Single video detected."),
        SourceKind::Channel => Output::info(&format!(
            "Channel detected, fetching up to {} video(s).",
            max_videos
        )),
        SourceKind::Playlist => Output::info(&format!(
            "Playlist detected, fetching up to {} video(s).",
            max_videos
        )),
    }

    scrape_and_chat(
        vec![source.url],
        max_videos,
        RequestMode::Direct,
        false,
        settings,
    )
    .await
}

fn prompt_url() -> io::Result<String> {
    print!(
        "{} {} ",
        style("?").cyan(),
        "YouTube URL (video, channel, or playlist):"
    );
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
