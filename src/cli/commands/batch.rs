//! Batch command: fan out scrapes across many URLs, then chat.

use crate::chat::ChatSession;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SnakkError;
use crate::gemini::GeminiClient;
use crate::scraper::{ApifyClient, BatchScraper, RequestMode};
use crate::source::{read_urls_file, Source};
use crate::transcript::TranscriptWriter;
use anyhow::Result;
use console::style;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::chat::{chat_loop, upload_transcripts};

/// Run the batch command.
pub async fn run_batch(
    mut urls: Vec<String>,
    file: Option<String>,
    mut max_videos: Option<u32>,
    mut use_tasks: bool,
    skip_chat: bool,
    settings: Settings,
) -> Result<()> {
    let operation = if skip_chat {
        Operation::ScrapeOnly
    } else {
        Operation::Scrape
    };
    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        Output::info("Run 'snakk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(path) = &file {
        urls.extend(read_urls_file(Path::new(path))?);
    }

    if urls.is_empty() {
        let default_max = max_videos.unwrap_or(settings.scraper.max_videos);
        let answers = prompt_batch_input(default_max)?;
        urls = answers.urls;
        max_videos = Some(answers.max_videos);
        use_tasks = use_tasks || answers.use_tasks;
    }

    let max_videos = resolve_max_videos(max_videos, &settings)?;
    let mode = if use_tasks {
        RequestMode::Task
    } else {
        RequestMode::Direct
    };

    scrape_and_chat(urls, max_videos, mode, skip_chat, settings).await
}

/// Shared pipeline: classify, scrape, materialize, then upload and chat.
pub(crate) async fn scrape_and_chat(
    urls: Vec<String>,
    max_videos: u32,
    mode: RequestMode,
    skip_chat: bool,
    settings: Settings,
) -> Result<()> {
    let sources: Vec<Source> = urls.iter().map(|url| Source::classify(url)).collect();

    let scraper = Arc::new(ApifyClient::new(
        preflight::apify_token()?,
        settings.scraper.clone(),
    )?);
    let batcher = BatchScraper::new(
        scraper,
        settings.scraper.max_concurrent,
        Duration::from_secs(settings.scraper.source_timeout_seconds),
    );

    let spinner = Output::spinner(&format!("Scraping {} source(s)...", sources.len()));
    let result = batcher.scrape_all(sources, max_videos, mode).await;
    spinner.finish_and_clear();

    for source in &result.skipped {
        Output::warning(&format!(
            "Skipped {} (not a recognizable YouTube URL)",
            source.url
        ));
    }
    for failure in &result.failures {
        Output::error(&format!("Failed {}: {}", failure.source.url, failure.reason));
    }

    if result.videos.is_empty() {
        return Err(
            SnakkError::Scrape("no videos were scraped from any source".to_string()).into(),
        );
    }

    Output::success(&format!(
        "Scraped {} video(s), {} with transcripts",
        result.videos.len(),
        result.videos_with_transcripts()
    ));
    for video in &result.videos {
        Output::video_item(&video.title, &video.duration);
    }

    let writer = TranscriptWriter::new(settings.transcript_dir());
    let summary = writer.write_all(&result.videos)?;
    let metadata_path = writer.save_metadata(&result.videos)?;
    tracing::debug!("Batch metadata saved to {}", metadata_path.display());

    println!();
    Output::info(&format!(
        "Wrote {} transcript(s) to {}",
        summary.written.len(),
        writer.output_dir().display()
    ));
    if summary.skipped_no_subtitles > 0 {
        Output::info(&format!(
            "{} video(s) had no subtitles and were skipped",
            summary.skipped_no_subtitles
        ));
    }

    if skip_chat {
        Output::info("Skipping chat. Run 'snakk chat' when you are ready.");
        return Ok(());
    }

    if summary.written.is_empty() {
        Output::warning("No transcripts to chat with.");
        return Ok(());
    }

    let mut gemini = GeminiClient::new(preflight::gemini_key()?, settings.gemini.clone())?;
    upload_transcripts(&mut gemini, &summary.written).await?;

    let mut session = ChatSession::new(gemini, &settings.chat);
    chat_loop(&mut session).await
}

pub(crate) fn resolve_max_videos(max_videos: Option<u32>, settings: &Settings) -> Result<u32> {
    let max = max_videos.unwrap_or(settings.scraper.max_videos);
    if max == 0 {
        return Err(SnakkError::InvalidInput("max videos must be at least 1".to_string()).into());
    }
    Ok(max)
}

struct BatchAnswers {
    urls: Vec<String>,
    max_videos: u32,
    use_tasks: bool,
}

/// Menu-driven URL entry for when the command was given nothing to scrape.
fn prompt_batch_input(default_max: u32) -> Result<BatchAnswers> {
    Output::header("Batch Scrape");
    println!();
    println!("How would you like to provide URLs?");
    println!("  {} Enter URLs one per line", style("1.").cyan());
    println!("  {} Load URLs from a file", style("2.").cyan());
    println!("  {} Single URL", style("3.").cyan());
    println!();

    let choice = prompt_line("Choice [1-3]:")?;
    let urls = match choice.as_str() {
        "1" => prompt_url_list()?,
        "2" => {
            let path = prompt_line("Path to URLs file:")?;
            read_urls_file(Path::new(&path))?
        }
        "3" => {
            let url = prompt_line("YouTube URL:")?;
            if url.is_empty() {
                Vec::new()
            } else {
                vec![url]
            }
        }
        other => {
            return Err(SnakkError::InvalidInput(format!("invalid choice: {}", other)).into());
        }
    };

    if urls.is_empty() {
        return Err(SnakkError::InvalidInput("no URLs provided".to_string()).into());
    }

    let max_videos = prompt_max_videos(default_max)?;
    let use_tasks = prompt_yes_no("Run sources through short-lived actor tasks?")?;

    Ok(BatchAnswers {
        urls,
        max_videos,
        use_tasks,
    })
}

fn prompt_url_list() -> Result<Vec<String>> {
    println!("Enter URLs, one per line (empty line to finish):");
    let mut urls = Vec::new();
    let stdin = io::stdin();
    loop {
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        urls.push(line.to_string());
    }
    Ok(urls)
}

pub(crate) fn prompt_max_videos(default: u32) -> Result<u32> {
    let raw = prompt_line(&format!("Max videos per channel/playlist [{}]:", default))?;
    parse_max_videos(&raw, default)
}

fn parse_max_videos(raw: &str, default: u32) -> Result<u32> {
    if raw.is_empty() {
        return Ok(default);
    }
    let parsed: u32 = raw
        .parse()
        .map_err(|_| SnakkError::InvalidInput(format!("not a number: {}", raw)))?;
    if parsed == 0 {
        return Err(SnakkError::InvalidInput("max videos must be at least 1".to_string()).into());
    }
    Ok(parsed)
}

fn prompt_line(message: &str) -> io::Result<String> {
    print!("{} {} ", style("?").cyan(), message);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_yes_no(message: &str) -> io::Result<bool> {
    print!("{} {} {} ", style("?").cyan(), message, style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
