//! Interactive chat command against uploaded transcripts.

use crate::chat::{ChatCommand, ChatSession};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SnakkError;
use crate::gemini::GeminiClient;
use crate::transcript::TranscriptWriter;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::warn;

/// Run the chat command: upload saved transcripts and start a session.
pub async fn run_chat(model: Option<String>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Chat) {
        Output::error(&format!("{}", e));
        Output::info("Run 'snakk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut gemini_settings = settings.gemini.clone();
    if let Some(model) = model {
        gemini_settings.model = model;
    }
    let mut client = GeminiClient::new(preflight::gemini_key()?, gemini_settings)?;

    let writer = TranscriptWriter::new(settings.transcript_dir());
    let transcripts = writer.transcript_files()?;

    if transcripts.is_empty() {
        Output::warning("No saved transcripts found. The chat will have no file context.");
        Output::info("Run 'snakk run <url>' or 'snakk batch' to scrape some first.");
    } else {
        Output::info(&format!(
            "Found {} saved transcript(s) in {}",
            transcripts.len(),
            writer.output_dir().display()
        ));
        upload_transcripts(&mut client, &transcripts).await?;
    }

    let mut session = ChatSession::new(client, &settings.chat);
    chat_loop(&mut session).await
}

/// Upload transcript files to Gemini, skipping any that fail.
///
/// Errors only when every upload fails; a partial batch is still usable.
pub(crate) async fn upload_transcripts(
    client: &mut GeminiClient,
    paths: &[PathBuf],
) -> Result<()> {
    if paths.is_empty() {
        return Ok(());
    }

    let pb = Output::progress_bar(paths.len() as u64, "Uploading transcripts");
    let mut failed = 0usize;

    for path in paths {
        if let Err(e) = client.upload_file(path).await {
            warn!("Upload failed for {}: {}", path.display(), e);
            pb.println(format!("  failed: {} ({})", path.display(), e));
            failed += 1;
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let uploaded = paths.len() - failed;
    if uploaded == 0 {
        return Err(SnakkError::Upload(format!(
            "none of the {} transcript(s) could be uploaded",
            paths.len()
        ))
        .into());
    }

    if failed > 0 {
        Output::warning(&format!(
            "Skipped {} transcript(s) that failed to upload",
            failed
        ));
    }
    Output::success(&format!("Uploaded {} transcript(s) to Gemini", uploaded));
    Ok(())
}

/// Line-based prompt loop over a chat session.
pub(crate) async fn chat_loop(session: &mut ChatSession) -> Result<()> {
    println!("\n{}", style("Snakk Chat").bold().cyan());
    let attached = session.client().uploaded_files().len();
    if attached > 0 {
        println!(
            "{}",
            style(format!(
                "Model: {} | {} transcript(s) attached",
                session.client().model_name(),
                attached
            ))
            .dim()
        );
    } else {
        println!(
            "{}",
            style(format!("Model: {}", session.client().model_name())).dim()
        );
    }
    println!(
        "{}\n",
        style("Ask about your transcripts. Type 'help' for commands, 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // End of input (Ctrl-D or a drained pipe).
            println!();
            break;
        }

        match ChatCommand::parse(&input) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => {
                Output::info("Goodbye!");
                break;
            }
            ChatCommand::Help => print_help(),
            ChatCommand::ListFiles => {
                let files = session.client().uploaded_files();
                if files.is_empty() {
                    Output::info("No transcripts attached to this session.");
                } else {
                    for file in files {
                        let label = if file.display_name.is_empty() {
                            &file.name
                        } else {
                            &file.display_name
                        };
                        Output::list_item(&format!("{} ({})", label, file.state));
                    }
                }
            }
            ChatCommand::ClearHistory => {
                session.clear_history();
                Output::info("Conversation history cleared.");
            }
            ChatCommand::Message(message) => {
                let spinner = Output::spinner("Thinking...");
                match session.send(&message).await {
                    Ok(response) => {
                        spinner.finish_and_clear();
                        println!("\n{} {}\n", style("Snakk:").cyan().bold(), response);
                    }
                    Err(e) => {
                        spinner.finish_and_clear();
                        Output::error(&format!("Error: {}", e));
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!();
    Output::kv("help", "show this help");
    Output::kv("list", "list transcripts attached to this session");
    Output::kv("clear", "reset the conversation history");
    Output::kv("exit", "leave the chat");
    println!();
}
