//! Files command: inspect or purge transcripts uploaded to Gemini.

use crate::cli::preflight::{self, Operation};
use crate::cli::{FilesAction, Output};
use crate::config::Settings;
use crate::gemini::GeminiClient;
use anyhow::Result;
use console::style;
use std::io::{self, Write};

/// Run the files command.
pub async fn run_files(action: &FilesAction, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Files) {
        Output::error(&format!("{}", e));
        Output::info("Run 'snakk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mut client = GeminiClient::new(preflight::gemini_key()?, settings.gemini.clone())?;

    match action {
        FilesAction::List => {
            let spinner = Output::spinner("Fetching file list...");
            let files = client.list_files().await?;
            spinner.finish_and_clear();

            if files.is_empty() {
                Output::info("No files stored with Gemini.");
                return Ok(());
            }

            Output::header("Uploaded Files");
            for file in &files {
                let line = if file.display_name.is_empty() {
                    format!("{} ({})", file.name, file.state)
                } else {
                    format!("{} ({}, {})", file.display_name, file.name, file.state)
                };
                Output::list_item(&line);
            }
            println!();
            Output::info(&format!("{} file(s) total", files.len()));
        }

        FilesAction::Clear { yes } => {
            if !*yes && !prompt_confirm("Delete every file uploaded to Gemini?")? {
                Output::info("Cancelled.");
                return Ok(());
            }

            let spinner = Output::spinner("Deleting files...");
            let deleted = client.clear_all_files().await?;
            spinner.finish_and_clear();

            if deleted == 0 {
                Output::info("Nothing to delete.");
            } else {
                Output::success(&format!("Deleted {} file(s)", deleted));
            }
        }
    }

    Ok(())
}

fn prompt_confirm(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}
