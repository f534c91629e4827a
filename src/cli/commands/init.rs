//! Init command - interactive first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Snakk Setup");
    println!();
    println!("Welcome to Snakk! Let's make sure everything is configured correctly.\n");

    // Step 1: API credentials
    println!("{}", style("Step 1: Checking API credentials").bold().cyan());
    println!();

    let mut missing = Vec::new();
    if std::env::var("APIFY_API_TOKEN").map_or(true, |v| v.trim().is_empty()) {
        missing.push((
            "APIFY_API_TOKEN",
            "https://console.apify.com/account/integrations",
            "export APIFY_API_TOKEN='apify_api_...'",
        ));
    }
    if std::env::var("GEMINI_API_KEY").map_or(true, |v| v.trim().is_empty()) {
        missing.push((
            "GEMINI_API_KEY",
            "https://aistudio.google.com/apikey",
            "export GEMINI_API_KEY='...'",
        ));
    }

    if missing.is_empty() {
        Output::success("Both API credentials are configured!");
    } else {
        for (name, portal, export_line) in &missing {
            Output::warning(&format!("{} is not set.", name));
            println!("  Get your key from: {}", style(portal).underlined());
            println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
            println!("  {}", style(export_line).green());
            println!();
        }

        if !prompt_continue("Continue without credentials?")? {
            println!();
            Output::info("Setup cancelled. Set the missing keys and run 'snakk init' again.");
            return Ok(());
        }
    }

    println!();

    // Step 2: Create directories
    println!("{}", style("Step 2: Setting up directories").bold().cyan());
    println!();

    let data_dir = settings.data_dir();
    let transcript_dir = settings.transcript_dir();

    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    if !transcript_dir.exists() {
        std::fs::create_dir_all(&transcript_dir)?;
        Output::success(&format!(
            "Created transcript directory: {}",
            transcript_dir.display()
        ));
    } else {
        Output::info(&format!(
            "Transcript directory exists: {}",
            transcript_dir.display()
        ));
    }

    println!();

    // Step 3: Create config file
    println!("{}", style("Step 3: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!(
            "  Edit your config with: {}",
            style("snakk config edit").green()
        );
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!(
        "  {} Check credentials and directories",
        style("snakk doctor").cyan()
    );
    println!(
        "  {} Scrape your first channel",
        style("snakk run <url>").cyan()
    );
    println!(
        "  {} Chat with saved transcripts",
        style("snakk chat").cyan()
    );
    println!();
    println!("For more help: {}", style("snakk --help").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}
