//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Snakk Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    // Check API credentials
    println!("{}", style("API Configuration").bold());
    let key_checks = vec![check_apify_token(), check_gemini_key()];
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    // Check directories
    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    // Check configuration
    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Error)
        .count();
    let warnings = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Warning)
        .count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Snakk.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Snakk is ready to use.");
    }

    Ok(())
}

/// Check if the Apify API token is configured.
fn check_apify_token() -> CheckResult {
    match std::env::var("APIFY_API_TOKEN") {
        Ok(token) if token.is_empty() => CheckResult::error(
            "APIFY_API_TOKEN",
            "empty",
            "Set with: export APIFY_API_TOKEN='apify_api_...'",
        ),
        Ok(token) => match mask_key(&token, 10) {
            Some(masked) if token.starts_with("apify_api_") && token.len() > 20 => {
                CheckResult::ok("APIFY_API_TOKEN", &format!("configured ({})", masked))
            }
            _ => CheckResult::warning(
                "APIFY_API_TOKEN",
                "set but format looks unusual",
                "Expected format: apify_api_... (Apify personal API token)",
            ),
        },
        Err(_) => CheckResult::error(
            "APIFY_API_TOKEN",
            "not set",
            "Set with: export APIFY_API_TOKEN='apify_api_...'",
        ),
    }
}

/// Check if the Gemini API key is configured.
fn check_gemini_key() -> CheckResult {
    match std::env::var("GEMINI_API_KEY") {
        Ok(key) if key.is_empty() => CheckResult::error(
            "GEMINI_API_KEY",
            "empty",
            "Set with: export GEMINI_API_KEY='...'",
        ),
        Ok(key) => match mask_key(&key, 6) {
            Some(masked) if key.starts_with("AIza") && key.len() > 20 => {
                CheckResult::ok("GEMINI_API_KEY", &format!("configured ({})", masked))
            }
            _ => CheckResult::warning(
                "GEMINI_API_KEY",
                "set but format looks unusual",
                "Expected format: AIza... (Google AI Studio key)",
            ),
        },
        Err(_) => CheckResult::error(
            "GEMINI_API_KEY",
            "not set",
            "Set with: export GEMINI_API_KEY='...'",
        ),
    }
}

/// Mask a credential for display, keeping the first `lead` characters and
/// the last four. Returns None when the key is too short or a cut point
/// does not land on a character boundary.
fn mask_key(key: &str, lead: usize) -> Option<String> {
    if key.len() < lead + 4 {
        return None;
    }
    let head = key.get(..lead)?;
    let tail = key.get(key.len() - 4..)?;
    Some(format!("{}...{}", head, tail))
}

/// Check data directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok(
            "Data directory",
            &format!("{}", data_dir.display()),
        ));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let transcript_dir = settings.transcript_dir();
    if transcript_dir.exists() {
        let (count, bytes) = transcript_stats(&transcript_dir);
        results.push(CheckResult::ok(
            "Transcripts",
            &format!(
                "{} ({} file(s), {})",
                transcript_dir.display(),
                count,
                format_size(bytes)
            ),
        ));
    } else {
        results.push(CheckResult::warning(
            "Transcripts",
            &format!("{} (not created yet)", transcript_dir.display()),
            "Transcripts will be written on first scrape",
        ));
    }

    results
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: snakk init (or snakk config edit)",
        )
    }
}

/// Count transcript documents and their combined size.
fn transcript_stats(dir: &Path) -> (usize, u64) {
    let mut count = 0;
    let mut bytes = 0;
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "txt") {
                count += 1;
                bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
    }
    (count, bytes)
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }

    #[test]
    fn test_mask_key_keeps_edges() {
        assert_eq!(
            mask_key("apify_api_abcdefghijk", 10),
            Some("apify_api_...hijk".to_string())
        );
        assert_eq!(
            mask_key("AIzaSyAbcdefghijklmnopq", 6),
            Some("AIzaSy...nopq".to_string())
        );
    }

    #[test]
    fn test_mask_key_rejects_short_keys() {
        assert_eq!(mask_key("apify", 10), None);
        assert_eq!(mask_key("", 6), None);
    }

    #[test]
    fn test_mask_key_survives_multibyte_keys() {
        // A cut point landing inside a multibyte character must give None,
        // not panic: first with the euro sign under the trailing slice,
        // then under the leading one.
        assert_eq!(mask_key("apify_api_abcdef€xy", 10), None);
        assert_eq!(mask_key("AIza€aaaaaaaaaaaaaa", 6), None);
    }

    #[test]
    fn test_transcript_stats_counts_only_txt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("b.txt"), "world").unwrap();
        std::fs::write(dir.path().join("metadata.json"), "{}").unwrap();

        let (count, bytes) = transcript_stats(dir.path());
        assert_eq!(count, 2);
        assert_eq!(bytes, 10);
    }
}
