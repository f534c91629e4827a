//! Pre-flight checks before network operations.
//!
//! Validates that the required API credentials are present before
//! starting operations that would otherwise fail midway.

use crate::error::{Result, SnakkError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The full scrape pipeline ends in a chat, so it needs both credentials.
    Scrape,
    /// Scraping without the chat step only talks to Apify.
    ScrapeOnly,
    /// Chatting requires Gemini credentials.
    Chat,
    /// Managing uploaded files requires Gemini credentials.
    Files,
}

/// Environment variables each operation needs, with a setup hint.
fn required_vars(operation: Operation) -> &'static [(&'static str, &'static str)] {
    match operation {
        Operation::Scrape => &[
            ("APIFY_API_TOKEN", "export APIFY_API_TOKEN='apify_api_...'"),
            ("GEMINI_API_KEY", "export GEMINI_API_KEY='...'"),
        ],
        Operation::ScrapeOnly => &[("APIFY_API_TOKEN", "export APIFY_API_TOKEN='apify_api_...'")],
        Operation::Chat | Operation::Files => &[("GEMINI_API_KEY", "export GEMINI_API_KEY='...'")],
    }
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    for (name, hint) in required_vars(operation) {
        check_env_var(name, hint)?;
    }
    Ok(())
}

/// Read the Apify API token from the environment.
pub fn apify_token() -> Result<String> {
    read_env_var("APIFY_API_TOKEN", "export APIFY_API_TOKEN='apify_api_...'")
}

/// Read the Gemini API key from the environment.
pub fn gemini_key() -> Result<String> {
    read_env_var("GEMINI_API_KEY", "export GEMINI_API_KEY='...'")
}

fn check_env_var(name: &str, hint: &str) -> Result<()> {
    read_env_var(name, hint).map(|_| ())
}

fn read_env_var(name: &str, hint: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(SnakkError::Config(format!(
            "{} is empty. Set it with: {}",
            name, hint
        ))),
        Err(_) => Err(SnakkError::Config(format!(
            "{} not set. Set it with: {}",
            name, hint
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_requires_both_credentials() {
        let vars: Vec<&str> = required_vars(Operation::Scrape)
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(vars, vec!["APIFY_API_TOKEN", "GEMINI_API_KEY"]);
    }

    #[test]
    fn test_chat_requires_only_gemini() {
        let vars: Vec<&str> = required_vars(Operation::Chat)
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(vars, vec!["GEMINI_API_KEY"]);
    }
}
