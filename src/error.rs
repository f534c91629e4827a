//! Error types for Snakk.

use thiserror::Error;

/// Library-level error type for Snakk operations.
#[derive(Error, Debug)]
pub enum SnakkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unrecognized source URL: {0}")]
    UnknownSource(String),

    #[error("Scrape failed: {0}")]
    Scrape(String),

    #[error("File upload failed: {0}")]
    Upload(String),

    #[error("Gemini API error: {0}")]
    Gemini(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SnakkError {
    /// Whether this error is worth retrying at a vendor boundary.
    ///
    /// Transport failures and server-side trouble (429, 5xx) are transient;
    /// everything else is treated as permanent. API-level errors carry an
    /// `HTTP <status>:` prefix (see the vendor clients) so the status survives
    /// the string conversion.
    pub fn is_transient(&self) -> bool {
        match self {
            SnakkError::Http(e) => match e.status() {
                Some(status) => status.as_u16() == 429 || status.is_server_error(),
                // Connect/timeout/body errors carry no status.
                None => true,
            },
            SnakkError::Scrape(msg) | SnakkError::Upload(msg) | SnakkError::Gemini(msg) => {
                matches!(embedded_status(msg), Some(s) if s == 429 || (500..600).contains(&s))
            }
            _ => false,
        }
    }
}

/// Extract the status code from an `HTTP <status>: <body>` message prefix.
fn embedded_status(msg: &str) -> Option<u16> {
    let rest = msg.strip_prefix("HTTP ")?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Result type alias for Snakk operations.
pub type Result<T> = std::result::Result<T, SnakkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SnakkError::Upload("HTTP 429: slow down".to_string()).is_transient());
        assert!(SnakkError::Gemini("HTTP 503: overloaded".to_string()).is_transient());
        assert!(!SnakkError::Gemini("HTTP 400: bad request".to_string()).is_transient());
        assert!(!SnakkError::Upload("processing failed".to_string()).is_transient());
        assert!(!SnakkError::Config("missing key".to_string()).is_transient());
    }

    #[test]
    fn test_embedded_status() {
        assert_eq!(embedded_status("HTTP 503: oops"), Some(503));
        assert_eq!(embedded_status("HTTP 200"), Some(200));
        assert_eq!(embedded_status("no prefix here"), None);
        assert_eq!(embedded_status("HTTP abc"), None);
    }
}
