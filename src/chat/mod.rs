//! Chat session state over the uploaded transcript corpus.

use crate::config::ChatSettings;
use crate::error::Result;
use crate::gemini::{Content, GeminiClient, Part};
use tracing::warn;

/// What one line of chat input means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Free-text question for the model.
    Message(String),
    Help,
    ListFiles,
    ClearHistory,
    Exit,
    Empty,
}

impl ChatCommand {
    /// Parse one line of input. Command words are case-insensitive.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return ChatCommand::Empty;
        }

        match trimmed.to_lowercase().as_str() {
            "exit" | "quit" | "bye" | "q" => ChatCommand::Exit,
            "help" | "?" => ChatCommand::Help,
            "list" => ChatCommand::ListFiles,
            "clear" => ChatCommand::ClearHistory,
            _ => ChatCommand::Message(trimmed.to_string()),
        }
    }
}

/// Conversation state over a Gemini client.
///
/// Holds a bounded history of turns. Every question goes out together with
/// the prior turns; the uploaded files ride along on the newest turn only,
/// since earlier turns already carry their answers.
pub struct ChatSession {
    client: GeminiClient,
    history: Vec<Content>,
    max_history: usize,
}

impl ChatSession {
    pub fn new(client: GeminiClient, settings: &ChatSettings) -> Self {
        Self {
            client,
            history: Vec::new(),
            max_history: settings.max_history.max(2),
        }
    }

    pub fn client(&self) -> &GeminiClient {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut GeminiClient {
        &mut self.client
    }

    /// Send one question and return the model's answer.
    pub async fn send(&mut self, message: &str) -> Result<String> {
        let mut parts = vec![Part::text(message)];
        for file in self.client.uploaded_files() {
            parts.push(Part::file(&file.uri));
        }

        if self.client.uploaded_files().is_empty() {
            warn!("No files uploaded; answering without transcript context");
        }

        let mut contents = self.history.clone();
        contents.push(Content::user(parts));

        let answer = self.client.generate(&contents).await?;

        self.history.push(Content::user(vec![Part::text(message)]));
        self.history.push(Content::model(&answer));
        trim_history(&mut self.history, self.max_history);

        Ok(answer)
    }

    /// Forget prior turns.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// Drop the oldest turns once the history grows past `max`.
fn trim_history(history: &mut Vec<Content>, max: usize) {
    if history.len() > max {
        let excess = history.len() - max;
        history.drain(..excess);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exit_aliases() {
        for input in ["exit", "quit", "bye", "q", "EXIT", " Quit "] {
            assert_eq!(ChatCommand::parse(input), ChatCommand::Exit, "{}", input);
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatCommand::parse("help"), ChatCommand::Help);
        assert_eq!(ChatCommand::parse("?"), ChatCommand::Help);
        assert_eq!(ChatCommand::parse("list"), ChatCommand::ListFiles);
        assert_eq!(ChatCommand::parse("clear"), ChatCommand::ClearHistory);
        assert_eq!(ChatCommand::parse(""), ChatCommand::Empty);
        assert_eq!(ChatCommand::parse("   "), ChatCommand::Empty);
    }

    #[test]
    fn test_parse_free_text_passes_through() {
        assert_eq!(
            ChatCommand::parse("  what is this about? "),
            ChatCommand::Message("what is this about?".to_string())
        );
        // A question that merely starts with a command word is still a question.
        assert_eq!(
            ChatCommand::parse("list the main topics"),
            ChatCommand::Message("list the main topics".to_string())
        );
    }

    #[test]
    fn test_trim_history_keeps_newest() {
        let mut history: Vec<Content> = (0..7)
            .map(|i| Content::user(vec![Part::text(format!("m{}", i))]))
            .collect();

        trim_history(&mut history, 4);

        assert_eq!(history.len(), 4);
        assert_eq!(history[0].parts[0].text.as_deref(), Some("m3"));
        assert_eq!(history[3].parts[0].text.as_deref(), Some("m6"));
    }

    #[test]
    fn test_trim_history_noop_under_limit() {
        let mut history = vec![Content::model("answer")];
        trim_history(&mut history, 4);
        assert_eq!(history.len(), 1);
    }
}
