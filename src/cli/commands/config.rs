//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;
use std::path::PathBuf;

/// Run the config command against the file the settings were loaded from.
pub fn run_config(action: &ConfigAction, settings: Settings, path: Option<&PathBuf>) -> Result<()> {
    let config_path = match path {
        Some(p) => p.clone(),
        None => Settings::default_config_path(),
    };

    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = apply_set(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::info(&format!("Saved to {}", config_path.display()));
        }

        ConfigAction::Edit => {
            // Create a config to edit if there is none yet
            if !config_path.exists() {
                settings.save_to(&config_path)?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            // Try to open in editor
            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Apply one `section.key = value` change on top of the current settings.
fn apply_set(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let (section, field) = key.split_once('.').ok_or_else(|| {
        anyhow::anyhow!("Key must look like section.key, e.g. scraper.max_videos")
    })?;

    let mut doc = toml::Value::try_from(settings)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    let table = doc
        .get_mut(section)
        .and_then(|v| v.as_table_mut())
        .ok_or_else(|| anyhow::anyhow!("Unknown configuration section: {}", section))?;

    if !table.contains_key(field) {
        return Err(anyhow::anyhow!("Unknown configuration key: {}", key));
    }
    table.insert(field.to_string(), parse_toml_value(value));

    doc.try_into()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))
}

/// Interpret a raw CLI value as a bool, an integer, or a string.
fn parse_toml_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    toml::Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_set_updates_value() {
        let settings = Settings::default();
        let updated = apply_set(&settings, "scraper.max_videos", "10").unwrap();
        assert_eq!(updated.scraper.max_videos, 10);
        assert_eq!(updated.gemini.model, settings.gemini.model);
    }

    #[test]
    fn test_apply_set_rejects_unknown_key() {
        let settings = Settings::default();
        assert!(apply_set(&settings, "scraper.nope", "10").is_err());
        assert!(apply_set(&settings, "nosection.max_videos", "10").is_err());
        assert!(apply_set(&settings, "bare-key", "10").is_err());
    }

    #[test]
    fn test_apply_set_rejects_bad_type() {
        let settings = Settings::default();
        assert!(apply_set(&settings, "scraper.max_videos", "many").is_err());
    }

    #[test]
    fn test_parse_toml_value_types() {
        assert_eq!(parse_toml_value("true"), toml::Value::Boolean(true));
        assert_eq!(parse_toml_value("42"), toml::Value::Integer(42));
        assert_eq!(
            parse_toml_value("plaintext"),
            toml::Value::String("plaintext".to_string())
        );
    }
}
