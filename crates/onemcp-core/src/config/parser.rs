//! TOML parser for onemcp.toml with helpful error messages

use super::schema::Preferences;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse onemcp.toml with detailed error messages
pub fn parse_preferences_toml(path: &Path) -> Result<Preferences> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read preferences file: {}", path.display()))?;

    parse_preferences_toml_str(&content)
        .with_context(|| format!("Failed to parse preferences file: {}", path.display()))
}

/// Parse onemcp.toml content from string
pub fn parse_preferences_toml_str(content: &str) -> Result<Preferences> {
    let preferences: Preferences =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    preferences.validate()?;

    Ok(preferences)
}

/// Attach the offending line and its neighbours to a TOML error
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let message = error.message().to_string();

    let line_num = error
        .span()
        .and_then(|span| content.get(..span.start))
        .map(|before| before.matches('\n').count() + 1);

    match line_num {
        Some(line_num) => anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            get_line_context(content, line_num),
            message
        ),
        None => anyhow::anyhow!("TOML parsing error: {}", message),
    }
}

fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2).min(lines.len());
    let end = (line_num + 1).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize preferences to a TOML string
pub fn to_toml(preferences: &Preferences) -> Result<String> {
    toml::to_string_pretty(preferences).context("Failed to serialize preferences to TOML")
}
