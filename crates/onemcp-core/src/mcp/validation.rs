//! Server record validation, run before any write.

use crate::error::{Error, Result};
use crate::mcp::ServerRecord;
use crate::types::TransportType;

pub const MAX_NAME_LEN: usize = 100;

/// Check a record for every rule at once and report all violations.
pub fn validate_server(server: &ServerRecord) -> Result<()> {
    let errors = server_errors(server);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidServer(errors))
    }
}

pub fn server_errors(server: &ServerRecord) -> Vec<String> {
    let mut errors = Vec::new();

    if server.name.trim().is_empty() {
        errors.push("Server name is required".to_string());
    } else {
        if server.name.chars().count() > MAX_NAME_LEN {
            errors.push(format!(
                "Server name must be less than {MAX_NAME_LEN} characters"
            ));
        }
        if !is_valid_name(&server.name) {
            errors.push(
                "Server name can only contain letters, numbers, spaces, dots, hyphens, and underscores"
                    .to_string(),
            );
        }
    }

    if server.command.trim().is_empty() {
        errors.push("Command is required".to_string());
    }

    let url = server.url.as_deref().map(str::trim).unwrap_or_default();
    if server.transport == TransportType::Http && url.is_empty() {
        errors.push("URL is required for HTTP transport".to_string());
    }
    if !url.is_empty() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push("URL must start with http:// or https://".to_string());
        } else if let Err(err) = url::Url::parse(url) {
            errors.push(format!("URL is not valid: {err}"));
        }
    }

    if let Some(env) = &server.env
        && env.keys().any(|key| key.trim().is_empty())
    {
        errors.push("Environment variable names cannot be empty".to_string());
    }

    errors
}

/// Names are used as JSON object keys in every tool file.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ' '))
}
