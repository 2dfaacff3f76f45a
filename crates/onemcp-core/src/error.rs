//! Structured failures for engine operations.

use std::path::PathBuf;

/// Errors surfaced by the reconciliation engine.
///
/// Absence (missing file, missing server section, tool not applicable on this
/// platform) is never an error and is modeled as empty/`None` by the callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Server record failed validation; one message per problem.
    #[error("Invalid server: {}", .0.join("; "))]
    InvalidServer(Vec<String>),

    /// Another server in the canonical list already uses this name.
    #[error("A server named '{0}' already exists")]
    DuplicateName(String),

    /// No server with the given id (or name) in the canonical list.
    #[error("Server not found: {0}")]
    NotFound(String),

    /// Tool id is not part of the resolved registry.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Failed to parse JSON config {}: {source}", path.display())]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON parsed but the root is not an object.
    #[error("Expected JSON object at root: {}", .0.display())]
    NotAnObject(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Interchange document rejected on import.
    #[error("Invalid import document: {0}")]
    InvalidImport(String),

    /// Snapshot to restore from no longer exists.
    #[error("Backup not found: {}", .0.display())]
    BackupMissing(PathBuf),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_server_joins_messages() {
        let err = Error::InvalidServer(vec![
            "Command is required".to_string(),
            "URL is required for HTTP transport".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid server: Command is required; URL is required for HTTP transport"
        );
    }

    #[test]
    fn io_error_names_path() {
        let err = Error::io(
            "/tmp/config.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/config.json"));
    }
}
