//! Shared core types used across the resolver, registry and codec layers.

use serde::{Deserialize, Serialize};

/// Operating system family a path template targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "win32")]
    Windows,
    #[serde(rename = "darwin")]
    MacOs,
    #[serde(rename = "linux")]
    Linux,
}

impl Platform {
    /// Platform of the running process. Unknown unixes are treated as Linux.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "win32",
            Platform::MacOs => "darwin",
            Platform::Linux => "linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Platform {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "win32" | "windows" => Ok(Platform::Windows),
            "darwin" | "macos" => Ok(Platform::MacOs),
            "linux" => Ok(Platform::Linux),
            other => anyhow::bail!("Unknown platform: {}", other),
        }
    }
}

/// How a client talks to an MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    #[default]
    Stdio,
    Http,
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::Stdio => f.write_str("stdio"),
            TransportType::Http => f.write_str("http"),
        }
    }
}
