//! Tool descriptors for the AI applications whose config files are kept in
//! sync.
//!
//! A [`ToolDefinition`] is the static description (per-platform path
//! templates, schema format, capabilities). The [`registry::ToolRegistry`]
//! turns definitions into resolved [`ToolDescriptor`]s for the running
//! platform.

pub mod builtin;
pub mod registry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::paths::PlatformPaths;

pub use builtin::builtin_definitions;
pub use registry::ToolRegistry;

/// Where a tool keeps its server map inside its JSON document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaFormat {
    /// `{ "mcpServers": { ... } }`
    #[serde(rename = "mcpServers")]
    McpServers,
    /// `{ "servers": { ... } }`
    #[serde(rename = "servers")]
    Servers,
    /// `{ "mcp": { "servers": { ... } } }`
    #[serde(rename = "mcp.servers")]
    NestedMcpServers,
}

impl SchemaFormat {
    /// Canonical server key for this format.
    pub fn default_server_key(&self) -> &'static str {
        match self {
            SchemaFormat::McpServers => "mcpServers",
            SchemaFormat::Servers => "servers",
            SchemaFormat::NestedMcpServers => "mcp.servers",
        }
    }
}

impl TryFrom<&str> for SchemaFormat {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "mcpServers" => Ok(SchemaFormat::McpServers),
            "servers" => Ok(SchemaFormat::Servers),
            "mcp.servers" => Ok(SchemaFormat::NestedMcpServers),
            other => anyhow::bail!(
                "Unknown config format: '{}'. Use 'mcpServers', 'servers' or 'mcp.servers'",
                other
            ),
        }
    }
}

/// Guess the schema format an existing document uses.
pub fn detect_config_format(document: &Map<String, Value>) -> Option<SchemaFormat> {
    if document.contains_key("mcpServers") {
        Some(SchemaFormat::McpServers)
    } else if document.contains_key("servers") {
        Some(SchemaFormat::Servers)
    } else if document.contains_key("mcp.servers") || document.contains_key("mcp") {
        Some(SchemaFormat::NestedMcpServers)
    } else {
        None
    }
}

/// Optional per-server flags a tool understands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCapabilities {
    #[serde(default)]
    pub always_allow: bool,
    #[serde(default)]
    pub auto_approve: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl ToolCapabilities {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            always_allow: true,
            auto_approve: true,
            disabled: true,
        }
    }

    pub fn any(&self) -> bool {
        self.always_allow || self.auto_approve || self.disabled
    }
}

/// Static, unresolved description of one target application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub id: String,
    pub name: String,
    pub platforms: PlatformPaths,
    pub schema_format: SchemaFormat,
    /// Dotted key path; defaults to the format's canonical key.
    #[serde(default)]
    pub server_key: Option<String>,
    #[serde(default)]
    pub capabilities: ToolCapabilities,
}

impl ToolDefinition {
    pub fn server_key(&self) -> String {
        self.server_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| self.schema_format.default_server_key().to_string())
    }
}

/// User-added tool, persisted in preferences. Its path applies on every
/// platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTool {
    pub id: String,
    pub name: String,
    pub config_path: String,
    pub schema_format: SchemaFormat,
    #[serde(default)]
    pub server_key: Option<String>,
    #[serde(default)]
    pub capabilities: ToolCapabilities,
    pub added_at: DateTime<Utc>,
}

impl CustomTool {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        config_path: impl Into<String>,
        schema_format: SchemaFormat,
        server_key: Option<String>,
    ) -> Self {
        let server_key = server_key
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| schema_format.default_server_key().to_string());
        Self {
            id: id.into(),
            name: name.into(),
            config_path: config_path.into(),
            schema_format,
            server_key: Some(server_key),
            capabilities: ToolCapabilities::none(),
            added_at: Utc::now(),
        }
    }

    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            id: self.id.clone(),
            name: self.name.clone(),
            platforms: PlatformPaths::everywhere(self.config_path.clone()),
            schema_format: self.schema_format,
            server_key: self.server_key.clone(),
            capabilities: self.capabilities,
        }
    }
}

/// User override of a tool's display name and/or resolved config path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

/// A tool resolved for the running platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolDescriptor {
    pub id: String,
    pub name: String,
    /// Resolved path in canonical forward-slash form.
    pub config_path: String,
    pub schema_format: SchemaFormat,
    pub server_key: String,
    pub capabilities: ToolCapabilities,
    pub is_built_in: bool,
    /// True iff the config file existed at resolution time.
    pub is_installed: bool,
}

impl ToolDescriptor {
    /// Descriptor for an already-resolved path. Mostly useful in tests.
    pub fn new(
        id: impl Into<String>,
        config_path: impl Into<String>,
        schema_format: SchemaFormat,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            config_path: config_path.into(),
            schema_format,
            server_key: schema_format.default_server_key().to_string(),
            capabilities: ToolCapabilities::none(),
            is_built_in: false,
            is_installed: true,
        }
    }

    pub fn with_server_key(mut self, key: impl Into<String>) -> Self {
        self.server_key = key.into();
        self
    }

    pub fn with_capabilities(mut self, capabilities: ToolCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Segments of the dotted server key.
    pub fn server_key_path(&self) -> Vec<&str> {
        self.server_key.split('.').collect()
    }
}
