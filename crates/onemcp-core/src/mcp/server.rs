//! Tool-agnostic MCP server record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TransportType;

/// Approval/disable flags understood by the VS Code agent extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_allow: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_approve: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl ApprovalSettings {
    pub fn is_empty(&self) -> bool {
        self.always_allow.is_none() && self.auto_approve.is_none() && self.disabled.is_none()
    }
}

/// Per-tool-family extension data. Opaque to the generic engine; only
/// written to tools whose capabilities declare the matching flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(rename = "rooCline", default, skip_serializing_if = "Option::is_none")]
    pub approvals: Option<ApprovalSettings>,
}

/// A logical MCP server definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub id: String,
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(rename = "transportType", default)]
    pub transport: TransportType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_settings: Option<ToolSettings>,
    /// Tool ids this server should be written into. `None` means every tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fresh opaque server identifier.
pub fn generate_server_id() -> String {
    format!("server_{}", uuid::Uuid::new_v4().simple())
}

impl ServerRecord {
    /// New stdio server with a fresh id and no enabled tools.
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: generate_server_id(),
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: None,
            cwd: None,
            transport: TransportType::Stdio,
            url: None,
            tool_settings: None,
            enabled_tools: Some(Vec::new()),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Switch to HTTP transport at `url`.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.transport = TransportType::Http;
        self.url = Some(url.into());
        self
    }

    pub fn with_approvals(mut self, approvals: ApprovalSettings) -> Self {
        self.tool_settings = Some(ToolSettings {
            approvals: Some(approvals),
        });
        self
    }

    pub fn with_enabled_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids = Vec::new();
        for tool in tools {
            push_unique(&mut ids, tool.into());
        }
        self.enabled_tools = Some(ids);
        self
    }

    /// Whether this server belongs in `tool_id`'s config file.
    pub fn is_enabled_for(&self, tool_id: &str) -> bool {
        match &self.enabled_tools {
            Some(ids) => ids.iter().any(|id| id == tool_id),
            None => true,
        }
    }

    /// Explicitly enabled tool ids; an unset list contributes none.
    pub fn enabled_ids(&self) -> &[String] {
        self.enabled_tools.as_deref().unwrap_or(&[])
    }

    /// Add `tool_id` to the enabled set, keeping it duplicate-free.
    pub fn enable_tool(&mut self, tool_id: &str) {
        let ids = self.enabled_tools.get_or_insert_with(Vec::new);
        push_unique(ids, tool_id.to_string());
    }

    pub fn approvals(&self) -> Option<&ApprovalSettings> {
        self.tool_settings.as_ref()?.approvals.as_ref()
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

fn push_unique(ids: &mut Vec<String>, id: String) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

/// Partial update applied by an edit. Outer `None` leaves a field unchanged;
/// for optional fields `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ServerUpdate {
    pub name: Option<String>,
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    pub env: Option<Option<BTreeMap<String, String>>>,
    pub cwd: Option<Option<String>>,
    pub transport: Option<TransportType>,
    pub url: Option<Option<String>>,
    pub tool_settings: Option<Option<ToolSettings>>,
    pub enabled_tools: Option<Vec<String>>,
}

impl ServerUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn enabled_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.command.is_none()
            && self.args.is_none()
            && self.env.is_none()
            && self.cwd.is_none()
            && self.transport.is_none()
            && self.url.is_none()
            && self.tool_settings.is_none()
            && self.enabled_tools.is_none()
    }

    /// Produce the updated record. Identity and `created_at` are kept;
    /// `updated_at` is refreshed.
    pub fn apply(&self, original: &ServerRecord) -> ServerRecord {
        let mut updated = original.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(command) = &self.command {
            updated.command = command.clone();
        }
        if let Some(args) = &self.args {
            updated.args = args.clone();
        }
        if let Some(env) = &self.env {
            updated.env = env.clone().filter(|map| !map.is_empty());
        }
        if let Some(cwd) = &self.cwd {
            updated.cwd = cwd.clone();
        }
        if let Some(transport) = self.transport {
            updated.transport = transport;
        }
        if let Some(url) = &self.url {
            updated.url = url.clone();
        }
        if let Some(settings) = &self.tool_settings {
            updated.tool_settings = settings.clone();
        }
        if let Some(tools) = &self.enabled_tools {
            let mut ids = Vec::new();
            for tool in tools {
                push_unique(&mut ids, tool.clone());
            }
            updated.enabled_tools = Some(ids);
        }
        updated.touch();
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = generate_server_id();
        let b = generate_server_id();
        assert!(a.starts_with("server_"));
        assert_ne!(a, b);
    }

    #[test]
    fn unset_enabled_tools_means_all() {
        let mut server = ServerRecord::new("fs", "npx");
        server.enabled_tools = None;
        assert!(server.is_enabled_for("cursor"));
        assert!(server.enabled_ids().is_empty());

        let server = server.with_enabled_tools(["claude-desktop"]);
        assert!(server.is_enabled_for("claude-desktop"));
        assert!(!server.is_enabled_for("cursor"));
    }

    #[test]
    fn enable_tool_is_duplicate_free() {
        let mut server = ServerRecord::new("fs", "npx").with_enabled_tools(["a", "a", "b"]);
        server.enable_tool("b");
        server.enable_tool("c");
        assert_eq!(server.enabled_ids(), &["a", "b", "c"]);
    }

    #[test]
    fn update_keeps_identity_and_clears_fields() {
        let original = ServerRecord::new("fs", "npx")
            .with_cwd("/tmp")
            .with_env("TOKEN", "x")
            .with_enabled_tools(["a"]);

        let update = ServerUpdate {
            cwd: Some(None),
            env: Some(Some(BTreeMap::new())),
            ..ServerUpdate::new().command("uvx").enabled_tools(["b", "c"])
        };
        let updated = update.apply(&original);

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.name, "fs");
        assert_eq!(updated.command, "uvx");
        assert_eq!(updated.cwd, None);
        assert_eq!(updated.env, None);
        assert_eq!(updated.enabled_ids(), &["b", "c"]);
        assert!(updated.updated_at.is_some());
    }

    #[test]
    fn serializes_with_interchange_field_names() {
        let server = ServerRecord::new("web", "").with_url("https://example.com/mcp");
        let value = serde_json::to_value(&server).unwrap();
        assert_eq!(value["transportType"], "http");
        assert_eq!(value["url"], "https://example.com/mcp");
        assert_eq!(value["enabledTools"], serde_json::json!([]));
    }
}
