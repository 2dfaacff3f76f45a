//! Preferences schema for onemcp.toml
//!
//! Holds everything the user can change about the tool set and the backup
//! policy. Server definitions are not stored here; they live in the tool
//! config files themselves.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::tool::{CustomTool, ToolOverride, builtin_definitions};

/// Root structure of onemcp.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Snapshot tool files before every write
    #[serde(default = "default_backup_enabled")]
    pub backup_enabled: bool,

    /// Snapshots kept per tool file
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// Tool ids excluded from reconciliation
    #[serde(default)]
    pub hidden_tools: Vec<String>,

    /// User-added tools
    #[serde(default)]
    pub custom_tools: Vec<CustomTool>,

    /// Name/path overrides keyed by tool id
    #[serde(default)]
    pub tool_overrides: BTreeMap<String, ToolOverride>,
}

fn default_backup_enabled() -> bool {
    true
}

fn default_max_backups() -> usize {
    crate::backup::DEFAULT_MAX_BACKUPS
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            backup_enabled: default_backup_enabled(),
            max_backups: default_max_backups(),
            hidden_tools: Vec::new(),
            custom_tools: Vec::new(),
            tool_overrides: BTreeMap::new(),
        }
    }
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the preferences
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_backups == 0 {
            anyhow::bail!("max_backups must be at least 1");
        }

        let built_in: HashSet<String> = builtin_definitions().into_iter().map(|d| d.id).collect();
        let mut seen = HashSet::new();
        for tool in &self.custom_tools {
            if tool.id.trim().is_empty() {
                anyhow::bail!("Custom tool '{}' has an empty id", tool.name);
            }
            if built_in.contains(&tool.id) {
                anyhow::bail!(
                    "Custom tool id '{}' collides with a built-in tool",
                    tool.id
                );
            }
            if !seen.insert(tool.id.as_str()) {
                anyhow::bail!("Duplicate custom tool id '{}'", tool.id);
            }
            if tool.config_path.trim().is_empty() {
                anyhow::bail!("Custom tool '{}' has an empty config path", tool.id);
            }
        }

        Ok(())
    }

    /// Add a custom tool, rejecting it if the result would not validate.
    pub fn add_custom_tool(&mut self, tool: CustomTool) -> anyhow::Result<()> {
        self.custom_tools.push(tool);
        if let Err(err) = self.validate() {
            self.custom_tools.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Remove a custom tool by id. Returns whether it existed.
    pub fn remove_custom_tool(&mut self, id: &str) -> bool {
        let before = self.custom_tools.len();
        self.custom_tools.retain(|tool| tool.id != id);
        self.tool_overrides.remove(id);
        self.custom_tools.len() != before
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden_tools.iter().any(|hidden| hidden == id)
    }

    /// Hide or unhide a tool.
    pub fn set_hidden(&mut self, id: &str, hidden: bool) {
        if hidden {
            if !self.is_hidden(id) {
                self.hidden_tools.push(id.to_string());
            }
        } else {
            self.hidden_tools.retain(|existing| existing != id);
        }
    }

    /// Set or clear a tool override. An override with no fields is removed.
    pub fn set_override(&mut self, id: &str, tool_override: ToolOverride) {
        if tool_override.name.is_none() && tool_override.config_path.is_none() {
            self.tool_overrides.remove(id);
        } else {
            self.tool_overrides.insert(id.to_string(), tool_override);
        }
    }
}
