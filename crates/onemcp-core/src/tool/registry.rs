//! Tool registry: built-in and custom definitions, overrides and hidden ids.
//!
//! The registry is static data until [`ToolRegistry::list_tools`] resolves it
//! against a [`PathResolver`] and checks each path on the host filesystem.

use std::collections::{HashMap, HashSet};

use crate::config::Preferences;
use crate::config::paths::PathResolver;
use crate::fs::HostFs;

use super::{CustomTool, ToolDefinition, ToolDescriptor, ToolOverride, builtin_definitions};

#[derive(Debug, Clone)]
struct Entry {
    definition: ToolDefinition,
    is_built_in: bool,
}

/// Registry of known tools.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
    overrides: HashMap<String, ToolOverride>,
    hidden: HashSet<String>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in tool.
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        for definition in builtin_definitions() {
            registry.entries.push(Entry {
                definition,
                is_built_in: true,
            });
        }
        registry
    }

    /// Built-ins plus the user's custom tools, overrides and hidden set.
    pub fn from_preferences(preferences: &Preferences) -> Self {
        let mut registry = Self::with_builtin_tools();
        for tool in &preferences.custom_tools {
            registry.add_custom(tool);
        }
        for (id, tool_override) in &preferences.tool_overrides {
            registry.set_override(id.clone(), tool_override.clone());
        }
        for id in &preferences.hidden_tools {
            registry.hide(id.clone());
        }
        registry
    }

    /// Register a custom tool. Ids already present are ignored.
    pub fn add_custom(&mut self, tool: &CustomTool) {
        if self.definition(&tool.id).is_some() {
            tracing::warn!("Ignoring custom tool '{}': id already registered", tool.id);
            return;
        }
        self.entries.push(Entry {
            definition: tool.to_definition(),
            is_built_in: false,
        });
    }

    pub fn set_override(&mut self, id: impl Into<String>, tool_override: ToolOverride) {
        self.overrides.insert(id.into(), tool_override);
    }

    pub fn hide(&mut self, id: impl Into<String>) {
        self.hidden.insert(id.into());
    }

    /// Get a definition by id, hidden or not.
    pub fn definition(&self, id: &str) -> Option<&ToolDefinition> {
        self.entries
            .iter()
            .find(|e| e.definition.id == id)
            .map(|e| &e.definition)
    }

    pub fn is_built_in(&self, id: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.is_built_in && e.definition.id == id)
    }

    /// All registered ids in registry order.
    pub fn tool_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.definition.id.as_str())
            .collect()
    }

    /// Resolve every visible tool for the resolver's platform.
    ///
    /// Tools without a template for the platform are dropped. Overrides
    /// replace the display name and the resolved path; `is_installed` reflects
    /// whether the resolved file exists right now.
    pub fn list_tools(&self, resolver: &PathResolver, fs: &dyn HostFs) -> Vec<ToolDescriptor> {
        let mut tools = Vec::new();

        for entry in &self.entries {
            let definition = &entry.definition;
            if self.hidden.contains(&definition.id) {
                continue;
            }

            let Some(mut config_path) = resolver.resolve_for_platform(&definition.platforms) else {
                tracing::debug!(
                    "Tool '{}' has no config path on {}",
                    definition.id,
                    resolver.platform()
                );
                continue;
            };

            let mut name = definition.name.clone();
            if let Some(tool_override) = self.overrides.get(&definition.id) {
                if let Some(override_name) = tool_override
                    .name
                    .as_ref()
                    .filter(|n| !n.trim().is_empty())
                {
                    name = override_name.clone();
                }
                if let Some(override_path) = tool_override
                    .config_path
                    .as_ref()
                    .filter(|p| !p.trim().is_empty())
                {
                    config_path = resolver.resolve(override_path);
                }
            }

            let is_installed = fs.exists(&config_path);
            tools.push(ToolDescriptor {
                id: definition.id.clone(),
                name,
                config_path,
                schema_format: definition.schema_format,
                server_key: definition.server_key(),
                capabilities: definition.capabilities,
                is_built_in: entry.is_built_in,
                is_installed,
            });
        }

        tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::tool::SchemaFormat;
    use crate::types::Platform;

    /// Filesystem where exactly the listed paths exist.
    #[derive(Debug, Default)]
    struct PresentFiles(Vec<String>);

    impl HostFs for PresentFiles {
        fn read(&self, _path: &str) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }
        fn write(&self, _path: &str, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }
        fn exists(&self, path: &str) -> bool {
            self.0.iter().any(|p| p == path)
        }
        fn copy(&self, _src: &str, _dst: &str) -> Result<()> {
            Ok(())
        }
        fn list_dir(&self, _path: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn remove(&self, _path: &str) -> Result<()> {
            Ok(())
        }
    }

    fn linux() -> PathResolver {
        PathResolver::new(Platform::Linux, "/home/u")
    }

    #[test]
    fn test_builtin_tools_registered() {
        let registry = ToolRegistry::with_builtin_tools();
        let ids = registry.tool_ids();

        assert!(ids.contains(&"claude-desktop"));
        assert!(ids.contains(&"cursor"));
        assert!(ids.contains(&"vscode"));
        assert!(registry.is_built_in("cursor"));
        assert!(registry.definition("nonexistent").is_none());
    }

    #[test]
    fn test_tool_without_platform_template_is_dropped() {
        let registry = ToolRegistry::with_builtin_tools();
        let tools = registry.list_tools(&linux(), &PresentFiles::default());

        assert!(!tools.iter().any(|t| t.id == "claude-desktop"));
        assert!(tools.iter().any(|t| t.id == "cursor"));
    }

    #[test]
    fn test_installed_flag_reflects_existence() {
        let registry = ToolRegistry::with_builtin_tools();
        let fs = PresentFiles(vec!["/home/u/.cursor/mcp.json".to_string()]);
        let tools = registry.list_tools(&linux(), &fs);

        let cursor = tools.iter().find(|t| t.id == "cursor").expect("cursor listed");
        assert!(cursor.is_installed);
        assert!(cursor.is_built_in);
        let windsurf = tools.iter().find(|t| t.id == "windsurf").expect("windsurf listed");
        assert!(!windsurf.is_installed);
    }

    #[test]
    fn test_override_replaces_name_and_resolved_path() {
        let mut registry = ToolRegistry::with_builtin_tools();
        registry.set_override(
            "cursor",
            ToolOverride {
                name: Some("Cursor Nightly".to_string()),
                config_path: Some("~/.cursor-nightly/mcp.json".to_string()),
            },
        );
        let tools = registry.list_tools(&linux(), &PresentFiles::default());
        let cursor = tools.iter().find(|t| t.id == "cursor").expect("cursor listed");

        assert_eq!(cursor.name, "Cursor Nightly");
        assert_eq!(cursor.config_path, "/home/u/.cursor-nightly/mcp.json");
    }

    #[test]
    fn test_hidden_tools_are_excluded() {
        let mut registry = ToolRegistry::with_builtin_tools();
        registry.hide("cursor");
        let tools = registry.list_tools(&linux(), &PresentFiles::default());

        assert!(!tools.iter().any(|t| t.id == "cursor"));
        assert!(registry.definition("cursor").is_some());
    }

    #[test]
    fn test_custom_tool_listed_after_builtins() {
        let mut registry = ToolRegistry::with_builtin_tools();
        let custom = CustomTool::new(
            "zed",
            "Zed",
            "~/.config/zed/settings.json",
            SchemaFormat::McpServers,
            Some("context_servers".to_string()),
        );
        registry.add_custom(&custom);
        registry.add_custom(&custom);

        let tools = registry.list_tools(&linux(), &PresentFiles::default());
        let last = tools.last().expect("tools listed");
        assert_eq!(last.id, "zed");
        assert!(!last.is_built_in);
        assert_eq!(last.server_key, "context_servers");
        assert_eq!(last.config_path, "/home/u/.config/zed/settings.json");
        assert_eq!(tools.iter().filter(|t| t.id == "zed").count(), 1);
    }
}
