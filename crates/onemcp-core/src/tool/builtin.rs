//! Built-in tool definitions.

use crate::config::paths::PlatformPaths;

use super::{SchemaFormat, ToolCapabilities, ToolDefinition};

fn paths(win32: &str, darwin: &str, linux: Option<&str>) -> PlatformPaths {
    PlatformPaths {
        win32: Some(win32.to_string()),
        darwin: Some(darwin.to_string()),
        linux: linux.map(str::to_string),
    }
}

/// Paths under VS Code's per-user storage directory.
fn vscode_user_paths(rest: &str) -> PlatformPaths {
    paths(
        &format!("%APPDATA%/Code/User/{rest}"),
        &format!("~/Library/Application Support/Code/User/{rest}"),
        Some(&format!("~/.config/Code/User/{rest}")),
    )
}

fn definition(
    id: &str,
    name: &str,
    platforms: PlatformPaths,
    schema_format: SchemaFormat,
    capabilities: ToolCapabilities,
) -> ToolDefinition {
    ToolDefinition {
        id: id.to_string(),
        name: name.to_string(),
        platforms,
        schema_format,
        server_key: None,
        capabilities,
    }
}

/// Every tool the registry knows about out of the box.
pub fn builtin_definitions() -> Vec<ToolDefinition> {
    vec![
        definition(
            "claude-desktop",
            "Claude Desktop",
            paths(
                "%APPDATA%/Claude/claude_desktop_config.json",
                "~/Library/Application Support/Claude/claude_desktop_config.json",
                None,
            ),
            SchemaFormat::McpServers,
            ToolCapabilities::none(),
        ),
        definition(
            "claude-code",
            "Claude Code",
            PlatformPaths::everywhere("~/.claude.json"),
            SchemaFormat::McpServers,
            ToolCapabilities::none(),
        ),
        definition(
            "cursor",
            "Cursor",
            PlatformPaths::everywhere("~/.cursor/mcp.json"),
            SchemaFormat::McpServers,
            ToolCapabilities::none(),
        ),
        definition(
            "windsurf",
            "Windsurf",
            PlatformPaths::everywhere("~/.codeium/windsurf/mcp_config.json"),
            SchemaFormat::McpServers,
            ToolCapabilities::none(),
        ),
        definition(
            "vscode",
            "VS Code",
            vscode_user_paths("mcp.json"),
            SchemaFormat::Servers,
            ToolCapabilities::none(),
        ),
        definition(
            "roo-cline",
            "Roo Cline",
            vscode_user_paths(
                "globalStorage/rooveterinaryinc.roo-cline/settings/mcp_settings.json",
            ),
            SchemaFormat::McpServers,
            ToolCapabilities::all(),
        ),
        definition(
            "cline",
            "Cline",
            vscode_user_paths(
                "globalStorage/saoudrizwan.claude-dev/settings/cline_mcp_settings.json",
            ),
            SchemaFormat::McpServers,
            ToolCapabilities {
                always_allow: true,
                auto_approve: false,
                disabled: true,
            },
        ),
        definition(
            "vscode-settings",
            "VS Code (settings.json)",
            vscode_user_paths("settings.json"),
            SchemaFormat::NestedMcpServers,
            ToolCapabilities::none(),
        ),
    ]
}
