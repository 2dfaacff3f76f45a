use onemcp_core::config::{Preferences, PreferencesStore};
use onemcp_core::context::AppContext;
use onemcp_core::fs::canonical_string;
use onemcp_core::mcp::ServerRecord;
use onemcp_core::tool::{SchemaFormat, ToolOverride};
use onemcp_core::types::Platform;
use serde_json::json;
use tempfile::TempDir;

fn context(temp: &TempDir, platform: Platform) -> AppContext {
    let home = temp.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    AppContext::new(home, platform, temp.path().join("config/onemcp.toml"))
}

fn write(path: std::path::PathBuf, value: serde_json::Value) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
}

#[test]
fn app_context_creates_from_paths() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, Platform::Linux);

    assert_eq!(ctx.home_dir(), temp.path().join("home"));
    assert_eq!(ctx.platform(), Platform::Linux);
    assert_eq!(ctx.preferences_path(), temp.path().join("config/onemcp.toml"));
    assert_eq!(ctx.resolver().home(), canonical_string(&temp.path().join("home")));
}

#[test]
fn linux_listing_excludes_claude_desktop() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, Platform::Linux);

    let tools = ctx.list_tools(&Preferences::new());
    let ids: Vec<&str> = tools.iter().map(|t| t.id.as_str()).collect();

    assert!(!ids.contains(&"claude-desktop"));
    assert!(ids.contains(&"cursor"));
    assert!(ids.contains(&"vscode"));
    assert!(tools.iter().all(|t| t.is_built_in));
}

#[test]
fn windows_listing_expands_appdata() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, Platform::Windows);
    let home = canonical_string(ctx.home_dir());

    let tools = ctx.list_tools(&Preferences::new());
    let desktop = tools.iter().find(|t| t.id == "claude-desktop").unwrap();

    assert_eq!(
        desktop.config_path,
        format!("{home}/AppData/Roaming/Claude/claude_desktop_config.json")
    );
}

#[test]
fn installed_flag_follows_file_presence() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, Platform::Linux);
    write(ctx.home_dir().join(".cursor/mcp.json"), json!({}));

    let tools = ctx.list_tools(&Preferences::new());

    let installed: Vec<&str> = tools
        .iter()
        .filter(|t| t.is_installed)
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(installed, vec!["cursor"]);
}

#[test]
fn overrides_and_hidden_tools_apply() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, Platform::Linux);
    let mut prefs = Preferences::new();
    prefs.set_hidden("windsurf", true);
    prefs.set_override(
        "cursor",
        ToolOverride {
            name: Some("Cursor Nightly".to_string()),
            config_path: Some("~/nightly/mcp.json".to_string()),
        },
    );

    let tools = ctx.list_tools(&prefs);

    assert!(tools.iter().all(|t| t.id != "windsurf"));
    let cursor = tools.iter().find(|t| t.id == "cursor").unwrap();
    assert_eq!(cursor.name, "Cursor Nightly");
    assert_eq!(
        cursor.config_path,
        format!("{}/nightly/mcp.json", canonical_string(ctx.home_dir()))
    );
}

#[test]
fn preferences_drive_reconciler_and_backups() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, Platform::Linux);
    let cursor_path = ctx.home_dir().join(".cursor/mcp.json");
    write(cursor_path.clone(), json!({"mcpServers": {"fs": {"command": "npx"}}}));

    let store = ctx.preferences_store();
    let mut prefs = store.load().unwrap();
    prefs.max_backups = 2;
    store.save(&prefs).unwrap();

    let prefs = ctx.load_preferences().unwrap();
    let reconciler = ctx.reconciler(&prefs);
    assert_eq!(reconciler.backups().max_backups(), 2);

    let (mut state, report) = ctx.load_state(&prefs, &reconciler);
    assert!(report.failures.is_empty());
    assert_eq!(state.servers.len(), 1);

    for name in ["a", "b", "c"] {
        reconciler
            .create(
                &mut state,
                ServerRecord::new(name, "npx").with_enabled_tools(["cursor"]),
            )
            .unwrap();
    }

    let cursor = state.tool("cursor").unwrap();
    assert_eq!(reconciler.backups().list_backups(&cursor.config_path).unwrap().len(), 2);
    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&cursor_path).unwrap()).unwrap();
    assert_eq!(written["mcpServers"].as_object().unwrap().len(), 4);
}

#[test]
fn custom_tool_survives_preferences_roundtrip() {
    let temp = TempDir::new().unwrap();
    let ctx = context(&temp, Platform::Linux);
    write(
        ctx.home_dir().join(".zed/settings.json"),
        json!({"mcp": {"servers": {"fs": {"command": "npx"}}}}),
    );

    let mut prefs = ctx.load_preferences().unwrap();
    ctx.register_custom_tool(&mut prefs, "zed", "Zed", "~/.zed/settings.json", None, None)
        .unwrap();
    PreferencesStore::from_path(ctx.preferences_path())
        .save(&prefs)
        .unwrap();

    let reloaded = ctx.load_preferences().unwrap();
    assert_eq!(reloaded.custom_tools[0].schema_format, SchemaFormat::NestedMcpServers);

    let reconciler = ctx.reconciler(&reloaded);
    let (state, _) = ctx.load_state(&reloaded, &reconciler);
    let fs = state.server_by_name("fs").unwrap();
    assert_eq!(fs.enabled_ids(), &["zed"]);
}
