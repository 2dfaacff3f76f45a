mod support;

use onemcp_core::Error;
use onemcp_core::backup::parse_backup_timestamp;
use onemcp_core::mcp::ServerRecord;
use onemcp_core::reconcile::WriteStatus;
use onemcp_core::tool::SchemaFormat;
use serde_json::json;
use support::{Fixture, state_with};

const CONFIG: &str = ".cursor/mcp.json";

#[test]
fn retention_keeps_newest_snapshots() {
    let fx = Fixture::new();
    fx.write_json(CONFIG, &json!({"mcpServers": {}}));
    let manager = fx.backup_manager(10);
    let path = fx.canonical(CONFIG);

    let mut created = Vec::new();
    for _ in 0..12 {
        created.push(manager.backup(&path).unwrap().expect("file exists"));
    }

    let listed = manager.list_backups(&path).unwrap();
    assert_eq!(listed.len(), 10);
    let newest_first: Vec<String> = created.iter().rev().take(10).cloned().collect();
    assert_eq!(listed, newest_first);

    // The config itself plus ten snapshots.
    assert_eq!(fx.sibling_names(CONFIG).len(), 11);
}

#[test]
fn backup_of_missing_file_is_none() {
    let fx = Fixture::new();
    let manager = fx.backup_manager(10);
    assert_eq!(manager.backup(&fx.canonical(CONFIG)).unwrap(), None);
    assert!(manager.list_backups(&fx.canonical(CONFIG)).unwrap().is_empty());
}

#[test]
fn unrelated_siblings_are_not_listed() {
    let fx = Fixture::new();
    fx.write_json(CONFIG, &json!({}));
    fx.write_raw(".cursor/mcp.json.backup.notes", "x");
    fx.write_raw(".cursor/other.json.backup.2026-01-02T03-04-05-678Z", "{}");
    let manager = fx.backup_manager(10);

    let snapshot = manager.backup(&fx.canonical(CONFIG)).unwrap().unwrap();

    assert_eq!(manager.list_backups(&fx.canonical(CONFIG)).unwrap(), vec![snapshot]);
    assert!(fx.exists(".cursor/mcp.json.backup.notes"));
}

#[test]
fn restore_overwrites_target_with_snapshot() {
    let fx = Fixture::new();
    fx.write_json(CONFIG, &json!({"mcpServers": {"fs": {"command": "npx"}}}));
    let manager = fx.backup_manager(10);
    let path = fx.canonical(CONFIG);
    let snapshot = manager.backup(&path).unwrap().unwrap();

    fx.write_json(CONFIG, &json!({"mcpServers": {}}));
    manager.restore(&snapshot, &path).unwrap();

    assert_eq!(
        fx.read_json(CONFIG),
        json!({"mcpServers": {"fs": {"command": "npx"}}})
    );
}

#[test]
fn restoring_missing_snapshot_fails() {
    let fx = Fixture::new();
    fx.write_json(CONFIG, &json!({}));
    let manager = fx.backup_manager(10);
    let missing = format!("{}.backup.2026-01-02T03-04-05-678Z", fx.canonical(CONFIG));

    let err = manager.restore(&missing, &fx.canonical(CONFIG)).unwrap_err();
    assert!(matches!(err, Error::BackupMissing(_)));
    assert_eq!(fx.read_json(CONFIG), json!({}));
}

#[test]
fn reconciler_snapshots_before_each_write() {
    let fx = Fixture::new();
    fx.write_json(CONFIG, &json!({"mcpServers": {}}));
    let reconciler = fx.reconciler(true);
    let mut state = state_with(vec![fx.tool("cursor", CONFIG, SchemaFormat::McpServers)]);
    reconciler.load_all(&mut state);

    let report = reconciler
        .create(
            &mut state,
            ServerRecord::new("fs", "npx").with_enabled_tools(["cursor"]),
        )
        .unwrap();

    let outcome = report.outcome_for("cursor").unwrap();
    let snapshot = outcome.backup.clone().expect("snapshot taken");
    let snapshots = reconciler.backups().list_backups(&fx.canonical(CONFIG)).unwrap();
    assert_eq!(snapshots, vec![snapshot.clone()]);

    let bytes = std::fs::read(onemcp_core::fs::native_path(&snapshot)).unwrap();
    let before: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(before, json!({"mcpServers": {}}));
}

#[test]
fn first_write_to_new_file_has_no_snapshot() {
    let fx = Fixture::new();
    let reconciler = fx.reconciler(true);
    let mut state = state_with(vec![fx.tool("cursor", CONFIG, SchemaFormat::McpServers)]);

    let report = reconciler
        .create(
            &mut state,
            ServerRecord::new("fs", "npx").with_enabled_tools(["cursor"]),
        )
        .unwrap();

    assert_eq!(report.outcome_for("cursor").unwrap().backup, None);
    assert_eq!(fx.sibling_names(CONFIG), vec!["mcp.json"]);
}

#[test]
fn disabled_backups_leave_no_snapshots() {
    let fx = Fixture::new();
    fx.write_json(CONFIG, &json!({"mcpServers": {}}));
    let reconciler = fx.reconciler(false);
    let mut state = state_with(vec![fx.tool("cursor", CONFIG, SchemaFormat::McpServers)]);
    reconciler.load_all(&mut state);

    reconciler
        .create(
            &mut state,
            ServerRecord::new("fs", "npx").with_enabled_tools(["cursor"]),
        )
        .unwrap();

    assert_eq!(fx.sibling_names(CONFIG), vec!["mcp.json"]);
}

#[test]
fn restore_backup_snapshots_current_file_first() {
    let fx = Fixture::new();
    fx.write_json(CONFIG, &json!({"mcpServers": {"old": {"command": "o"}}}));
    let reconciler = fx.reconciler(true);
    let tool = fx.tool("cursor", CONFIG, SchemaFormat::McpServers);
    let snapshot = reconciler
        .backups()
        .backup(&tool.config_path)
        .unwrap()
        .unwrap();
    fx.write_json(CONFIG, &json!({"mcpServers": {"new": {"command": "n"}}}));

    let report = reconciler.restore_backup(&tool, &snapshot).unwrap();

    let outcome = report.outcome_for("cursor").unwrap();
    assert_eq!(outcome.status, WriteStatus::Written);
    assert_eq!(
        fx.read_json(CONFIG),
        json!({"mcpServers": {"old": {"command": "o"}}})
    );
    assert_eq!(reconciler.backups().list_backups(&tool.config_path).unwrap().len(), 2);
}

#[test]
fn restore_backup_with_missing_snapshot_changes_nothing() {
    let fx = Fixture::new();
    fx.write_json(CONFIG, &json!({"mcpServers": {}}));
    let reconciler = fx.reconciler(true);
    let tool = fx.tool("cursor", CONFIG, SchemaFormat::McpServers);
    let missing = format!("{}.backup.2026-01-02T03-04-05-678Z", tool.config_path);

    let err = reconciler.restore_backup(&tool, &missing).unwrap_err();

    assert!(matches!(err, Error::BackupMissing(_)));
    assert_eq!(fx.sibling_names(CONFIG), vec!["mcp.json"]);
}

#[test]
fn backup_records_carry_creation_time() {
    let fx = Fixture::new();
    fx.write_json(CONFIG, &json!({}));
    let manager = fx.backup_manager(10);
    let tool = fx.tool("cursor", CONFIG, SchemaFormat::McpServers);
    let first = manager.backup(&tool.config_path).unwrap().unwrap();
    let second = manager.backup(&tool.config_path).unwrap().unwrap();

    let records = manager.list_backup_records(&tool).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, second);
    assert_eq!(records[1].path, first);
    assert!(records.iter().all(|r| r.tool_id == "cursor"));
    assert!(records[0].created_at >= records[1].created_at);

    let stamp = first.rsplit(".backup.").next().unwrap();
    assert_eq!(parse_backup_timestamp(stamp), Some(records[1].created_at));
}
