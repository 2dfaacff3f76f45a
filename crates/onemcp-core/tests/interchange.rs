mod support;

use onemcp_core::Error;
use onemcp_core::interchange::{export_servers_json, import_servers};
use onemcp_core::mcp::ServerRecord;
use onemcp_core::tool::SchemaFormat;
use onemcp_core::types::TransportType;
use serde_json::json;
use support::{Fixture, state_with};

#[test]
fn exported_servers_import_into_another_machine() {
    let source = vec![
        ServerRecord::new("fs", "npx")
            .with_args(["-y", "server-fs"])
            .with_env("ROOT", "/data")
            .with_enabled_tools(["cursor"]),
        ServerRecord::new("remote", "mcp-remote")
            .with_url("https://mcp.example.com/sse")
            .with_enabled_tools(["cursor"]),
    ];
    let exported = export_servers_json(&source, &[]).unwrap();

    let fx = Fixture::new();
    let reconciler = fx.reconciler(false);
    let mut state = state_with(vec![fx.tool("cursor", ".cursor/mcp.json", SchemaFormat::McpServers)]);

    let imported = import_servers(&exported).unwrap();
    assert_eq!(imported.len(), 2);
    for server in imported {
        assert!(!source.iter().any(|s| s.id == server.id));
        reconciler.create(&mut state, server).unwrap();
    }

    assert_eq!(
        fx.read_json(".cursor/mcp.json"),
        json!({"mcpServers": {
            "fs": {"command": "npx", "args": ["-y", "server-fs"], "env": {"ROOT": "/data"}},
            "remote": {"command": "mcp-remote", "url": "https://mcp.example.com/sse"}
        }})
    );
    assert_eq!(
        state.server_by_name("remote").unwrap().transport,
        TransportType::Http
    );
}

#[test]
fn import_fills_missing_fields() {
    let imported = import_servers(r#"{"servers": [{"command": "npx"}, {"name": "named"}]}"#).unwrap();

    assert_eq!(imported[0].name, "Server 1");
    assert_eq!(imported[0].transport, TransportType::Stdio);
    assert_eq!(imported[0].enabled_tools, Some(vec![]));
    assert_eq!(imported[1].name, "named");
    assert_eq!(imported[1].command, "");
    assert!(imported.iter().all(|s| s.created_at.is_some()));
}

#[test]
fn import_rejects_documents_without_servers() {
    for input in ["not json", r#"{"version": "1.0"}"#, r#"{"servers": {}}"#] {
        let err = import_servers(input).unwrap_err();
        assert!(matches!(err, Error::InvalidImport(_)), "{input}");
    }
}

#[test]
fn imported_duplicate_is_rejected_on_create() {
    let fx = Fixture::new();
    fx.write_json(".cursor/mcp.json", &json!({"mcpServers": {"fs": {"command": "npx"}}}));
    let reconciler = fx.reconciler(false);
    let mut state = state_with(vec![fx.tool("cursor", ".cursor/mcp.json", SchemaFormat::McpServers)]);
    reconciler.load_all(&mut state);

    let exported = export_servers_json(&state.servers, &[]).unwrap();
    let imported = import_servers(&exported).unwrap();
    let err = reconciler
        .create(&mut state, imported.into_iter().next().unwrap())
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateName(_)));
}

#[test]
fn server_enabled_everywhere_survives_export_and_import() {
    let fx = Fixture::new();
    let reconciler = fx.reconciler(false);
    let mut state = state_with(vec![
        fx.tool("cursor", ".cursor/mcp.json", SchemaFormat::McpServers),
        fx.tool("vscode", ".vscode/mcp.json", SchemaFormat::McpServers),
    ]);
    let mut everywhere = ServerRecord::new("fs", "npx");
    everywhere.enabled_tools = None;
    let all_tools = vec!["cursor".to_string(), "vscode".to_string()];

    let exported = export_servers_json(&[everywhere], &all_tools).unwrap();
    let server = import_servers(&exported).unwrap().remove(0);
    let report = reconciler.create(&mut state, server).unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(fx.read_json(".cursor/mcp.json")["mcpServers"]["fs"]["command"], "npx");
    assert_eq!(fx.read_json(".vscode/mcp.json")["mcpServers"]["fs"]["command"], "npx");
}

#[test]
fn import_without_tools_is_reported_as_not_persisted() {
    let fx = Fixture::new();
    let reconciler = fx.reconciler(false);
    let mut state = state_with(vec![fx.tool("cursor", ".cursor/mcp.json", SchemaFormat::McpServers)]);

    let server = import_servers(r#"{"servers": [{"name": "fs", "command": "npx"}]}"#)
        .unwrap()
        .remove(0);
    let report = reconciler.create(&mut state, server).unwrap();

    assert!(report.outcomes.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert!(!fx.exists(".cursor/mcp.json"));
}
