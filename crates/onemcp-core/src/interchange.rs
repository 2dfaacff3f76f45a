//! Portable export/import of the canonical server list.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::mcp::{ServerRecord, ToolSettings, generate_server_id};
use crate::types::TransportType;

pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub servers: Vec<ExportedServer>,
}

/// A server without identity or timestamps. Every field is optional on
/// import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedServer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<TransportType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_settings: Option<ToolSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_tools: Option<Vec<String>>,
}

impl From<&ServerRecord> for ExportedServer {
    fn from(server: &ServerRecord) -> Self {
        Self {
            name: Some(server.name.clone()),
            command: Some(server.command.clone()),
            args: Some(server.args.clone()),
            env: server.env.clone(),
            cwd: server.cwd.clone(),
            transport_type: Some(server.transport),
            url: server.url.clone(),
            tool_settings: server.tool_settings.clone(),
            enabled_tools: server.enabled_tools.clone(),
        }
    }
}

/// Build the interchange document for `servers`.
///
/// A server enabled for every tool is written with `all_tools` spelled out,
/// since an omitted list imports as enabled nowhere.
pub fn export_servers(servers: &[ServerRecord], all_tools: &[String]) -> ExportDocument {
    let servers = servers
        .iter()
        .map(|server| {
            let mut exported = ExportedServer::from(server);
            if exported.enabled_tools.is_none() {
                exported.enabled_tools = Some(all_tools.to_vec());
            }
            exported
        })
        .collect();
    ExportDocument {
        version: EXPORT_VERSION.to_string(),
        exported_at: Utc::now(),
        servers,
    }
}

/// Pretty JSON form of [`export_servers`].
pub fn export_servers_json(
    servers: &[ServerRecord],
    all_tools: &[String],
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&export_servers(servers, all_tools))
}

/// Parse an interchange document into fresh server records.
///
/// Each record gets a new id and current timestamps. Missing names become
/// `Server N` (1-based), missing transport is stdio and missing enabled
/// tools is an empty list. Records are not validated here.
pub fn import_servers(json: &str) -> Result<Vec<ServerRecord>> {
    let document: Value = serde_json::from_str(json)
        .map_err(|e| Error::InvalidImport(format!("Parse error: {e}")))?;

    let entries = document
        .get("servers")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidImport("missing servers array".to_string()))?;

    let now = Utc::now();
    let mut servers = Vec::with_capacity(entries.len());
    for (index, raw) in entries.iter().enumerate() {
        let entry: ExportedServer = serde_json::from_value(raw.clone())
            .map_err(|e| Error::InvalidImport(format!("server {}: {e}", index + 1)))?;

        servers.push(ServerRecord {
            id: generate_server_id(),
            name: entry
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| format!("Server {}", index + 1)),
            command: entry.command.unwrap_or_default(),
            args: entry.args.unwrap_or_default(),
            env: entry.env.filter(|env| !env.is_empty()),
            cwd: entry.cwd,
            transport: entry.transport_type.unwrap_or_default(),
            url: entry.url,
            tool_settings: entry.tool_settings,
            enabled_tools: Some(entry.enabled_tools.unwrap_or_default()),
            created_at: Some(now),
            updated_at: Some(now),
        });
    }

    tracing::debug!("Parsed {} server(s) from import document", servers.len());
    Ok(servers)
}
