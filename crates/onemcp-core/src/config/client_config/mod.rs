//! Conversion between a tool's raw JSON document and server records.
//!
//! Only the object at the tool's server key is engine-owned. Everything else
//! in the document is carried through untouched.

mod json;
mod key_path;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::mcp::{ApprovalSettings, ServerRecord, ToolSettings, generate_server_id};
use crate::tool::{ToolCapabilities, ToolDescriptor};
use crate::types::TransportType;

pub use json::JsonSerializer;
pub use key_path::{get_map_at_path, set_map_at_path};

/// One server entry as tools store it on disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolServerEntry {
    #[serde(default)]
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: Option<BTreeMap<String, String>>,
    #[serde(default)]
    cwd: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    always_allow: Option<Vec<String>>,
    #[serde(default)]
    auto_approve: Option<Vec<String>>,
    #[serde(default)]
    disabled: Option<bool>,
}

impl ToolServerEntry {
    fn approvals(&self, capabilities: ToolCapabilities) -> Option<ApprovalSettings> {
        let settings = ApprovalSettings {
            always_allow: self
                .always_allow
                .clone()
                .filter(|_| capabilities.always_allow),
            auto_approve: self
                .auto_approve
                .clone()
                .filter(|_| capabilities.auto_approve),
            disabled: self.disabled.filter(|_| capabilities.disabled),
        };
        (!settings.is_empty()).then_some(settings)
    }
}

/// Decode the servers stored in `document` for `tool`.
///
/// A missing or non-object server section is an empty list. Entries that do
/// not look like server definitions are skipped. Every record gets a fresh
/// id and is enabled for exactly this tool.
pub fn tool_config_to_servers(
    document: &Map<String, Value>,
    tool: &ToolDescriptor,
) -> Vec<ServerRecord> {
    let Some(section) = get_map_at_path(document, &tool.server_key_path()) else {
        return Vec::new();
    };

    let mut servers = Vec::with_capacity(section.len());
    for (name, raw) in section {
        let entry = match decode_entry(raw) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    "Skipping server '{}' in {}: {}",
                    name,
                    tool.config_path,
                    err
                );
                continue;
            }
        };

        let url = entry.url.clone().filter(|u| !u.is_empty());
        let transport = if url.is_some() {
            TransportType::Http
        } else {
            TransportType::Stdio
        };
        let tool_settings = entry
            .approvals(tool.capabilities)
            .map(|approvals| ToolSettings {
                approvals: Some(approvals),
            });

        servers.push(ServerRecord {
            id: generate_server_id(),
            name: name.clone(),
            command: entry.command,
            args: entry.args,
            env: entry.env,
            cwd: entry.cwd,
            transport,
            url,
            tool_settings,
            enabled_tools: Some(vec![tool.id.clone()]),
            created_at: None,
            updated_at: None,
        });
    }
    servers
}

/// Parse one on-disk entry. Scalar `env` values and `args` items are
/// accepted as strings.
fn decode_entry(raw: &Value) -> serde_json::Result<ToolServerEntry> {
    let mut raw = raw.clone();
    if let Value::Object(entry) = &mut raw {
        if let Some(Value::Object(env)) = entry.get_mut("env") {
            for value in env.values_mut() {
                stringify_scalar(value);
            }
        }
        if let Some(Value::Array(args)) = entry.get_mut("args") {
            args.iter_mut().for_each(stringify_scalar);
        }
    }
    serde_json::from_value(raw)
}

fn stringify_scalar(value: &mut Value) {
    match value {
        Value::Number(n) => *value = Value::String(n.to_string()),
        Value::Bool(b) => *value = Value::String(b.to_string()),
        _ => {}
    }
}

/// Entries in `document`'s server section that cannot be decoded, verbatim.
///
/// They never reach the canonical list, so writers put them back unchanged
/// instead of dropping them.
pub fn undecodable_entries(
    document: &Map<String, Value>,
    tool: &ToolDescriptor,
) -> Map<String, Value> {
    let Some(section) = get_map_at_path(document, &tool.server_key_path()) else {
        return Map::new();
    };
    section
        .iter()
        .filter(|(_, raw)| decode_entry(raw).is_err())
        .map(|(name, raw)| (name.clone(), raw.clone()))
        .collect()
}

/// Encode the servers enabled for `tool` into its on-disk server map.
///
/// Key order follows the input order.
pub fn servers_to_tool_config<'a>(
    servers: impl IntoIterator<Item = &'a ServerRecord>,
    tool: &ToolDescriptor,
) -> Map<String, Value> {
    let mut map = Map::new();
    for server in servers {
        if !server.is_enabled_for(&tool.id) {
            continue;
        }
        map.insert(server.name.clone(), encode_entry(server, tool.capabilities));
    }
    map
}

fn encode_entry(server: &ServerRecord, capabilities: ToolCapabilities) -> Value {
    let mut entry = Map::new();
    entry.insert("command".to_string(), Value::String(server.command.clone()));

    if !server.args.is_empty() {
        entry.insert("args".to_string(), string_array(&server.args));
    }
    if let Some(env) = server.env.as_ref().filter(|env| !env.is_empty()) {
        let env = env
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        entry.insert("env".to_string(), Value::Object(env));
    }
    if let Some(cwd) = &server.cwd {
        entry.insert("cwd".to_string(), Value::String(cwd.clone()));
    }
    if server.transport == TransportType::Http
        && let Some(url) = &server.url
    {
        entry.insert("url".to_string(), Value::String(url.clone()));
    }

    if let Some(approvals) = server.approvals() {
        if capabilities.always_allow
            && let Some(list) = &approvals.always_allow
        {
            entry.insert("alwaysAllow".to_string(), string_array(list));
        }
        if capabilities.auto_approve
            && let Some(list) = &approvals.auto_approve
        {
            entry.insert("autoApprove".to_string(), string_array(list));
        }
        if capabilities.disabled
            && let Some(disabled) = approvals.disabled
        {
            entry.insert("disabled".to_string(), Value::Bool(disabled));
        }
    }

    Value::Object(entry)
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

/// Rebuild `existing` with `server_map` placed at the tool's server key.
///
/// Every key outside that path, including siblings at intermediate levels,
/// is preserved.
pub fn build_full_config(
    existing: &Map<String, Value>,
    server_map: Map<String, Value>,
    tool: &ToolDescriptor,
) -> Map<String, Value> {
    let mut document = existing.clone();
    set_map_at_path(&mut document, &tool.server_key_path(), server_map);
    document
}
