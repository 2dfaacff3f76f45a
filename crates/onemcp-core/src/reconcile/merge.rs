//! Name-keyed merging of server lists coming from different tools.

use serde::Serialize;
use serde_json::json;

use crate::mcp::ServerRecord;

/// Two tools define the same server name with different definitions. The
/// first tool's definition was kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeConflict {
    pub name: String,
    pub kept_from: String,
    pub ignored_from: String,
}

/// Merge `incoming` into `canonical` by server name.
///
/// Unseen names are appended. A name already present keeps its definition
/// and only gains the incoming record's enabled tools; if the definitions
/// differ a [`MergeConflict`] is returned for it. Tool extension settings
/// are adopted from the incoming record when the canonical one has none.
pub fn merge_servers(
    canonical: &mut Vec<ServerRecord>,
    incoming: Vec<ServerRecord>,
) -> Vec<MergeConflict> {
    let mut conflicts = Vec::new();

    for server in incoming {
        let Some(existing) = canonical.iter_mut().find(|s| s.name == server.name) else {
            canonical.push(server);
            continue;
        };

        if definition_fingerprint(existing) != definition_fingerprint(&server) {
            let conflict = MergeConflict {
                name: server.name.clone(),
                kept_from: first_tool(existing),
                ignored_from: first_tool(&server),
            };
            tracing::warn!(
                "Server '{}' differs between '{}' and '{}'; keeping the definition from '{}'",
                conflict.name,
                conflict.kept_from,
                conflict.ignored_from,
                conflict.kept_from
            );
            conflicts.push(conflict);
        }

        for tool_id in server.enabled_ids() {
            existing.enable_tool(tool_id);
        }
        if existing.tool_settings.is_none() && server.tool_settings.is_some() {
            existing.tool_settings = server.tool_settings;
        }
    }

    conflicts
}

fn first_tool(server: &ServerRecord) -> String {
    server.enabled_ids().first().cloned().unwrap_or_default()
}

/// Stable hash over the fields that define how a server is launched.
pub fn definition_fingerprint(server: &ServerRecord) -> String {
    let url = match server.transport {
        crate::types::TransportType::Http => server.url.as_deref(),
        crate::types::TransportType::Stdio => None,
    };
    let definition = json!({
        "command": server.command,
        "args": server.args,
        "env": server.env.as_ref().filter(|env| !env.is_empty()),
        "cwd": server.cwd,
        "transport": server.transport,
        "url": url,
    });
    let bytes = serde_json::to_vec(&definition).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}
