//! Configuration: user preferences, path resolution and the tool config codec.
//!
//! - `onemcp.toml` holds preferences (backup policy, custom tools, overrides)
//! - `paths` expands per-platform path templates
//! - `client_config` reads and rebuilds third-party tool config documents

pub mod client_config;
pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

pub use client_config::{
    JsonSerializer, build_full_config, servers_to_tool_config, tool_config_to_servers,
    undecodable_entries,
};
pub use parser::{parse_preferences_toml, parse_preferences_toml_str, to_toml};
pub use paths::{PathResolver, PlatformPaths};
pub use schema::Preferences;
pub use store::{PREFERENCES_FILE, PreferencesStore, default_preferences_path};
