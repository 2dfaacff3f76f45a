//! OneMCP Core Library
//!
//! Keeps the MCP server definitions of several AI tools in sync. Each tool's
//! own JSON config file is the source of truth; the engine merges them into
//! one canonical server list and writes changes back to every tool that has
//! a server enabled.

pub mod backup;
pub mod config;
pub mod context;
pub mod error;
pub mod fs;
pub mod interchange;
pub mod mcp;
pub mod reconcile;
pub mod tool;
pub mod types;

pub use error::{Error, Result};

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{PathResolver, PlatformPaths, Preferences, PreferencesStore};

    // Servers
    pub use crate::mcp::{
        ApprovalSettings, ServerRecord, ServerUpdate, ToolSettings, parse_args, stringify_args,
        validate_server,
    };

    // Tools
    pub use crate::tool::{
        CustomTool, SchemaFormat, ToolCapabilities, ToolDescriptor, ToolOverride, ToolRegistry,
    };

    // Reconciliation
    pub use crate::backup::{BackupManager, BackupRecord};
    pub use crate::reconcile::{
        AppState, LoadReport, MergeConflict, OperationReport, Reconciler, ToolWriteOutcome,
        WriteStatus,
    };

    // Interchange
    pub use crate::interchange::{ExportDocument, export_servers, import_servers};

    // Shared
    pub use crate::context::AppContext;
    pub use crate::error::{Error, Result};
    pub use crate::fs::{HostFs, LocalFs};
    pub use crate::types::{Platform, TransportType};
}
