//! Application context for unified dependency injection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backup::BackupManager;
use crate::config::client_config::JsonSerializer;
use crate::config::{PathResolver, Preferences, PreferencesStore, default_preferences_path};
use crate::fs::{HostFs, LocalFs, canonical_string};
use crate::reconcile::{AppState, LoadReport, Reconciler};
use crate::tool::{CustomTool, SchemaFormat, ToolDescriptor, ToolRegistry, detect_config_format};
use crate::types::Platform;

/// Everything a front end needs to drive the engine.
///
/// Front ends create this once, load preferences through it and ask it for
/// the registry, backup manager and reconciler.
#[derive(Debug, Clone)]
pub struct AppContext {
    home_dir: PathBuf,
    platform: Platform,
    preferences_path: PathBuf,
    fs: Arc<dyn HostFs>,
}

impl AppContext {
    /// Create a new context with explicit paths over the local filesystem.
    pub fn new(home_dir: PathBuf, platform: Platform, preferences_path: PathBuf) -> Self {
        Self {
            home_dir,
            platform,
            preferences_path,
            fs: Arc::new(LocalFs::new()),
        }
    }

    /// Context for the running user and platform. `preferences_path`
    /// overrides the default preferences location.
    pub fn from_env(preferences_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let home_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        let preferences_path = match preferences_path {
            Some(path) => path,
            None => default_preferences_path()?,
        };
        Ok(Self::new(home_dir, Platform::current(), preferences_path))
    }

    /// Swap the filesystem implementation.
    pub fn with_fs(mut self, fs: Arc<dyn HostFs>) -> Self {
        self.fs = fs;
        self
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn preferences_path(&self) -> &Path {
        &self.preferences_path
    }

    pub fn fs(&self) -> Arc<dyn HostFs> {
        Arc::clone(&self.fs)
    }

    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(self.platform, canonical_string(&self.home_dir))
    }

    pub fn preferences_store(&self) -> PreferencesStore {
        PreferencesStore::from_path(self.preferences_path.clone())
    }

    pub fn load_preferences(&self) -> anyhow::Result<Preferences> {
        self.preferences_store().load()
    }

    pub fn tool_registry(&self, preferences: &Preferences) -> ToolRegistry {
        ToolRegistry::from_preferences(preferences)
    }

    /// Resolved, visible tools with their installed flags.
    pub fn list_tools(&self, preferences: &Preferences) -> Vec<ToolDescriptor> {
        self.tool_registry(preferences)
            .list_tools(&self.resolver(), self.fs.as_ref())
    }

    pub fn backup_manager(&self, preferences: &Preferences) -> BackupManager {
        BackupManager::new(self.fs(), preferences.max_backups)
    }

    pub fn reconciler(&self, preferences: &Preferences) -> Reconciler {
        Reconciler::new(self.fs(), self.backup_manager(preferences))
            .with_backups_enabled(preferences.backup_enabled)
    }

    /// Resolve tools and load the canonical server list from them.
    pub fn load_state(
        &self,
        preferences: &Preferences,
        reconciler: &Reconciler,
    ) -> (AppState, LoadReport) {
        let mut state = AppState::new(self.list_tools(preferences));
        let report = reconciler.load_all(&mut state);
        (state, report)
    }

    /// Build a custom tool and add it to `preferences` (not saved).
    ///
    /// Without an explicit format the existing file is inspected; files that
    /// are absent, unreadable or show no known key default to `mcpServers`.
    pub fn register_custom_tool(
        &self,
        preferences: &mut Preferences,
        id: &str,
        name: &str,
        config_path: &str,
        format: Option<SchemaFormat>,
        server_key: Option<String>,
    ) -> anyhow::Result<CustomTool> {
        let format = match format {
            Some(format) => format,
            None => self.detect_format(config_path),
        };
        let tool = CustomTool::new(id, name, config_path, format, server_key);
        preferences.add_custom_tool(tool.clone())?;
        tracing::info!("Registered custom tool '{}' ({:?})", id, format);
        Ok(tool)
    }

    fn detect_format(&self, config_path: &str) -> SchemaFormat {
        let resolved = self.resolver().resolve(config_path);
        JsonSerializer
            .load(self.fs.as_ref(), &resolved)
            .ok()
            .and_then(|document| detect_config_format(&document))
            .unwrap_or(SchemaFormat::McpServers)
    }
}
