//! Reconciliation between the canonical server list and tool config files.
//!
//! The engine holds no server state of its own. Callers own an [`AppState`]
//! and pass it into every operation.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::Utc;
use serde::Serialize;

use crate::backup::BackupManager;
use crate::config::{
    JsonSerializer, build_full_config, servers_to_tool_config, tool_config_to_servers,
    undecodable_entries,
};
use crate::error::{Error, Result};
use crate::fs::HostFs;
use crate::mcp::{ServerRecord, ServerUpdate, generate_server_id, validate_server};
use crate::tool::ToolDescriptor;

use super::merge::{MergeConflict, merge_servers};
use super::report::{OperationReport, ToolWriteOutcome, WriteStatus};

/// Canonical server list plus the resolved tools it is reconciled against.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub servers: Vec<ServerRecord>,
    pub tools: Vec<ToolDescriptor>,
}

impl AppState {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            servers: Vec::new(),
            tools,
        }
    }

    pub fn server(&self, id: &str) -> Option<&ServerRecord> {
        self.servers.iter().find(|s| s.id == id)
    }

    pub fn server_by_name(&self, name: &str) -> Option<&ServerRecord> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn tool(&self, id: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.id == id)
    }

    /// Like [`AppState::tool`], but an unknown id is an error.
    pub fn require_tool(&self, id: &str) -> Result<&ToolDescriptor> {
        self.tool(id)
            .ok_or_else(|| Error::UnknownTool(id.to_string()))
    }

    pub fn installed_tools(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter().filter(|t| t.is_installed)
    }

    /// Tool ids a record should be written into. An unset enabled list
    /// means every installed tool.
    fn target_tool_ids(&self, server: &ServerRecord) -> Vec<String> {
        match &server.enabled_tools {
            Some(ids) => ids.clone(),
            None => self.installed_tools().map(|t| t.id.clone()).collect(),
        }
    }

    fn mark_installed(&mut self, report: &OperationReport) {
        for outcome in &report.outcomes {
            if outcome.status == WriteStatus::Written
                && let Some(tool) = self.tools.iter_mut().find(|t| t.id == outcome.tool_id)
            {
                tool.is_installed = true;
            }
        }
    }
}

/// A tool whose config could not be read during `load_all`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolLoadFailure {
    pub tool_id: String,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub conflicts: Vec<MergeConflict>,
    pub failures: Vec<ToolLoadFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Write even if the file does not exist yet.
    Upsert,
    /// Only rewrite files that already exist.
    Prune,
}

/// Reads and writes tool config files on behalf of the canonical list.
///
/// Mutating operations are serialized; loads may run concurrently with each
/// other but never with a mutation.
#[derive(Debug)]
pub struct Reconciler {
    fs: Arc<dyn HostFs>,
    backups: BackupManager,
    backup_enabled: bool,
    serializer: JsonSerializer,
    lock: RwLock<()>,
}

impl Reconciler {
    pub fn new(fs: Arc<dyn HostFs>, backups: BackupManager) -> Self {
        Self {
            fs,
            backups,
            backup_enabled: true,
            serializer: JsonSerializer,
            lock: RwLock::new(()),
        }
    }

    pub fn with_backups_enabled(mut self, enabled: bool) -> Self {
        self.backup_enabled = enabled;
        self
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Decode the servers currently stored in one tool's file.
    pub fn load_tool_servers(&self, tool: &ToolDescriptor) -> Result<Vec<ServerRecord>> {
        tracing::debug!("Reading {} config from {}", tool.id, tool.config_path);
        let document = self.serializer.load(self.fs.as_ref(), &tool.config_path)?;
        Ok(tool_config_to_servers(&document, tool))
    }

    /// Rebuild `state.servers` from every installed tool, in tool order.
    pub fn load_all(&self, state: &mut AppState) -> LoadReport {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);

        let mut servers = Vec::new();
        let mut report = LoadReport::default();
        for tool in state.installed_tools() {
            match self.load_tool_servers(tool) {
                Ok(decoded) => report.conflicts.extend(merge_servers(&mut servers, decoded)),
                Err(err) => {
                    tracing::warn!("Skipping {}: {}", tool.id, err);
                    report.failures.push(ToolLoadFailure {
                        tool_id: tool.id.clone(),
                        path: tool.config_path.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        tracing::debug!("Loaded {} server(s)", servers.len());
        state.servers = servers;
        report
    }

    /// Add a new server and write it into every tool it is enabled for.
    pub fn create(&self, state: &mut AppState, mut server: ServerRecord) -> Result<OperationReport> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);

        validate_server(&server)?;
        if state.server_by_name(&server.name).is_some() {
            return Err(Error::DuplicateName(server.name));
        }

        let now = Utc::now();
        server.id = generate_server_id();
        server.created_at = Some(now);
        server.updated_at = Some(now);

        let targets = state.target_tool_ids(&server);
        let mut report = OperationReport::for_server(&server.id);
        let name = server.name.clone();
        state.servers.push(server);

        for tool_id in &targets {
            let outcome = self.write_target(state, tool_id, None, WriteMode::Upsert);
            report.push(outcome);
        }
        state.mark_installed(&report);
        if !report.outcomes.iter().any(|o| o.status == WriteStatus::Written) {
            report.warn(format!(
                "Server '{name}' was not written to any tool config and will not persist"
            ));
        }

        tracing::info!("Created server: {}", report.summary());
        Ok(report)
    }

    /// Apply `update` to the server with `id`.
    ///
    /// Tools dropped from the enabled set are rewritten without the server
    /// before the canonical list changes; every tool still enabled is then
    /// rewritten with the updated record.
    pub fn edit(
        &self,
        state: &mut AppState,
        id: &str,
        update: &ServerUpdate,
    ) -> Result<OperationReport> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);

        let index = state
            .servers
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let original = &state.servers[index];
        let updated = update.apply(original);

        validate_server(&updated)?;
        if state
            .servers
            .iter()
            .any(|s| s.id != id && s.name == updated.name)
        {
            return Err(Error::DuplicateName(updated.name));
        }

        let old_targets = state.target_tool_ids(original);
        let new_targets = state.target_tool_ids(&updated);
        let kept: HashSet<&String> = new_targets.iter().collect();

        let mut report = OperationReport::for_server(id);
        for tool_id in old_targets.iter().filter(|t| !kept.contains(t)) {
            let outcome = self.write_target(state, tool_id, Some(id), WriteMode::Prune);
            report.push(outcome);
        }

        state.servers[index] = updated;

        for tool_id in &new_targets {
            let outcome = self.write_target(state, tool_id, None, WriteMode::Upsert);
            report.push(outcome);
        }
        state.mark_installed(&report);

        tracing::info!("Updated server: {}", report.summary());
        Ok(report)
    }

    /// Remove the server with `id` from every tool enabling it, then from the
    /// canonical list.
    pub fn delete(&self, state: &mut AppState, id: &str) -> Result<OperationReport> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);

        let index = state
            .servers
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let targets = state.target_tool_ids(&state.servers[index]);

        let mut report = OperationReport::for_server(id);
        for tool_id in &targets {
            let outcome = self.write_target(state, tool_id, Some(id), WriteMode::Prune);
            report.push(outcome);
        }

        state.servers.remove(index);
        tracing::info!("Deleted server: {}", report.summary());
        Ok(report)
    }

    /// Overwrite every installed tool's server section from the canonical
    /// list. Failures are collected per tool.
    pub fn sync_all(&self, state: &AppState) -> OperationReport {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);

        let mut report = OperationReport::new();
        for tool in state.installed_tools() {
            let outcome = self.write_tool(tool, &state.servers, None, WriteMode::Upsert);
            report.push(outcome);
        }

        tracing::info!("Sync finished: {}", report.summary());
        report
    }

    /// Restore a tool's config file from one of its snapshots. The current
    /// file is snapshotted first when backups are enabled.
    pub fn restore_backup(&self, tool: &ToolDescriptor, snapshot: &str) -> Result<OperationReport> {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);

        let bytes = self.backups.read_snapshot(snapshot)?;
        let mut report = OperationReport::new();

        let backup = match self.take_backup(&tool.config_path) {
            Ok(backup) => backup,
            Err(err) => {
                report.push(ToolWriteOutcome::failed(
                    &tool.id,
                    &tool.config_path,
                    format!("Backup failed: {err}"),
                    None,
                ));
                return Ok(report);
            }
        };

        let outcome = match self.fs.write(&tool.config_path, &bytes) {
            Ok(()) => {
                tracing::info!("Restored {} from {}", tool.config_path, snapshot);
                ToolWriteOutcome {
                    message: format!("Restored from {snapshot}"),
                    ..ToolWriteOutcome::written(&tool.id, &tool.config_path, backup, 0)
                }
            }
            Err(err) => {
                ToolWriteOutcome::failed(&tool.id, &tool.config_path, err.to_string(), backup)
            }
        };
        report.push(outcome);
        Ok(report)
    }

    /// Write the canonical list, minus `exclude`, into the tool `tool_id`.
    fn write_target(
        &self,
        state: &AppState,
        tool_id: &str,
        exclude: Option<&str>,
        mode: WriteMode,
    ) -> ToolWriteOutcome {
        match state.tool(tool_id) {
            Some(tool) => self.write_tool(tool, &state.servers, exclude, mode),
            None => {
                tracing::warn!("Tool '{}' is not available; skipping", tool_id);
                ToolWriteOutcome::skipped(tool_id, "", "Tool is not available on this system")
            }
        }
    }

    /// backup → read → encode → rebuild → write for one tool.
    fn write_tool(
        &self,
        tool: &ToolDescriptor,
        servers: &[ServerRecord],
        exclude: Option<&str>,
        mode: WriteMode,
    ) -> ToolWriteOutcome {
        let path = tool.config_path.as_str();
        if mode == WriteMode::Prune && !self.fs.exists(path) {
            return ToolWriteOutcome::skipped(&tool.id, path, "Config file does not exist");
        }

        let backup = match self.take_backup(path) {
            Ok(backup) => backup,
            Err(err) => {
                tracing::warn!("Not writing {}: backup failed: {}", path, err);
                return ToolWriteOutcome::failed(
                    &tool.id,
                    path,
                    format!("Backup failed: {err}"),
                    None,
                );
            }
        };

        let existing = match self.serializer.load(self.fs.as_ref(), path) {
            Ok(existing) => existing,
            Err(err) => {
                tracing::warn!("Not writing {}: {}", path, err);
                return ToolWriteOutcome::failed(&tool.id, path, err.to_string(), backup);
            }
        };

        let selected = servers
            .iter()
            .filter(|s| exclude.is_none_or(|excluded| s.id != excluded));
        let mut server_map = servers_to_tool_config(selected, tool);
        let count = server_map.len();
        for (name, raw) in undecodable_entries(&existing, tool) {
            if !server_map.contains_key(&name) {
                tracing::debug!("Keeping unreadable entry '{}' in {}", name, path);
                server_map.insert(name, raw);
            }
        }
        let document = build_full_config(&existing, server_map, tool);

        match self.serializer.save(self.fs.as_ref(), path, &document) {
            Ok(()) => {
                tracing::info!("Wrote {} server(s) to {}", count, path);
                ToolWriteOutcome::written(&tool.id, path, backup, count)
            }
            Err(err) => {
                tracing::warn!("Failed to write {}: {}", path, err);
                ToolWriteOutcome::failed(&tool.id, path, err.to_string(), backup)
            }
        }
    }

    fn take_backup(&self, path: &str) -> Result<Option<String>> {
        if !self.backup_enabled {
            return Ok(None);
        }
        self.backups.backup(path)
    }
}
