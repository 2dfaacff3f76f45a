#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use onemcp_core::backup::BackupManager;
use onemcp_core::fs::{LocalFs, canonical_string};
use onemcp_core::reconcile::{AppState, Reconciler};
use onemcp_core::tool::{SchemaFormat, ToolDescriptor};
use serde_json::Value;
use tempfile::TempDir;

/// A temporary home directory holding real tool config files.
pub struct Fixture {
    pub temp: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("home")).unwrap();
        Self { temp }
    }

    pub fn home(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.home().join(relative)
    }

    /// Canonical string form of a path under home.
    pub fn canonical(&self, relative: &str) -> String {
        canonical_string(&self.path(relative))
    }

    pub fn write_json(&self, relative: &str, value: &Value) {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    }

    pub fn write_raw(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
    }

    pub fn read_json(&self, relative: &str) -> Value {
        let bytes = std::fs::read(self.path(relative)).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    /// Descriptor for a tool whose config lives at `relative`. Installed iff
    /// the file exists now.
    pub fn tool(&self, id: &str, relative: &str, format: SchemaFormat) -> ToolDescriptor {
        let mut tool = ToolDescriptor::new(id, self.canonical(relative), format);
        tool.is_installed = self.exists(relative);
        tool
    }

    pub fn reconciler(&self, backups: bool) -> Reconciler {
        let fs = Arc::new(LocalFs::new());
        Reconciler::new(fs.clone(), BackupManager::new(fs, 10)).with_backups_enabled(backups)
    }

    pub fn backup_manager(&self, max_backups: usize) -> BackupManager {
        BackupManager::new(Arc::new(LocalFs::new()), max_backups)
    }

    /// File names in the directory of `relative`.
    pub fn sibling_names(&self, relative: &str) -> Vec<String> {
        let dir = self.path(relative).parent().unwrap().to_path_buf();
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

pub fn state_with(tools: Vec<ToolDescriptor>) -> AppState {
    AppState::new(tools)
}
