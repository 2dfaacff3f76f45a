//! Preferences store for loading and saving onemcp.toml.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{Preferences, parser};

/// File name of the preferences file inside the config directory.
pub const PREFERENCES_FILE: &str = "onemcp.toml";

#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    /// Store at `<config dir>/onemcp/onemcp.toml`.
    pub fn from_default_location() -> anyhow::Result<Self> {
        Ok(Self::from_path(default_preferences_path()?))
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load preferences. A missing file yields defaults.
    pub fn load(&self) -> anyhow::Result<Preferences> {
        if !self.path.exists() {
            tracing::debug!("No preferences at {}, using defaults", self.path.display());
            return Ok(Preferences::new());
        }
        parser::parse_preferences_toml(&self.path)
    }

    pub fn save(&self, preferences: &Preferences) -> anyhow::Result<()> {
        preferences.validate()?;
        let content = parser::to_toml(preferences)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.path, content).with_context(|| {
            format!("Failed to write preferences file: {}", self.path.display())
        })?;
        tracing::debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}

pub fn default_preferences_path() -> anyhow::Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("onemcp");
    Ok(dir.join(PREFERENCES_FILE))
}
