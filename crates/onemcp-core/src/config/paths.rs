//! Tool config path resolution helpers.
//!
//! Paths handled here are strings in the engine's canonical form: placeholders
//! expanded and every separator normalized to `/`. Nothing in this module
//! touches the disk.

use serde::{Deserialize, Serialize};

use crate::types::Platform;

/// Per-OS path templates for one tool. Absent entries mean the tool does not
/// exist on that platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win32: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub darwin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux: Option<String>,
}

impl PlatformPaths {
    /// Same template on every platform.
    pub fn everywhere(template: impl Into<String>) -> Self {
        let template = template.into();
        Self {
            win32: Some(template.clone()),
            darwin: Some(template.clone()),
            linux: Some(template),
        }
    }

    pub fn for_platform(&self, platform: Platform) -> Option<&str> {
        match platform {
            Platform::Windows => self.win32.as_deref(),
            Platform::MacOs => self.darwin.as_deref(),
            Platform::Linux => self.linux.as_deref(),
        }
    }
}

/// Expands path templates for a fixed platform and home directory.
///
/// Platform and home are captured once per session; build a new resolver if
/// either changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    platform: Platform,
    home: String,
}

impl PathResolver {
    pub fn new(platform: Platform, home: impl AsRef<str>) -> Self {
        Self {
            platform,
            home: normalize_path(home.as_ref()),
        }
    }

    /// Resolver for the running process.
    pub fn from_env() -> anyhow::Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(Self::new(Platform::current(), home.to_string_lossy()))
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    /// Expand a template written for this resolver's platform.
    pub fn resolve(&self, template: &str) -> String {
        resolve(template, self.platform, &self.home)
    }

    /// Pick this platform's template and expand it. `None` means the tool is
    /// not applicable here.
    pub fn resolve_for_platform(&self, paths: &PlatformPaths) -> Option<String> {
        paths
            .for_platform(self.platform)
            .filter(|template| !template.trim().is_empty())
            .map(|template| self.resolve(template))
    }
}

/// Expand `~` and, on Windows, the `%APPDATA%`, `%LOCALAPPDATA%` and
/// `%USERPROFILE%` tokens (case-insensitive), then normalize separators.
pub fn resolve(template: &str, platform: Platform, home: &str) -> String {
    let mut resolved = match template.strip_prefix('~') {
        Some(rest) => format!("{home}{rest}"),
        None => template.to_string(),
    };

    if platform == Platform::Windows {
        let app_data = format!("{home}/AppData/Roaming");
        let local_app_data = format!("{home}/AppData/Local");
        resolved = replace_token(&resolved, "%APPDATA%", &app_data);
        resolved = replace_token(&resolved, "%LOCALAPPDATA%", &local_app_data);
        resolved = replace_token(&resolved, "%USERPROFILE%", home);
    }

    normalize_path(&resolved)
}

pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Join path segments with a single `/`, trimming slashes at the seams.
pub fn join_paths(parts: &[&str]) -> String {
    parts
        .iter()
        .enumerate()
        .map(|(idx, part)| {
            if idx == 0 {
                part.trim_end_matches('/')
            } else {
                part.trim_start_matches('/').trim_end_matches('/')
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn dirname(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => ".".to_string(),
    }
}

pub fn basename(path: &str) -> String {
    let normalized = normalize_path(path);
    match normalized.rfind('/') {
        Some(idx) => normalized[idx + 1..].to_string(),
        None => normalized,
    }
}

/// ASCII case-insensitive replacement of every occurrence of `token`.
fn replace_token(haystack: &str, token: &str, replacement: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with the original string.
    let lower = haystack.to_ascii_lowercase();
    let needle = token.to_ascii_lowercase();

    let mut out = String::with_capacity(haystack.len());
    let mut cursor = 0;
    while let Some(found) = lower[cursor..].find(&needle) {
        let start = cursor + found;
        out.push_str(&haystack[cursor..start]);
        out.push_str(replacement);
        cursor = start + needle.len();
    }
    out.push_str(&haystack[cursor..]);
    out
}
