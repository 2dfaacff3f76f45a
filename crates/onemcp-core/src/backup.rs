//! Timestamped snapshots of tool config files.
//!
//! A snapshot of `/dir/config.json` is `/dir/config.json.backup.<stamp>`
//! where `<stamp>` is an RFC 3339 UTC time with millisecond precision and
//! `:`/`.` replaced by `-` (e.g. `2026-01-02T03-04-05-678Z`). Snapshots taken
//! within the same millisecond get a `-NNN` counter. Lexicographic order of
//! the names is chronological order.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::paths::{basename, dirname, join_paths};
use crate::error::{Error, Result};
use crate::fs::{HostFs, native_path};
use crate::tool::ToolDescriptor;

/// Snapshots kept per config file unless configured otherwise.
pub const DEFAULT_MAX_BACKUPS: usize = 10;

const BACKUP_MARKER: &str = ".backup.";
const STAMP_LEN: usize = "2026-01-02T03-04-05-678Z".len();

/// One snapshot on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    pub tool_id: String,
    pub created_at: DateTime<Utc>,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    fs: Arc<dyn HostFs>,
    max_backups: usize,
}

impl BackupManager {
    pub fn new(fs: Arc<dyn HostFs>, max_backups: usize) -> Self {
        Self {
            fs,
            max_backups: max_backups.max(1),
        }
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Snapshot `path` and apply retention. Returns `None` if the file does
    /// not exist.
    pub fn backup(&self, path: &str) -> Result<Option<String>> {
        if !self.fs.exists(path) {
            return Ok(None);
        }

        let stamp = backup_timestamp(Utc::now());
        let base = format!("{path}{BACKUP_MARKER}{stamp}");
        let snapshot = match self.last_counter(path, &stamp)? {
            Some(counter) => format!("{base}-{:03}", counter + 1),
            None => base,
        };

        self.fs.copy(path, &snapshot)?;
        tracing::info!("Backed up {} to {}", path, snapshot);

        self.prune(path)?;
        Ok(Some(snapshot))
    }

    /// Highest collision counter among existing snapshots of `path` taken at
    /// `stamp`; the uncounted name counts as 0. `None` if there are none.
    ///
    /// Counting from the highest survivor keeps names increasing even after
    /// retention has removed the earliest ones.
    fn last_counter(&self, path: &str, stamp: &str) -> Result<Option<u32>> {
        let base = format!("{}{BACKUP_MARKER}{stamp}", basename(path));
        let counter = self
            .fs
            .list_dir(&dirname(path))?
            .iter()
            .filter_map(|name| {
                let rest = name.strip_prefix(&base)?;
                if rest.is_empty() {
                    return Some(0);
                }
                rest.strip_prefix('-')?.parse::<u32>().ok()
            })
            .max();
        Ok(counter)
    }

    /// Delete snapshots of `path` beyond the retention cap. Returns the
    /// removed snapshot paths.
    pub fn prune(&self, path: &str) -> Result<Vec<String>> {
        let snapshots = self.list_backups(path)?;
        let mut removed = Vec::new();
        for stale in snapshots.into_iter().skip(self.max_backups) {
            match self.fs.remove(&stale) {
                Ok(()) => {
                    tracing::debug!("Removed old backup {}", stale);
                    removed.push(stale);
                }
                Err(err) => tracing::warn!("Failed to delete old backup {}: {}", stale, err),
            }
        }
        Ok(removed)
    }

    /// All snapshots of `path`, newest first. A missing directory yields an
    /// empty list.
    pub fn list_backups(&self, path: &str) -> Result<Vec<String>> {
        let dir = dirname(path);
        let prefix = format!("{}{BACKUP_MARKER}", basename(path));

        let mut names: Vec<String> = self
            .fs
            .list_dir(&dir)?
            .into_iter()
            .filter(|name| {
                name.strip_prefix(&prefix)
                    .is_some_and(|stamp| parse_backup_timestamp(stamp).is_some())
            })
            .collect();
        names.sort_unstable_by(|a, b| b.cmp(a));

        Ok(names
            .into_iter()
            .map(|name| join_paths(&[&dir, &name]))
            .collect())
    }

    /// Snapshots of a tool's config file with their creation times.
    pub fn list_backup_records(&self, tool: &ToolDescriptor) -> Result<Vec<BackupRecord>> {
        let prefix = format!("{}{BACKUP_MARKER}", basename(&tool.config_path));
        let records = self
            .list_backups(&tool.config_path)?
            .into_iter()
            .filter_map(|path| {
                let stamp = basename(&path).strip_prefix(&prefix)?.to_string();
                Some(BackupRecord {
                    tool_id: tool.id.clone(),
                    created_at: parse_backup_timestamp(&stamp)?,
                    path,
                })
            })
            .collect();
        Ok(records)
    }

    /// Bytes of a snapshot. Fails with `BackupMissing` if it is gone.
    pub fn read_snapshot(&self, snapshot: &str) -> Result<Vec<u8>> {
        self.fs
            .read(snapshot)?
            .ok_or_else(|| Error::BackupMissing(native_path(snapshot)))
    }

    /// Overwrite `target` with the snapshot's bytes.
    pub fn restore(&self, snapshot: &str, target: &str) -> Result<()> {
        let bytes = self.read_snapshot(snapshot)?;
        self.fs.write(target, &bytes)?;
        tracing::info!("Restored {} from {}", target, snapshot);
        Ok(())
    }
}

/// Filename-safe, sortable timestamp.
pub fn backup_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Inverse of [`backup_timestamp`]. A trailing `-NNN` counter is ignored.
pub fn parse_backup_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    let core = stamp.get(..STAMP_LEN)?;
    let counter = &stamp[STAMP_LEN..];
    if !counter.is_empty()
        && !(counter.len() > 1
            && counter.starts_with('-')
            && counter[1..].bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    // 2026-01-02T03-04-05-678Z -> 2026-01-02T03:04:05.678Z
    let mut rfc3339: Vec<u8> = core.bytes().collect();
    for (idx, replacement) in [(13, b':'), (16, b':'), (19, b'.')] {
        if rfc3339[idx] != b'-' {
            return None;
        }
        rfc3339[idx] = replacement;
    }
    let rfc3339 = String::from_utf8(rfc3339).ok()?;
    DateTime::parse_from_rfc3339(&rfc3339)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
