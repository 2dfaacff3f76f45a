//! JSON document I/O for tool config files.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::fs::{HostFs, native_path};

/// Reads and writes a tool's raw JSON document through a [`HostFs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl JsonSerializer {
    /// Load the document at `path`. A missing file is an empty document.
    pub fn load(&self, fs: &dyn HostFs, path: &str) -> Result<Map<String, Value>> {
        match fs.read(path)? {
            Some(bytes) => self.parse(path, &bytes),
            None => Ok(Map::new()),
        }
    }

    /// Parse raw bytes. Whitespace-only content counts as an empty document.
    pub fn parse(&self, path: &str, bytes: &[u8]) -> Result<Map<String, Value>> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }
        let value: Value = serde_json::from_slice(bytes).map_err(|source| Error::MalformedJson {
            path: native_path(path),
            source,
        })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(Error::NotAnObject(native_path(path))),
        }
    }

    /// Pretty-print with two-space indentation.
    pub fn render(&self, path: &str, map: &Map<String, Value>) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(map).map_err(|source| Error::MalformedJson {
            path: native_path(path),
            source,
        })
    }

    pub fn save(&self, fs: &dyn HostFs, path: &str, map: &Map<String, Value>) -> Result<()> {
        let bytes = self.render(path, map)?;
        fs.write(path, &bytes)
    }
}
