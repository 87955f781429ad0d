// ── Device directory file ──
//
// The directory is stored as a JSON array of address strings, in the
// order the operator added them.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use hydrohomie_core::{CoreError, DeviceAddress, DirectoryPersistence};

use crate::ConfigError;

/// Directory persistence backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileDirectory {
    path: PathBuf,
}

impl JsonFileDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file. A missing file is an empty directory; entries
    /// that are not valid addresses, or repeat an earlier one, are
    /// skipped.
    pub fn read(&self) -> Result<Vec<DeviceAddress>, ConfigError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<String> = serde_json::from_str(&raw)?;
        let mut addresses: Vec<DeviceAddress> = Vec::with_capacity(entries.len());
        for entry in entries {
            match DeviceAddress::parse(&entry) {
                Ok(addr) if !addresses.contains(&addr) => addresses.push(addr),
                Ok(addr) => debug!(%addr, "skipping repeated directory entry"),
                Err(e) => warn!(entry = %entry, error = %e, "skipping invalid directory entry"),
            }
        }
        Ok(addresses)
    }

    /// Write the file via a sibling temp file and rename, so a crash
    /// mid-write leaves the previous directory intact.
    pub fn write(&self, directory: &[DeviceAddress]) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let entries: Vec<&str> = directory.iter().map(DeviceAddress::as_str).collect();
        let json = serde_json::to_string_pretty(&entries)?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl DirectoryPersistence for JsonFileDirectory {
    fn load(&self) -> Result<Vec<DeviceAddress>, CoreError> {
        self.read().map_err(|e| CoreError::Persistence {
            message: format!("{}: {e}", self.path.display()),
        })
    }

    fn save(&self, directory: &[DeviceAddress]) -> Result<(), CoreError> {
        self.write(directory).map_err(|e| CoreError::Persistence {
            message: format!("{}: {e}", self.path.display()),
        })
    }
}
