// ── Directory persistence ──
//
// The engine only needs to load the directory at start and save it
// after add/remove. Storage lives behind this trait so the core crate
// never touches the filesystem.

use std::sync::Mutex;

use crate::error::CoreError;
use crate::model::DeviceAddress;

/// Load/save capability for the ordered device directory.
pub trait DirectoryPersistence: Send + Sync {
    fn load(&self) -> Result<Vec<DeviceAddress>, CoreError>;

    fn save(&self, directory: &[DeviceAddress]) -> Result<(), CoreError>;
}

/// In-memory persistence, for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    addresses: Mutex<Vec<DeviceAddress>>,
}

impl MemoryDirectory {
    pub fn new(addresses: Vec<DeviceAddress>) -> Self {
        Self {
            addresses: Mutex::new(addresses),
        }
    }

    /// What was last saved (or seeded).
    pub fn saved(&self) -> Vec<DeviceAddress> {
        self.addresses
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl DirectoryPersistence for MemoryDirectory {
    fn load(&self) -> Result<Vec<DeviceAddress>, CoreError> {
        self.addresses
            .lock()
            .map(|guard| guard.clone())
            .map_err(|e| CoreError::Persistence {
                message: e.to_string(),
            })
    }

    fn save(&self, directory: &[DeviceAddress]) -> Result<(), CoreError> {
        let mut guard = self.addresses.lock().map_err(|e| CoreError::Persistence {
            message: e.to_string(),
        })?;
        *guard = directory.to_vec();
        Ok(())
    }
}
