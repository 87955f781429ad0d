// ── Central reactive data store ──
//
// The device directory and the reconciled record for each address.
// Mutations are broadcast to subscribers via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::error::CoreError;
use crate::model::{DeviceAddress, DeviceRecord};
use crate::stream::RecordStream;

/// Reactive store for the device directory and its records.
///
/// The directory is the key order of the record collection: an address
/// is in the directory exactly when it has a record. Records are
/// created on add, replaced by the reconciler, and destroyed on remove.
pub struct DataStore {
    pub(crate) records: EntityCollection<DeviceRecord>,
    pub(crate) last_merge: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (last_merge, _) = watch::channel(None);

        Self {
            records: EntityCollection::new(),
            last_merge,
        }
    }

    // ── Directory ────────────────────────────────────────────────────

    /// Append `address` with an empty record.
    pub(crate) fn add_device(&self, address: DeviceAddress) -> Result<Arc<DeviceRecord>, CoreError> {
        let record = DeviceRecord::new(address.clone());
        if !self.records.insert_new(address.clone(), record) {
            return Err(CoreError::DuplicateAddress {
                address: address.to_string(),
            });
        }
        self.records
            .get(&address)
            .ok_or_else(|| CoreError::Internal(format!("record for {address} vanished on insert")))
    }

    /// Remove `address` and its record.
    pub(crate) fn remove_device(&self, address: &DeviceAddress) -> Option<Arc<DeviceRecord>> {
        self.records.remove(address)
    }

    /// Add every address not already present, keeping the given order.
    /// Returns how many were added.
    pub(crate) fn load_directory(&self, addresses: impl IntoIterator<Item = DeviceAddress>) -> usize {
        addresses
            .into_iter()
            .filter(|addr| self.records.insert_new(addr.clone(), DeviceRecord::new(addr.clone())))
            .count()
    }

    /// Directory addresses in insertion order.
    pub fn directory(&self) -> Arc<Vec<DeviceAddress>> {
        self.records.keys()
    }

    pub fn subscribe_directory(&self) -> watch::Receiver<Arc<Vec<DeviceAddress>>> {
        self.records.subscribe_keys()
    }

    pub fn contains(&self, address: &DeviceAddress) -> bool {
        self.records.contains(address)
    }

    pub fn device_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ── Records ──────────────────────────────────────────────────────

    pub fn record(&self, address: &DeviceAddress) -> Option<Arc<DeviceRecord>> {
        self.records.get(address)
    }

    /// All records, in directory order.
    pub fn records_snapshot(&self) -> Arc<Vec<Arc<DeviceRecord>>> {
        self.records.snapshot()
    }

    pub fn subscribe_records(&self) -> RecordStream {
        RecordStream::new(self.records.subscribe())
    }

    /// Monotonic counter bumped on every directory or record change.
    pub fn version(&self) -> u64 {
        self.records.version()
    }

    // ── Metadata ─────────────────────────────────────────────────────

    pub fn last_merge(&self) -> Option<DateTime<Utc>> {
        *self.last_merge.borrow()
    }

    pub(crate) fn mark_merged(&self, at: DateTime<Utc>) {
        self.last_merge.send_replace(Some(at));
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
