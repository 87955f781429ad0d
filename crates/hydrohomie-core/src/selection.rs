// ── Selection tracker ──
//
// Holds the address of the device being viewed, never a copy of its
// record. Every read resolves the address against the store, so the
// selection always reflects the latest merge.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{DeviceAddress, DeviceRecord};
use crate::store::DataStore;

pub struct SelectionTracker {
    store: Arc<DataStore>,
    selected: watch::Sender<Option<DeviceAddress>>,
}

impl SelectionTracker {
    pub fn new(store: Arc<DataStore>) -> Self {
        let (selected, _) = watch::channel(None);
        Self { store, selected }
    }

    /// Select `address`. Rejected if it is not in the directory.
    pub fn select(&self, address: &DeviceAddress) -> Result<Arc<DeviceRecord>, CoreError> {
        let record = self
            .store
            .record(address)
            .ok_or_else(|| CoreError::DeviceNotFound {
                address: address.to_string(),
            })?;
        self.selected.send_if_modified(|cur| {
            if cur.as_ref() == Some(address) {
                return false;
            }
            *cur = Some(address.clone());
            true
        });
        debug!(%address, "selected device");
        Ok(record)
    }

    pub fn clear(&self) {
        self.selected.send_if_modified(|cur| cur.take().is_some());
    }

    /// Drop the selection if it points at `address`.
    pub(crate) fn forget(&self, address: &DeviceAddress) {
        self.selected.send_if_modified(|cur| {
            if cur.as_ref() == Some(address) {
                *cur = None;
                true
            } else {
                false
            }
        });
    }

    pub fn selected_address(&self) -> Option<DeviceAddress> {
        self.selected.borrow().clone()
    }

    /// The latest record for the selected address.
    ///
    /// If the address has left the directory the selection is cleared
    /// and `None` returned.
    pub fn current(&self) -> Option<Arc<DeviceRecord>> {
        let address = self.selected_address()?;
        let record = self.store.record(&address);
        if record.is_none() {
            self.forget(&address);
        }
        record
    }

    pub fn subscribe(&self) -> SelectionStream {
        SelectionStream {
            store: Arc::clone(&self.store),
            selected: self.selected.subscribe(),
            records: self.store.records.subscribe(),
        }
    }
}

/// Notifies on selection changes and on every merge, yielding the
/// resolved record each time.
pub struct SelectionStream {
    store: Arc<DataStore>,
    selected: watch::Receiver<Option<DeviceAddress>>,
    records: watch::Receiver<Arc<Vec<Arc<DeviceRecord>>>>,
}

impl SelectionStream {
    /// Resolve the current selection without waiting.
    pub fn current(&self) -> Option<Arc<DeviceRecord>> {
        let address = self.selected.borrow().clone()?;
        self.store.record(&address)
    }

    /// Wait for the selection or any record to change, then resolve.
    ///
    /// The outer `None` means the tracker or store has been dropped.
    pub async fn changed(&mut self) -> Option<Option<Arc<DeviceRecord>>> {
        tokio::select! {
            res = self.selected.changed() => res.ok()?,
            res = self.records.changed() => res.ok()?,
        }
        Some(self.current())
    }
}
