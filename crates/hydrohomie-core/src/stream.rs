// ── Record subscriptions ──
//
// Watch-backed views of the record snapshot for consumers that redraw
// when the reconciler publishes.

use std::sync::Arc;

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::{DeviceAddress, DeviceRecord};

/// Every record, in directory order.
pub type Snapshot = Arc<Vec<Arc<DeviceRecord>>>;

/// A subscription to the reconciled records.
///
/// `current()` is the snapshot this subscriber last observed;
/// `latest()` peeks at whatever is published now without marking it seen.
pub struct RecordStream {
    seen: Snapshot,
    rx: watch::Receiver<Snapshot>,
}

impl RecordStream {
    pub(crate) fn new(rx: watch::Receiver<Snapshot>) -> Self {
        let seen = rx.borrow().clone();
        Self { seen, rx }
    }

    pub fn current(&self) -> &Snapshot {
        &self.seen
    }

    pub fn latest(&self) -> Snapshot {
        self.rx.borrow().clone()
    }

    /// The latest record for `address`, if it is still in the directory.
    pub fn get(&self, address: &DeviceAddress) -> Option<Arc<DeviceRecord>> {
        find(&self.rx.borrow(), address)
    }

    /// Wait for the next publish. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.rx.changed().await.ok()?;
        self.seen = self.rx.borrow_and_update().clone();
        Some(Arc::clone(&self.seen))
    }

    /// Wait until the record for `address` differs from the one last
    /// seen, skipping publishes that only touched other devices.
    ///
    /// Resolves to `Some(None)` when the address leaves the directory.
    pub async fn changed_for(
        &mut self,
        address: &DeviceAddress,
    ) -> Option<Option<Arc<DeviceRecord>>> {
        let before = find(&self.seen, address);
        loop {
            let snap = self.changed().await?;
            let after = find(&snap, address);
            if after != before {
                return Some(after);
            }
        }
    }

    /// Adapt into a `Stream` that yields the current snapshot first.
    pub fn into_stream(self) -> impl Stream<Item = Snapshot> + Unpin {
        WatchStream::new(self.rx)
    }
}

fn find(snapshot: &[Arc<DeviceRecord>], address: &DeviceAddress) -> Option<Arc<DeviceRecord>> {
    snapshot.iter().find(|r| &r.address == address).cloned()
}
