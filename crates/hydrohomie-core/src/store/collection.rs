// ── Ordered reactive collection ──
//
// Concurrent keyed storage with O(1) lookups, a stable key order, and
// push-based change notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;

use crate::model::DeviceAddress;

/// A reactive collection keyed by device address.
///
/// `by_key` holds the entities; `order` holds the keys in insertion
/// order and is itself observable. The snapshot subscribers receive is
/// always in `order`. Every mutation bumps a version counter.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    /// Primary storage: address -> entity.
    by_key: DashMap<DeviceAddress, Arc<T>>,

    /// Keys in insertion order.
    order: watch::Sender<Arc<Vec<DeviceAddress>>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot in key order, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (order, _) = watch::channel(Arc::new(Vec::new()));
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_key: DashMap::new(),
            order,
            version,
            snapshot,
        }
    }

    /// Insert a new entity at the end of the order. Returns `false`
    /// (and leaves the collection untouched) if the key already exists.
    pub(crate) fn insert_new(&self, key: DeviceAddress, entity: T) -> bool {
        match self.by_key.entry(key.clone()) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(entity));
            }
        }
        self.order.send_modify(|keys| {
            let mut next = Vec::with_capacity(keys.len() + 1);
            next.extend(keys.iter().cloned());
            next.push(key);
            *keys = Arc::new(next);
        });

        self.rebuild_snapshot();
        self.bump_version();
        true
    }

    /// Replace an existing entity with the result of `f`.
    ///
    /// `f` runs while the entry is locked, so concurrent updates to the
    /// same key are serialized. Absent keys are never created; `f`
    /// returning `None` leaves the entity as is. Returns the new value.
    pub(crate) fn update<F>(&self, key: &DeviceAddress, f: F) -> Option<Arc<T>>
    where
        F: FnOnce(&T) -> Option<T>,
    {
        let updated = {
            let mut entry = self.by_key.get_mut(key)?;
            let next = Arc::new(f(entry.value())?);
            *entry.value_mut() = Arc::clone(&next);
            next
        };

        self.rebuild_snapshot();
        self.bump_version();
        Some(updated)
    }

    /// Remove an entity by key. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, key: &DeviceAddress) -> Option<Arc<T>> {
        let (_, removed) = self.by_key.remove(key)?;
        self.order.send_modify(|keys| {
            *keys = Arc::new(keys.iter().filter(|k| *k != key).cloned().collect());
        });

        self.rebuild_snapshot();
        self.bump_version();
        Some(removed)
    }

    pub(crate) fn get(&self, key: &DeviceAddress) -> Option<Arc<T>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn contains(&self, key: &DeviceAddress) -> bool {
        self.by_key.contains_key(key)
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    /// Keys in insertion order.
    pub(crate) fn keys(&self) -> Arc<Vec<DeviceAddress>> {
        self.order.borrow().clone()
    }

    pub(crate) fn subscribe_keys(&self) -> watch::Receiver<Arc<Vec<DeviceAddress>>> {
        self.order.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Rebuild the ordered snapshot and broadcast it.
    ///
    /// Both the key order and the map are read inside `send_modify`,
    /// which holds the snapshot's write lock. Every mutation finishes
    /// its own writes before rebuilding, so whichever rebuild runs last
    /// sees all of them.
    fn rebuild_snapshot(&self) {
        self.snapshot.send_modify(|snap| {
            let keys = self.order.borrow().clone();
            let values: Vec<Arc<T>> = keys
                .iter()
                .filter_map(|k| self.by_key.get(k).map(|r| Arc::clone(r.value())))
                .collect();
            *snap = Arc::new(values);
        });
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn addr(s: &str) -> DeviceAddress {
        DeviceAddress::parse(s).unwrap()
    }

    #[test]
    fn insert_new_rejects_existing_key() {
        let col: EntityCollection<String> = EntityCollection::new();
        assert!(col.insert_new(addr("10.0.0.1"), "a".into()));
        assert!(!col.insert_new(addr("10.0.0.1"), "b".into()));
        assert_eq!(*col.get(&addr("10.0.0.1")).unwrap(), "a");
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn snapshot_follows_insertion_order() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.insert_new(addr("10.0.0.9"), "nine".into());
        col.insert_new(addr("10.0.0.1"), "one".into());
        col.insert_new(addr("10.0.0.5"), "five".into());

        let snap: Vec<String> = col.snapshot().iter().map(|s| (**s).clone()).collect();
        assert_eq!(snap, vec!["nine", "one", "five"]);
        assert_eq!(col.keys()[0], addr("10.0.0.9"));
    }

    #[test]
    fn update_never_creates() {
        let col: EntityCollection<String> = EntityCollection::new();
        let result = col.update(&addr("10.0.0.1"), |_| Some("x".into()));
        assert!(result.is_none());
        assert!(col.is_empty());
    }

    #[test]
    fn update_replaces_in_place() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.insert_new(addr("10.0.0.1"), "a".into());
        col.insert_new(addr("10.0.0.2"), "b".into());

        let v = col.version();
        col.update(&addr("10.0.0.1"), |old| Some(format!("{old}!")));
        assert_eq!(*col.snapshot()[0], "a!");
        assert!(col.version() > v);
    }

    #[test]
    fn update_returning_none_is_a_no_op() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.insert_new(addr("10.0.0.1"), "a".into());
        let v = col.version();
        assert!(col.update(&addr("10.0.0.1"), |_| None).is_none());
        assert_eq!(col.version(), v);
    }

    #[test]
    fn concurrent_insert_and_update_converge() {
        let col: Arc<EntityCollection<u32>> = Arc::new(EntityCollection::new());
        col.insert_new(addr("10.0.0.1"), 0);

        let inserter = {
            let col = Arc::clone(&col);
            std::thread::spawn(move || {
                for i in 2..=200u8 {
                    col.insert_new(addr(&format!("10.0.1.{i}")), u32::from(i));
                }
            })
        };
        let updater = {
            let col = Arc::clone(&col);
            std::thread::spawn(move || {
                for _ in 0..500 {
                    col.update(&addr("10.0.0.1"), |n| Some(n + 1));
                }
            })
        };
        inserter.join().unwrap();
        updater.join().unwrap();

        let snap = col.snapshot();
        assert_eq!(snap.len(), 200);
        assert_eq!(*snap[0], 500);
        assert_eq!(snap.len(), col.keys().len());
    }

    #[test]
    fn remove_drops_key_from_order() {
        let col: EntityCollection<String> = EntityCollection::new();
        col.insert_new(addr("10.0.0.1"), "a".into());
        col.insert_new(addr("10.0.0.2"), "b".into());

        assert_eq!(*col.remove(&addr("10.0.0.1")).unwrap(), "a");
        assert!(col.remove(&addr("10.0.0.1")).is_none());
        assert_eq!(col.keys().as_slice(), &[addr("10.0.0.2")]);
        assert_eq!(col.snapshot().len(), 1);
    }
}
