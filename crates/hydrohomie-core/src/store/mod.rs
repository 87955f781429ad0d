// ── Reactive data store ──

pub(crate) mod collection;
mod data_store;
pub mod reconcile;

pub use data_store::DataStore;
pub use reconcile::merge;
