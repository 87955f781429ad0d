// ── Domain model ──
//
// Canonical types the engine exposes to its consumers. Wire payloads
// from `hydrohomie-api` are normalized into these by `convert`.

pub mod address;
pub mod history;
pub mod record;
pub mod update;

pub use address::DeviceAddress;
pub use history::HistorySample;
pub use record::{Category, DeviceError, DeviceRecord};
pub use update::{ConfigFields, PollOutcome, RecordUpdate, StatusFields};
