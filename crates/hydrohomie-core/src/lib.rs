//! Polling, reconciliation and schedule engine for a HydroHomie fleet.
//!
//! This crate sits between `hydrohomie-api` and its consumers (the CLI):
//!
//! - **[`Controller`]**: central facade. [`start()`](Controller::start)
//!   loads the persisted directory and spawns the status and config poll
//!   cycles, the schedule tick, the merge task and the command processor.
//!   [`Controller::oneshot()`] runs a closure against a controller with
//!   polling disabled, for single CLI invocations.
//!
//! - **[`DataStore`]**: the device directory and one reconciled
//!   [`DeviceRecord`] per address, built on a `DashMap` plus
//!   `tokio::sync::watch` snapshots.
//!
//! - **Reconciler** ([`store::merge`]): overlays partial poll results and
//!   confirmed command results onto a record. Failures never erase known
//!   values, and outcomes older than what a record already holds are
//!   dropped.
//!
//! - **Schedule calculator** ([`ScheduleView`]): pure countdown and
//!   progress math over a record and an instant.
//!
//! - **[`Command`]**: typed operator intents routed through an `mpsc`
//!   channel to the command processor. Reads bypass the channel via
//!   snapshots or ad-hoc device queries.
//!
//! - **[`SelectionTracker`]**: the currently viewed device, held by
//!   address and resolved against the store on every read.

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod persist;
pub mod schedule;
pub mod selection;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult, ConfigChange};
pub use config::EngineConfig;
pub use controller::{Controller, EngineState};
pub use error::{CoreError, ErrorKind};
pub use persist::{DirectoryPersistence, MemoryDirectory};
pub use schedule::{ScheduleBoard, ScheduleEntry, SchedulePhase, ScheduleView};
pub use selection::{SelectionStream, SelectionTracker};
pub use store::DataStore;
pub use stream::{RecordStream, Snapshot};

pub use model::{
    Category, ConfigFields, DeviceAddress, DeviceError, DeviceRecord, HistorySample, PollOutcome,
    RecordUpdate, StatusFields,
};
