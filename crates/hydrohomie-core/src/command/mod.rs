// ── Command API ──
//
// Operator intents flow through a unified `Command` enum. The
// controller's command processor runs each one as its own task against
// the device and feeds accepted changes back through the reconciler.

pub mod requests;

use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{DeviceAddress, DeviceRecord};

pub use requests::ConfigChange;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All operator intents the engine accepts.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Directory ────────────────────────────────────────────────────
    /// Probe the device, then append it to the directory.
    AddDevice { address: DeviceAddress },
    RemoveDevice { address: DeviceAddress },

    // ── Device ───────────────────────────────────────────────────────
    UpdateConfig {
        address: DeviceAddress,
        change: ConfigChange,
    },
    ForceWater { address: DeviceAddress },
    ForceStop { address: DeviceAddress },
}

impl Command {
    pub fn address(&self) -> &DeviceAddress {
        match self {
            Self::AddDevice { address }
            | Self::RemoveDevice { address }
            | Self::UpdateConfig { address, .. }
            | Self::ForceWater { address }
            | Self::ForceStop { address } => address,
        }
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// Accepted by the device; no record change.
    Ok,
    /// The new record, with the probe merged in.
    Added(Arc<DeviceRecord>),
    /// The record as it was when removed.
    Removed(Arc<DeviceRecord>),
    /// The record after the optimistic config merge.
    ConfigApplied(Arc<DeviceRecord>),
}

impl CommandResult {
    pub fn record(&self) -> Option<&Arc<DeviceRecord>> {
        match self {
            Self::Ok => None,
            Self::Added(rec) | Self::Removed(rec) | Self::ConfigApplied(rec) => Some(rec),
        }
    }
}
