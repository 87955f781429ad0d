// ── Core error types ──
//
// User-facing errors from hydrohomie-core. Consumers never see raw
// reqwest errors: `CoreError::from_api` translates transport-layer
// failures into the engine's error kinds, tagged with the device address.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use crate::model::DeviceAddress;

/// Coarse classification shared by command errors and the per-device
/// `last_error` recorded by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Network-level failure: refused, reset, DNS, no route.
    Unreachable,
    /// No answer within the request timeout.
    Timeout,
    /// Answered, but not with the JSON shape we expect.
    InvalidResponse,
    /// Answered with a non-2xx status.
    Rejected,
    /// Address already present in the directory.
    DuplicateAddress,
    /// Operator input failed validation.
    ValidationFailure,
    /// Address not present in the directory.
    NotFound,
    /// Engine-side failure (stopped controller, persistence, internal).
    Internal,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Device errors ────────────────────────────────────────────────
    #[error("Cannot reach device at {address}: {reason}")]
    Unreachable { address: String, reason: String },

    #[error("Device {address} did not answer within {timeout_secs}s")]
    Timeout { address: String, timeout_secs: u64 },

    #[error("Device {address} sent an unexpected response: {message}")]
    InvalidResponse { address: String, message: String },

    #[error("Device {address} rejected the request (HTTP {status}): {message}")]
    Rejected {
        address: String,
        status: u16,
        message: String,
    },

    // ── Directory errors ─────────────────────────────────────────────
    #[error("Device {address} is already in the directory")]
    DuplicateAddress { address: String },

    #[error("Device not found: {address}")]
    DeviceNotFound { address: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Engine errors ────────────────────────────────────────────────
    #[error("Engine is not running")]
    EngineStopped,

    #[error("Failed to persist device directory: {message}")]
    Persistence { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Translate a transport error for `address` into a domain error.
    pub fn from_api(address: &DeviceAddress, err: hydrohomie_api::Error) -> Self {
        let address = address.to_string();
        match err {
            hydrohomie_api::Error::Timeout { timeout_secs } => Self::Timeout {
                address,
                timeout_secs,
            },
            hydrohomie_api::Error::Transport(ref e) if e.is_timeout() => Self::Timeout {
                address,
                timeout_secs: 0,
            },
            hydrohomie_api::Error::Transport(e) if e.is_decode() => Self::InvalidResponse {
                address,
                message: e.to_string(),
            },
            hydrohomie_api::Error::Transport(e) => Self::Unreachable {
                address,
                reason: e.to_string(),
            },
            hydrohomie_api::Error::InvalidUrl(e) => Self::ValidationFailed {
                message: format!("invalid device address '{address}': {e}"),
            },
            hydrohomie_api::Error::Rejected { status, body } => Self::Rejected {
                address,
                status,
                message: body,
            },
            hydrohomie_api::Error::Deserialization { message, body: _ } => {
                Self::InvalidResponse { address, message }
            }
        }
    }

    /// The coarse [`ErrorKind`] for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreachable { .. } => ErrorKind::Unreachable,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::DuplicateAddress { .. } => ErrorKind::DuplicateAddress,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailure,
            Self::DeviceNotFound { .. } => ErrorKind::NotFound,
            Self::EngineStopped | Self::Persistence { .. } | Self::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}
