//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use hydrohomie_config::ConfigError;
use hydrohomie_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Device ───────────────────────────────────────────────────────
    #[error("Could not reach device at {address}")]
    #[diagnostic(
        code(hydrohomie::unreachable),
        help(
            "Check that the device is powered and on the same network.\n\
             Reason: {reason}"
        )
    )]
    Unreachable { address: String, reason: String },

    #[error("Device {address} did not answer within {seconds}s")]
    #[diagnostic(
        code(hydrohomie::timeout),
        help("Increase timeout with --timeout or check the device's Wi-Fi signal.")
    )]
    Timeout { address: String, seconds: u64 },

    #[error("Device {address} rejected the request (HTTP {status})")]
    #[diagnostic(code(hydrohomie::rejected), help("Device said: {message}"))]
    Rejected {
        address: String,
        status: u16,
        message: String,
    },

    #[error("Device {address} sent an unexpected response")]
    #[diagnostic(
        code(hydrohomie::invalid_response),
        help("Is this really a HydroHomie device? {message}")
    )]
    InvalidResponse { address: String, message: String },

    // ── Directory ────────────────────────────────────────────────────
    #[error("Device '{address}' is not in the directory")]
    #[diagnostic(
        code(hydrohomie::not_found),
        help("Run: hydrohomie devices list to see known devices")
    )]
    NotFound { address: String },

    #[error("Device '{address}' is already in the directory")]
    #[diagnostic(code(hydrohomie::conflict))]
    Conflict { address: String },

    #[error("Could not save the device directory")]
    #[diagnostic(
        code(hydrohomie::persistence),
        help("{message}\nUse --directory to point at a writable file.")
    )]
    Persistence { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hydrohomie::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(hydrohomie::config),
        help("Inspect the file with: hydrohomie config show")
    )]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(hydrohomie::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Engine ───────────────────────────────────────────────────────
    #[error("Internal error: {message}")]
    #[diagnostic(code(hydrohomie::internal))]
    Internal { message: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } | Self::InvalidResponse { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unreachable { address, reason } => CliError::Unreachable { address, reason },

            CoreError::Timeout {
                address,
                timeout_secs,
            } => CliError::Timeout {
                address,
                seconds: timeout_secs,
            },

            CoreError::InvalidResponse { address, message } => {
                CliError::InvalidResponse { address, message }
            }

            CoreError::Rejected {
                address,
                status,
                message,
            } => CliError::Rejected {
                address,
                status,
                message,
            },

            CoreError::DuplicateAddress { address } => CliError::Conflict { address },

            CoreError::DeviceNotFound { address } => CliError::NotFound { address },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Persistence { message } => CliError::Persistence { message },

            CoreError::EngineStopped => CliError::Internal {
                message: "engine stopped before the command completed".into(),
            },

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}
