// ── Device record domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::address::DeviceAddress;
use crate::error::{CoreError, ErrorKind};

/// The two independently polled halves of a device record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Status,
    Config,
}

/// Last failure recorded for one category of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceError {
    pub kind: ErrorKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl DeviceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            kind,
            message: message.into(),
            at,
        }
    }

    pub fn from_error(err: &CoreError, at: DateTime<Utc>) -> Self {
        Self::new(err.kind(), err.to_string(), at)
    }
}

/// Merged, client-side view of one device.
///
/// Every device-reported field is `None` until the device has reported
/// it; a failed fetch never clears a known value. Status and config
/// halves are refreshed independently and each carries its own error
/// and update time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub address: DeviceAddress,

    // Status
    pub is_watering: Option<bool>,
    /// Tank level in tenths of a percent, `0..=1000`.
    pub current_water_level: Option<u16>,
    pub current_temp: Option<f64>,
    pub current_plant_level: Option<f64>,

    // Config
    pub name: Option<String>,
    /// Seconds.
    pub watering_duration: Option<u64>,
    /// Seconds.
    pub watering_interval: Option<u64>,
    pub last_watering_time: Option<DateTime<Utc>>,
    pub water_tank_threshold: Option<i64>,
    pub plant_flood_buffer: Option<i64>,

    // Bookkeeping
    pub status_error: Option<DeviceError>,
    pub config_error: Option<DeviceError>,
    pub last_status_update: Option<DateTime<Utc>>,
    pub last_config_update: Option<DateTime<Utc>>,

    /// Sequence of the newest status outcome merged so far.
    #[serde(skip)]
    pub(crate) status_seq: u64,
    /// Sequence of the newest config outcome merged so far.
    #[serde(skip)]
    pub(crate) config_seq: u64,
    /// Sequence of the outcome that last set `last_watering_time`.
    /// Both categories report it, so it is ordered on its own.
    #[serde(skip)]
    pub(crate) last_watering_seq: u64,
}

impl DeviceRecord {
    /// A record with nothing known yet.
    pub fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            is_watering: None,
            current_water_level: None,
            current_temp: None,
            current_plant_level: None,
            name: None,
            watering_duration: None,
            watering_interval: None,
            last_watering_time: None,
            water_tank_threshold: None,
            plant_flood_buffer: None,
            status_error: None,
            config_error: None,
            last_status_update: None,
            last_config_update: None,
            status_seq: 0,
            config_seq: 0,
            last_watering_seq: 0,
        }
    }

    /// The configured name, falling back to the address.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.address.as_str())
    }

    pub fn last_error(&self, category: Category) -> Option<&DeviceError> {
        match category {
            Category::Status => self.status_error.as_ref(),
            Category::Config => self.config_error.as_ref(),
        }
    }

    pub fn last_update(&self, category: Category) -> Option<DateTime<Utc>> {
        match category {
            Category::Status => self.last_status_update,
            Category::Config => self.last_config_update,
        }
    }

    /// `true` when the newest outcome of either category was a failure.
    pub fn has_error(&self) -> bool {
        self.status_error.is_some() || self.config_error.is_some()
    }

    /// `true` once at least one fetch of either category has succeeded.
    pub fn has_reported(&self) -> bool {
        self.last_status_update.is_some() || self.last_config_update.is_some()
    }

    /// Tank level as a percentage.
    pub fn water_level_percent(&self) -> Option<f64> {
        self.current_water_level.map(|l| f64::from(l) / 10.0)
    }

    pub(crate) fn seq(&self, category: Category) -> u64 {
        match category {
            Category::Status => self.status_seq,
            Category::Config => self.config_seq,
        }
    }
}
