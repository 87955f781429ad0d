// ── Partial record updates ──
//
// What one fetch (or one confirmed command) contributes to a record.
// Fields left `None` were not reported and leave the record untouched.

use chrono::{DateTime, Utc};

use super::address::DeviceAddress;
use super::record::{Category, DeviceError};

/// Status-category values reported by one `GET /status`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusFields {
    pub is_watering: Option<bool>,
    pub current_water_level: Option<u16>,
    pub current_temp: Option<f64>,
    pub current_plant_level: Option<f64>,
    pub last_watering_time: Option<DateTime<Utc>>,
}

/// Config-category values reported by one `GET /config`, or accepted
/// by one `POST /config`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFields {
    pub name: Option<String>,
    pub watering_duration: Option<u64>,
    pub watering_interval: Option<u64>,
    pub last_watering_time: Option<DateTime<Utc>>,
    pub water_tank_threshold: Option<i64>,
    pub plant_flood_buffer: Option<i64>,
}

/// Result of one fetch for one category.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Status(StatusFields),
    Config(ConfigFields),
    Failed {
        category: Category,
        error: DeviceError,
    },
}

impl PollOutcome {
    pub fn category(&self) -> Category {
        match self {
            Self::Status(_) => Category::Status,
            Self::Config(_) => Category::Config,
            Self::Failed { category, .. } => *category,
        }
    }
}

/// A tagged outcome on its way to the reconciler.
///
/// `seq` is taken from the engine-wide counter when the fetch is issued
/// (or when a command is confirmed); the reconciler drops outcomes older
/// than what the record already holds for that category.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdate {
    pub address: DeviceAddress,
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub outcome: PollOutcome,
}
