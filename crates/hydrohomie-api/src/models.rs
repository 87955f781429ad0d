// Device API wire types
//
// Payloads for the device HTTP surface. Every field is optional on the
// way in: firmware builds and the desktop simulator disagree about which
// keys they send, and the reconciler treats a missing key as "not
// reported" rather than as a value.

use serde::{Deserialize, Serialize};

// ── GET /status ──────────────────────────────────────────────────────

/// Live sensor readings from `GET /status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub is_watering: Option<bool>,
    /// Tank level in tenths of a percent. Some builds send a float.
    #[serde(default)]
    pub current_water_level: Option<f64>,
    /// Degrees Celsius.
    #[serde(default)]
    pub current_temp: Option<f64>,
    #[serde(default)]
    pub current_plant_level: Option<f64>,
    /// Start of the most recent watering. Firmware reports it here as
    /// well as on `/config`; unit is seconds or milliseconds since epoch.
    #[serde(default)]
    pub last_watering_time: Option<f64>,
}

// ── GET /config ──────────────────────────────────────────────────────

/// Schedule configuration from `GET /config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPayload {
    #[serde(default)]
    pub name: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub watering_duration: Option<u64>,
    /// Seconds.
    #[serde(default)]
    pub watering_interval: Option<u64>,
    #[serde(default)]
    pub last_watering_time: Option<f64>,
    #[serde(default)]
    pub water_tank_threshold: Option<i64>,
    #[serde(default)]
    pub plant_flood_buffer: Option<i64>,
}

// ── POST /config ─────────────────────────────────────────────────────

/// Body for `POST /config`. Absent fields are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watering_duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watering_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_tank_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_flood_buffer: Option<i64>,
}

// ── GET /history ─────────────────────────────────────────────────────

/// One history sample, serialized by the device as a two-element array
/// `[temperature, water_level]`. Samples are one minute apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry(pub f64, pub f64);

impl HistoryEntry {
    pub fn temperature(&self) -> f64 {
        self.0
    }

    pub fn water_level(&self) -> f64 {
        self.1
    }
}
