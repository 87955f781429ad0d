// ── Sensor history ──

use serde::{Deserialize, Serialize};

/// One sample of a device's rolling sensor history.
///
/// Samples are one minute apart; `minutes_ago` counts back from the
/// newest sample, which is `1 min ago`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistorySample {
    pub minutes_ago: u32,
    pub temperature: f64,
    /// Tank level in tenths of a percent.
    pub water_level: f64,
}

impl HistorySample {
    pub fn age_label(&self) -> String {
        format!("{} min ago", self.minutes_ago)
    }
}
