// ── Runtime engine configuration ──
//
// How often the engine polls and ticks, and how long it waits for a
// device. Built by the CLI from the config file and flags; core never
// reads config files.

use std::time::Duration;

/// Tuning for one engine instance. A zero period disables that task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Per-request timeout for every device call.
    pub request_timeout: Duration,
    /// Period of the status poll cycle.
    pub status_interval: Duration,
    /// Period of the config poll cycle.
    pub config_interval: Duration,
    /// Period of the schedule recomputation tick.
    pub schedule_tick: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(4),
            status_interval: Duration::from_secs(5),
            config_interval: Duration::from_secs(5),
            schedule_tick: Duration::from_secs(1),
        }
    }
}

impl EngineConfig {
    /// Commands only: no polling, no schedule tick.
    pub fn oneshot(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            status_interval: Duration::ZERO,
            config_interval: Duration::ZERO,
            schedule_tick: Duration::ZERO,
        }
    }
}
