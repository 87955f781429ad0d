// ── Schedule calculator ──
//
// Pure functions deriving watering countdowns from a record and the
// current instant. Nothing here mutates a record; the controller
// recomputes a `ScheduleBoard` on its own fast tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{DeviceAddress, DeviceRecord};

/// Which countdown applies right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulePhase {
    /// Waiting for the next scheduled watering.
    Idle,
    /// A watering is in progress.
    Watering,
}

/// Derived countdowns for one device at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScheduleView {
    pub phase: SchedulePhase,
    /// Set only when idle.
    pub time_until_next_watering: Option<Duration>,
    /// Set only when watering.
    pub remaining_watering_duration: Option<Duration>,
    /// Always within `0.0..=100.0`.
    pub progress_percent: f64,
}

impl ScheduleView {
    /// Compute the view for `record` at `now`.
    ///
    /// Returns `None` when the inputs the current phase needs are not
    /// known yet.
    pub fn compute(record: &DeviceRecord, now: DateTime<Utc>) -> Option<Self> {
        if record.is_watering? {
            let duration = record.watering_duration?;
            let remaining = remaining_watering_duration(record, now)?;
            Some(Self {
                phase: SchedulePhase::Watering,
                time_until_next_watering: None,
                remaining_watering_duration: Some(remaining),
                progress_percent: percent(remaining, duration),
            })
        } else {
            let interval = record.watering_interval?;
            let until = time_until_next_watering(record, now)?;
            let elapsed = secs_to_duration(interval).saturating_sub(until);
            Some(Self {
                phase: SchedulePhase::Idle,
                time_until_next_watering: Some(until),
                remaining_watering_duration: None,
                progress_percent: percent(elapsed, interval),
            })
        }
    }

    /// The countdown for the current phase.
    pub fn countdown(&self) -> Duration {
        match self.phase {
            SchedulePhase::Idle => self.time_until_next_watering,
            SchedulePhase::Watering => self.remaining_watering_duration,
        }
        .unwrap_or_default()
    }
}

/// `max(0, last_watering_time + interval - now)`; only defined while idle.
pub fn time_until_next_watering(record: &DeviceRecord, now: DateTime<Utc>) -> Option<Duration> {
    if record.is_watering? {
        return None;
    }
    Some(until(record.last_watering_time?, record.watering_interval?, now))
}

/// `max(0, last_watering_time + duration - now)`; only defined while watering.
pub fn remaining_watering_duration(record: &DeviceRecord, now: DateTime<Utc>) -> Option<Duration> {
    if !record.is_watering? {
        return None;
    }
    Some(until(record.last_watering_time?, record.watering_duration?, now))
}

/// Time left until `start + secs`, floored at zero, in whole milliseconds.
fn until(start: DateTime<Utc>, secs: u64, now: DateTime<Utc>) -> Duration {
    let span_ms = i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX);
    let deadline = start.timestamp_millis().saturating_add(span_ms);
    let left = deadline.saturating_sub(now.timestamp_millis()).max(0);
    Duration::from_millis(u64::try_from(left).unwrap_or(0))
}

fn secs_to_duration(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

/// `part / whole * 100`, clamped to `0..=100`. A zero `whole` is 100.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn percent(part: Duration, whole_secs: u64) -> f64 {
    if whole_secs == 0 {
        return 100.0;
    }
    let ratio = part.as_secs_f64() / whole_secs as f64 * 100.0;
    if ratio.is_finite() {
        ratio.clamp(0.0, 100.0)
    } else {
        100.0
    }
}

// ── Board ────────────────────────────────────────────────────────────

/// Schedule views for every directory address at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScheduleBoard {
    pub computed_at: Option<DateTime<Utc>>,
    pub entries: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleEntry {
    pub address: DeviceAddress,
    pub view: Option<ScheduleView>,
}

impl ScheduleBoard {
    pub fn compute(records: &[Arc<DeviceRecord>], now: DateTime<Utc>) -> Self {
        Self {
            computed_at: Some(now),
            entries: records
                .iter()
                .map(|rec| ScheduleEntry {
                    address: rec.address.clone(),
                    view: ScheduleView::compute(rec, now),
                })
                .collect(),
        }
    }

    pub fn get(&self, address: &DeviceAddress) -> Option<&ScheduleView> {
        self.entries
            .iter()
            .find(|e| &e.address == address)
            .and_then(|e| e.view.as_ref())
    }
}
