// ── API-to-domain type conversions ──
//
// Bridges raw `hydrohomie_api` payloads into the partial updates the
// reconciler merges. Units are normalized here: timestamps become
// `DateTime<Utc>`, tank levels become integer tenths of a percent.

use chrono::{DateTime, Utc};

use hydrohomie_api::{ConfigPayload, ConfigUpdate, HistoryEntry, StatusPayload};

use crate::model::{ConfigFields, HistorySample, StatusFields};

/// Epoch values at or above this are milliseconds, below it seconds.
/// 10^11 seconds is far beyond any real clock; 10^11 ms is March 1973.
const MILLIS_THRESHOLD: f64 = 1e11;

/// Upper bound of the tank level scale (tenths of a percent).
const WATER_LEVEL_MAX: f64 = 1000.0;

// ── Helpers ────────────────────────────────────────────────────────

/// Convert a device-reported epoch timestamp, in seconds or
/// milliseconds, to `DateTime<Utc>`.
///
/// Zero, negative and non-finite values mean "never" and map to `None`.
pub fn epoch_to_datetime(raw: f64) -> Option<DateTime<Utc>> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    let millis = if raw >= MILLIS_THRESHOLD {
        raw
    } else {
        raw * 1000.0
    };
    #[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
    let millis = millis.round() as i64;
    DateTime::from_timestamp_millis(millis)
}

/// Round and clamp a tank level into `0..=1000`.
pub fn normalize_water_level(raw: f64) -> Option<u16> {
    if !raw.is_finite() {
        return None;
    }
    #[allow(
        clippy::as_conversions,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let level = raw.round().clamp(0.0, WATER_LEVEL_MAX) as u16;
    Some(level)
}

fn finite(raw: Option<f64>) -> Option<f64> {
    raw.filter(|v| v.is_finite())
}

// ── Payload → update ──────────────────────────────────────────────

impl From<StatusPayload> for StatusFields {
    fn from(p: StatusPayload) -> Self {
        Self {
            is_watering: p.is_watering,
            current_water_level: p.current_water_level.and_then(normalize_water_level),
            current_temp: finite(p.current_temp),
            current_plant_level: finite(p.current_plant_level),
            last_watering_time: p.last_watering_time.and_then(epoch_to_datetime),
        }
    }
}

impl From<ConfigPayload> for ConfigFields {
    fn from(p: ConfigPayload) -> Self {
        Self {
            name: p.name,
            watering_duration: p.watering_duration,
            watering_interval: p.watering_interval,
            last_watering_time: p.last_watering_time.and_then(epoch_to_datetime),
            water_tank_threshold: p.water_tank_threshold,
            plant_flood_buffer: p.plant_flood_buffer,
        }
    }
}

/// The fields a device accepted in a `POST /config`.
impl From<&ConfigUpdate> for ConfigFields {
    fn from(u: &ConfigUpdate) -> Self {
        Self {
            name: u.name.clone(),
            watering_duration: u.watering_duration,
            watering_interval: u.watering_interval,
            last_watering_time: None,
            water_tank_threshold: u.water_tank_threshold,
            plant_flood_buffer: u.plant_flood_buffer,
        }
    }
}

/// Label device history, which arrives oldest-first, with its age.
pub fn history_samples(entries: &[HistoryEntry]) -> Vec<HistorySample> {
    let len = entries.len();
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| HistorySample {
            minutes_ago: u32::try_from(len - i).unwrap_or(u32::MAX),
            temperature: entry.temperature(),
            water_level: entry.water_level(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn epoch_seconds_and_millis_agree() {
        let secs = epoch_to_datetime(1_700_000_000.0).unwrap();
        let millis = epoch_to_datetime(1_700_000_000_000.0).unwrap();
        assert_eq!(secs, millis);
        assert_eq!(secs.timestamp(), 1_700_000_000);
    }

    #[test]
    fn fractional_seconds_keep_millis() {
        let dt = epoch_to_datetime(1_700_000_000.25).unwrap();
        assert_eq!(dt.timestamp_millis(), 1_700_000_000_250);
    }

    #[test]
    fn zero_and_garbage_timestamps_are_unknown() {
        assert!(epoch_to_datetime(0.0).is_none());
        assert!(epoch_to_datetime(-5.0).is_none());
        assert!(epoch_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn water_level_rounds_and_clamps() {
        assert_eq!(normalize_water_level(734.0), Some(734));
        assert_eq!(normalize_water_level(49.6), Some(50));
        assert_eq!(normalize_water_level(-3.0), Some(0));
        assert_eq!(normalize_water_level(1200.0), Some(1000));
        assert_eq!(normalize_water_level(f64::INFINITY), None);
    }

    #[test]
    fn status_payload_converts() {
        let fields = StatusFields::from(StatusPayload {
            is_watering: Some(true),
            current_water_level: Some(500.0),
            current_temp: Some(21.5),
            current_plant_level: None,
            last_watering_time: Some(1_700_000_000.0),
        });
        assert_eq!(fields.is_watering, Some(true));
        assert_eq!(fields.current_water_level, Some(500));
        assert_eq!(fields.last_watering_time.unwrap().timestamp(), 1_700_000_000);
        assert!(fields.current_plant_level.is_none());
    }

    #[test]
    fn config_update_never_carries_last_watering_time() {
        let update = ConfigUpdate {
            name: Some("Fern".into()),
            watering_duration: Some(30),
            watering_interval: Some(3600),
            ..ConfigUpdate::default()
        };
        let fields = ConfigFields::from(&update);
        assert_eq!(fields.name.as_deref(), Some("Fern"));
        assert!(fields.last_watering_time.is_none());
    }

    #[test]
    fn history_is_labelled_oldest_first() {
        let samples = history_samples(&[
            HistoryEntry(20.0, 500.0),
            HistoryEntry(20.5, 498.0),
            HistoryEntry(21.0, 495.0),
        ]);
        assert_eq!(samples[0].minutes_ago, 3);
        assert_eq!(samples[2].minutes_ago, 1);
        assert_eq!(samples[2].age_label(), "1 min ago");
        assert!((samples[0].water_level - 500.0).abs() < f64::EPSILON);
    }
}
