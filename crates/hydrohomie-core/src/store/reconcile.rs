// ── Reconciler ──
//
// Merges poll outcomes and confirmed command results into the record
// for their address. `merge` is pure; `DataStore::apply_update` is the
// single entry point that writes the result back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use super::DataStore;
use crate::model::{
    Category, ConfigFields, DeviceError, DeviceRecord, PollOutcome, RecordUpdate, StatusFields,
};

/// Overlay `src` onto `dst` when present.
fn overlay<T: Clone>(dst: &mut Option<T>, src: Option<&T>) {
    if let Some(v) = src {
        *dst = Some(v.clone());
    }
}

impl DeviceRecord {
    /// Overlay a successful status fetch and clear the status error.
    pub fn apply_status(&mut self, fields: &StatusFields, at: DateTime<Utc>) {
        overlay(&mut self.is_watering, fields.is_watering.as_ref());
        overlay(&mut self.current_water_level, fields.current_water_level.as_ref());
        overlay(&mut self.current_temp, fields.current_temp.as_ref());
        overlay(&mut self.current_plant_level, fields.current_plant_level.as_ref());
        self.status_error = None;
        self.last_status_update = Some(at);
    }

    /// Overlay a successful config fetch (or accepted update) and clear
    /// the config error.
    pub fn apply_config(&mut self, fields: &ConfigFields, at: DateTime<Utc>) {
        overlay(&mut self.name, fields.name.as_ref());
        overlay(&mut self.watering_duration, fields.watering_duration.as_ref());
        overlay(&mut self.watering_interval, fields.watering_interval.as_ref());
        overlay(&mut self.water_tank_threshold, fields.water_tank_threshold.as_ref());
        overlay(&mut self.plant_flood_buffer, fields.plant_flood_buffer.as_ref());
        self.config_error = None;
        self.last_config_update = Some(at);
    }

    /// Overlay `last_watering_time` unless a newer outcome of either
    /// category already set it.
    fn apply_last_watering(&mut self, at: Option<DateTime<Utc>>, seq: u64) {
        if let Some(t) = at {
            if seq >= self.last_watering_seq {
                self.last_watering_time = Some(t);
                self.last_watering_seq = seq;
            }
        }
    }

    /// Record a failure for `category`. Data fields are untouched.
    pub fn apply_failure(&mut self, category: Category, error: DeviceError) {
        match category {
            Category::Status => self.status_error = Some(error),
            Category::Config => self.config_error = Some(error),
        }
    }
}

/// Merge one outcome into `current`.
///
/// Returns `None` when the update is stale: its sequence number is older
/// than the newest outcome already merged for the same category, or it
/// targets a different address.
pub fn merge(current: &DeviceRecord, update: &RecordUpdate) -> Option<DeviceRecord> {
    if update.address != current.address {
        return None;
    }
    let category = update.outcome.category();
    if update.seq < current.seq(category) {
        return None;
    }

    let mut next = current.clone();
    match &update.outcome {
        PollOutcome::Status(fields) => {
            next.apply_status(fields, update.at);
            next.apply_last_watering(fields.last_watering_time, update.seq);
        }
        PollOutcome::Config(fields) => {
            next.apply_config(fields, update.at);
            next.apply_last_watering(fields.last_watering_time, update.seq);
        }
        PollOutcome::Failed { category, error } => next.apply_failure(*category, error.clone()),
    }
    match category {
        Category::Status => next.status_seq = update.seq,
        Category::Config => next.config_seq = update.seq,
    }
    Some(next)
}

impl DataStore {
    /// Apply `update` to the record for its address.
    ///
    /// A no-op (returning `None`) when the address is no longer in the
    /// directory or the update is stale.
    pub(crate) fn apply_update(&self, update: &RecordUpdate) -> Option<Arc<DeviceRecord>> {
        let Some(merged) = self.records.update(&update.address, |rec| merge(rec, update)) else {
            trace!(
                address = %update.address,
                seq = update.seq,
                "discarding stale or orphaned update"
            );
            return None;
        };

        debug!(
            address = %update.address,
            category = %update.outcome.category(),
            seq = update.seq,
            ok = !matches!(update.outcome, PollOutcome::Failed { .. }),
            "merged update"
        );
        self.mark_merged(update.at);
        Some(merged)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::DeviceAddress;
    use pretty_assertions::assert_eq;

    fn addr() -> DeviceAddress {
        DeviceAddress::parse("10.0.0.5").unwrap()
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn status(seq: u64, level: u16, watering: bool) -> RecordUpdate {
        RecordUpdate {
            address: addr(),
            seq,
            at: ts(1_000 + i64::try_from(seq).unwrap()),
            outcome: PollOutcome::Status(StatusFields {
                is_watering: Some(watering),
                current_water_level: Some(level),
                current_temp: Some(21.0),
                ..StatusFields::default()
            }),
        }
    }

    fn config(seq: u64, interval: u64) -> RecordUpdate {
        RecordUpdate {
            address: addr(),
            seq,
            at: ts(1_000 + i64::try_from(seq).unwrap()),
            outcome: PollOutcome::Config(ConfigFields {
                name: Some("Basil".into()),
                watering_duration: Some(30),
                watering_interval: Some(interval),
                last_watering_time: Some(ts(500)),
                ..ConfigFields::default()
            }),
        }
    }

    fn failure(seq: u64, category: Category) -> RecordUpdate {
        RecordUpdate {
            address: addr(),
            seq,
            at: ts(2_000),
            outcome: PollOutcome::Failed {
                category,
                error: DeviceError::new(ErrorKind::Timeout, "timed out", ts(2_000)),
            },
        }
    }

    #[test]
    fn success_overlays_present_fields_only() {
        let rec = DeviceRecord::new(addr());
        let rec = merge(&rec, &status(1, 700, false)).unwrap();

        let partial = RecordUpdate {
            outcome: PollOutcome::Status(StatusFields {
                current_temp: Some(25.0),
                ..StatusFields::default()
            }),
            ..status(2, 0, false)
        };
        let rec = merge(&rec, &partial).unwrap();

        assert_eq!(rec.current_water_level, Some(700));
        assert_eq!(rec.is_watering, Some(false));
        assert_eq!(rec.current_temp, Some(25.0));
        assert_eq!(rec.last_status_update, Some(ts(1_002)));
    }

    #[test]
    fn failure_preserves_all_data_fields() {
        let rec = DeviceRecord::new(addr());
        let rec = merge(&rec, &status(1, 700, true)).unwrap();
        let rec = merge(&rec, &config(2, 3600)).unwrap();
        let before = rec.clone();

        let rec = merge(&rec, &failure(3, Category::Status)).unwrap();
        let rec = merge(&rec, &failure(4, Category::Config)).unwrap();

        assert_eq!(rec.is_watering, before.is_watering);
        assert_eq!(rec.current_water_level, before.current_water_level);
        assert_eq!(rec.current_temp, before.current_temp);
        assert_eq!(rec.name, before.name);
        assert_eq!(rec.watering_duration, before.watering_duration);
        assert_eq!(rec.watering_interval, before.watering_interval);
        assert_eq!(rec.last_watering_time, before.last_watering_time);
        assert_eq!(rec.status_error.as_ref().unwrap().kind, ErrorKind::Timeout);
        assert!(rec.config_error.is_some());
    }

    #[test]
    fn success_clears_only_its_own_category_error() {
        let rec = DeviceRecord::new(addr());
        let rec = merge(&rec, &failure(1, Category::Status)).unwrap();
        let rec = merge(&rec, &failure(2, Category::Config)).unwrap();
        let rec = merge(&rec, &config(3, 3600)).unwrap();

        assert!(rec.config_error.is_none());
        assert!(rec.status_error.is_some());
    }

    #[test]
    fn status_failure_with_config_success_in_same_tick() {
        let rec = DeviceRecord::new(addr());
        let rec = merge(&rec, &failure(1, Category::Status)).unwrap();
        let rec = merge(&rec, &config(2, 3600)).unwrap();

        assert_eq!(rec.watering_interval, Some(3600));
        assert_eq!(rec.name.as_deref(), Some("Basil"));
        assert!(rec.is_watering.is_none());
        assert!(rec.current_water_level.is_none());
        assert_eq!(rec.status_error.as_ref().unwrap().kind, ErrorKind::Timeout);
    }

    #[test]
    fn stale_outcome_is_discarded() {
        let rec = DeviceRecord::new(addr());
        let rec = merge(&rec, &status(5, 800, false)).unwrap();
        assert!(merge(&rec, &status(3, 100, true)).is_none());
        assert!(merge(&rec, &failure(4, Category::Status)).is_none());
        // Categories are ordered independently.
        assert!(merge(&rec, &config(2, 60)).is_some());
    }

    #[test]
    fn later_config_fetch_overrides_optimistic_merge() {
        let rec = DeviceRecord::new(addr());
        let rec = merge(&rec, &config(1, 3600)).unwrap();

        let optimistic = RecordUpdate {
            address: addr(),
            seq: 2,
            at: ts(1_100),
            outcome: PollOutcome::Config(ConfigFields {
                watering_interval: Some(7200),
                ..ConfigFields::default()
            }),
        };
        let rec = merge(&rec, &optimistic).unwrap();
        assert_eq!(rec.watering_interval, Some(7200));
        assert_eq!(rec.name.as_deref(), Some("Basil"));

        let rec = merge(&rec, &config(3, 5400)).unwrap();
        assert_eq!(rec.watering_interval, Some(5400));

        // Re-applying the same fetch is harmless.
        let again = merge(&rec, &config(3, 5400)).unwrap();
        assert_eq!(again, rec);
    }

    #[test]
    fn last_watering_time_keeps_newest_across_categories() {
        let rec = DeviceRecord::new(addr());
        let newer = RecordUpdate {
            outcome: PollOutcome::Status(StatusFields {
                last_watering_time: Some(ts(2_000)),
                ..StatusFields::default()
            }),
            ..status(10, 0, false)
        };
        let rec = merge(&rec, &newer).unwrap();

        // An older config fetch still lands its own fields but not the
        // watering time the status fetch already superseded.
        let rec = merge(&rec, &config(9, 3600)).unwrap();
        assert_eq!(rec.watering_interval, Some(3600));
        assert_eq!(rec.last_watering_time, Some(ts(2_000)));

        let rec = merge(&rec, &config(11, 3600)).unwrap();
        assert_eq!(rec.last_watering_time, Some(ts(500)));
    }

    #[test]
    fn mismatched_address_is_ignored() {
        let rec = DeviceRecord::new(DeviceAddress::parse("10.0.0.6").unwrap());
        assert!(merge(&rec, &status(1, 1, false)).is_none());
    }

    #[test]
    fn store_ignores_updates_for_removed_address() {
        let store = DataStore::new();
        store.add_device(addr()).unwrap();
        store.remove_device(&addr());

        assert!(store.apply_update(&status(1, 500, false)).is_none());
        assert!(store.record(&addr()).is_none());
        assert!(store.last_merge().is_none());
    }

    #[test]
    fn store_applies_and_stamps_merge_time() {
        let store = DataStore::new();
        store.add_device(addr()).unwrap();

        let rec = store.apply_update(&status(1, 500, false)).unwrap();
        assert_eq!(rec.current_water_level, Some(500));
        assert_eq!(store.last_merge(), Some(ts(1_001)));
        assert_eq!(store.record(&addr()).unwrap().current_water_level, Some(500));
    }
}
