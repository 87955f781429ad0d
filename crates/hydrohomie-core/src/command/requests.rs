// ── Typed request structs for Command payloads ──

use serde::{Deserialize, Serialize};

use hydrohomie_api::ConfigUpdate;

use crate::error::CoreError;
use crate::model::DeviceRecord;

/// Operator-requested schedule change. Absent fields keep their
/// current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watering_duration: Option<u64>,
    /// Seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watering_interval: Option<u64>,
}

impl ConfigChange {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.watering_duration.is_none() && self.watering_interval.is_none()
    }

    /// Reject input the device would refuse anyway.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(validation("nothing to change"));
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(validation("name must not be blank"));
        }
        if self.watering_duration == Some(0) {
            return Err(validation("watering duration must be positive"));
        }
        if self.watering_interval == Some(0) {
            return Err(validation("watering interval must be positive"));
        }
        Ok(())
    }

    /// Build the full `POST /config` body against the current record.
    ///
    /// Firmware replaces the whole schedule on update and treats a
    /// missing duration or interval as zero, so both must be known:
    /// either in the change or already reported by the device.
    pub fn to_update(&self, record: &DeviceRecord) -> Result<ConfigUpdate, CoreError> {
        self.validate()?;

        let watering_duration = self
            .watering_duration
            .or(record.watering_duration)
            .ok_or_else(|| validation("watering duration is not known yet; pass it explicitly"))?;
        let watering_interval = self
            .watering_interval
            .or(record.watering_interval)
            .ok_or_else(|| validation("watering interval is not known yet; pass it explicitly"))?;

        Ok(ConfigUpdate {
            name: self
                .name
                .as_ref()
                .map(|n| n.trim().to_owned())
                .or_else(|| record.name.clone()),
            watering_duration: Some(watering_duration),
            watering_interval: Some(watering_interval),
            water_tank_threshold: record.water_tank_threshold,
            plant_flood_buffer: record.plant_flood_buffer,
        })
    }
}

fn validation(message: &str) -> CoreError {
    CoreError::ValidationFailed {
        message: message.to_owned(),
    }
}
