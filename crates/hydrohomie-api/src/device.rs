// Device endpoints
//
// Reads (status, config, history) and commands (config update, water,
// stop) against a single device address.

use tracing::debug;

use crate::client::HomieClient;
use crate::error::Error;
use crate::models::{ConfigPayload, ConfigUpdate, HistoryEntry, StatusPayload};

impl HomieClient {
    /// Fetch live sensor readings.
    ///
    /// `GET http://{address}/status`
    pub async fn get_status(&self, address: &str) -> Result<StatusPayload, Error> {
        let url = self.device_url(address, "status")?;
        self.get_json(url).await
    }

    /// Fetch the schedule configuration.
    ///
    /// `GET http://{address}/config`
    pub async fn get_config(&self, address: &str) -> Result<ConfigPayload, Error> {
        let url = self.device_url(address, "config")?;
        self.get_json(url).await
    }

    /// Fetch the recorded sensor history, in the order the device keeps it.
    ///
    /// `GET http://{address}/history`
    pub async fn get_history(&self, address: &str) -> Result<Vec<HistoryEntry>, Error> {
        let url = self.device_url(address, "history")?;
        self.get_json(url).await
    }

    /// Push a configuration change.
    ///
    /// `POST http://{address}/config` with the update as JSON.
    pub async fn update_config(&self, address: &str, update: &ConfigUpdate) -> Result<(), Error> {
        let url = self.device_url(address, "config")?;
        debug!(address, ?update, "updating device config");
        self.post(url, Some(update)).await
    }

    /// Start watering now.
    ///
    /// `POST http://{address}/water`
    pub async fn force_water(&self, address: &str) -> Result<(), Error> {
        let url = self.device_url(address, "water")?;
        debug!(address, "forcing watering");
        self.post(url, None::<&()>).await
    }

    /// Stop an in-progress watering.
    ///
    /// `POST http://{address}/stop`
    pub async fn force_stop(&self, address: &str) -> Result<(), Error> {
        let url = self.device_url(address, "stop")?;
        debug!(address, "forcing stop");
        self.post(url, None::<&()>).await
    }
}
