// System and diagnostics endpoints
//
// Firmware and client counts come from `/api`; sensors, hardware identity
// and live traffic come from the older `cgi-bin/MANGA` API, which may
// answer without the `response` wrapper.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::auth::Session;
use crate::client::PeplinkClient;
use crate::error::Error;
use crate::models::{RawBandwidth, RawClientList, RawFirmware, RawSystemInfo, RawTraffic, numbered};

const FIRMWARE_PATH: &str = "/api/info.firmware";
const CLIENTS_PATH: &str = "/api/status.client";
const SENSORS_PATH: &str =
    "/cgi-bin/MANGA/api.cgi?func=status.system.info&infoType=thermalSensor%20fanSpeed";
const DEVICE_PATH: &str = "/cgi-bin/MANGA/api.cgi?func=status.system.info&infoType=device";
const TRAFFIC_PATH: &str = "/cgi-bin/MANGA/api.cgi?func=status.traffic";

impl PeplinkClient {
    /// Fetch the firmware table and pick the running image.
    ///
    /// Returns the entry flagged `inUse`, falling back to slot 1.
    pub async fn firmware_version(&self, session: &Session) -> Result<Option<String>, Error> {
        let response: Map<String, Value> = self.get(FIRMWARE_PATH, session).await?;
        let images: BTreeMap<u32, RawFirmware> =
            numbered(&response).map_err(|e| Error::Deserialization {
                message: format!("{FIRMWARE_PATH}: {e}"),
                body: String::new(),
            })?;

        Ok(images
            .values()
            .find(|fw| fw.in_use == Some(true))
            .and_then(|fw| fw.version.clone())
            .or_else(|| images.get(&1).and_then(|fw| fw.version.clone())))
    }

    /// Count clients currently attached to the LAN.
    pub async fn connected_clients(&self, session: &Session) -> Result<usize, Error> {
        let response: RawClientList = self.get(CLIENTS_PATH, session).await?;
        Ok(response.list.len())
    }

    /// Fetch thermal sensor and fan readings.
    pub async fn system_sensors(&self, session: &Session) -> Result<RawSystemInfo, Error> {
        self.get(SENSORS_PATH, session).await
    }

    /// Fetch hardware identity (serial number, model, revision).
    pub async fn device_info(&self, session: &Session) -> Result<RawSystemInfo, Error> {
        self.get(DEVICE_PATH, session).await
    }

    /// Fetch live per-WAN throughput in kbps.
    pub async fn traffic(&self, session: &Session) -> Result<BTreeMap<u32, RawBandwidth>, Error> {
        let response: RawTraffic = self.get(TRAFFIC_PATH, session).await?;
        numbered(&response.bandwidth).map_err(|e| Error::Deserialization {
            message: format!("{TRAFFIC_PATH}: {e}"),
            body: String::new(),
        })
    }
}
