// ── Endpoint registry ──
//
// The closed set of router subsystems the engine polls. Each `Endpoint`
// issues exactly one request, converts the raw payload, and returns the
// matching `Record` variant. Endpoints never retry and never touch shared
// state; retry and bookkeeping belong to the scheduler and aggregator.

use std::collections::BTreeMap;

use serde::Serialize;
use strum::{Display, EnumIter};

use peplink_api::{PeplinkClient, Session};

use crate::convert;
use crate::model::{
    Bandwidth, DeviceIdentity, GpsFix, HardwareSensors, VpnProfile, WanId, WanStatus, WanUsage,
};

/// One pollable router subsystem.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Endpoint {
    WanStatus,
    Bandwidth,
    Usage,
    Sensors,
    DeviceInfo,
    Firmware,
    ConnectedClients,
    VpnStatus,
    Location,
}

/// Parsed result of one endpoint fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    WanStatus(BTreeMap<WanId, WanStatus>),
    Bandwidth(BTreeMap<WanId, Bandwidth>),
    Usage(BTreeMap<WanId, WanUsage>),
    Sensors(HardwareSensors),
    DeviceInfo(DeviceIdentity),
    Firmware(Option<String>),
    ConnectedClients(usize),
    VpnStatus(Vec<VpnProfile>),
    Location(GpsFix),
}

impl Record {
    /// The endpoint that produces this variant.
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::WanStatus(_) => Endpoint::WanStatus,
            Self::Bandwidth(_) => Endpoint::Bandwidth,
            Self::Usage(_) => Endpoint::Usage,
            Self::Sensors(_) => Endpoint::Sensors,
            Self::DeviceInfo(_) => Endpoint::DeviceInfo,
            Self::Firmware(_) => Endpoint::Firmware,
            Self::ConnectedClients(_) => Endpoint::ConnectedClients,
            Self::VpnStatus(_) => Endpoint::VpnStatus,
            Self::Location(_) => Endpoint::Location,
        }
    }
}

impl Endpoint {
    /// Perform one request/response cycle.
    ///
    /// `wan_ids` scopes the WAN status query; other endpoints ignore it.
    pub async fn fetch(
        self,
        api: &PeplinkClient,
        session: &Session,
        wan_ids: &[u32],
    ) -> Result<Record, peplink_api::Error> {
        let record = match self {
            Self::WanStatus => Record::WanStatus(
                api.wan_status(session, wan_ids)
                    .await?
                    .iter()
                    .map(|(id, raw)| (WanId::new(*id), convert::wan_status(*id, raw)))
                    .collect(),
            ),
            Self::Bandwidth => Record::Bandwidth(
                api.traffic(session)
                    .await?
                    .iter()
                    .map(|(id, raw)| (WanId::new(*id), convert::bandwidth(raw)))
                    .collect(),
            ),
            Self::Usage => Record::Usage(
                api.wan_usage(session)
                    .await?
                    .iter()
                    .map(|(id, raw)| (WanId::new(*id), convert::wan_usage(*id, raw)))
                    .collect(),
            ),
            Self::Sensors => Record::Sensors(convert::sensors(&api.system_sensors(session).await?)),
            Self::DeviceInfo => {
                Record::DeviceInfo(convert::device_identity(&api.device_info(session).await?))
            }
            Self::Firmware => Record::Firmware(api.firmware_version(session).await?),
            Self::ConnectedClients => {
                Record::ConnectedClients(api.connected_clients(session).await?)
            }
            Self::VpnStatus => {
                Record::VpnStatus(convert::vpn_profiles(&api.pepvpn_status(session).await?))
            }
            Self::Location => Record::Location(convert::gps_fix(&api.location(session).await?)),
        };
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::scheduler::Cadence;

    #[test]
    fn every_endpoint_belongs_to_exactly_one_cadence() {
        for endpoint in Endpoint::iter() {
            let owners: Vec<_> = Cadence::all()
                .filter(|c| c.endpoints().contains(&endpoint))
                .collect();
            assert_eq!(owners.len(), 1, "{endpoint} owned by {owners:?}");
        }
    }

    #[test]
    fn record_reports_its_endpoint() {
        assert_eq!(Record::Firmware(None).endpoint(), Endpoint::Firmware);
        assert_eq!(
            Record::Location(GpsFix::default()).endpoint(),
            Endpoint::Location
        );
    }
}
