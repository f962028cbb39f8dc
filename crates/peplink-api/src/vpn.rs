// PepVPN status endpoint

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::auth::Session;
use crate::client::PeplinkClient;
use crate::error::Error;
use crate::models::{RawPepVpn, RawVpnProfile};

const PEPVPN_PATH: &str = "/api/status.pepvpn";

impl PeplinkClient {
    /// Fetch PepVPN / SpeedFusion profiles keyed by profile id.
    pub async fn pepvpn_status(
        &self,
        session: &Session,
    ) -> Result<BTreeMap<String, RawVpnProfile>, Error> {
        let response: RawPepVpn = self.get(PEPVPN_PATH, session).await?;
        Ok(response
            .profile
            .iter()
            .filter(|(_, value)| value.is_object())
            .filter_map(|(id, value)| {
                RawVpnProfile::deserialize(value)
                    .ok()
                    .map(|profile| (id.clone(), profile))
            })
            .collect())
    }
}
