// WAN control endpoints
//
// Priority changes take effect immediately (`instantActive`). Neither
// endpoint returns the new state; callers observe it on the next poll.

use serde_json::{Value, json};
use tracing::debug;

use crate::auth::Session;
use crate::client::PeplinkClient;
use crate::error::Error;

const PRIORITY_PATH: &str = "/api/config.wan.connection.priority";
const MODEM_RESET_PATH: &str = "/api/cmd.cellularModule.reset";

impl PeplinkClient {
    /// Set a WAN's priority level, or disable it when `priority` is `None`.
    pub async fn set_wan_priority(
        &self,
        session: &Session,
        conn_id: u32,
        priority: Option<u8>,
    ) -> Result<(), Error> {
        let item = match priority {
            Some(level) => json!({ "connId": conn_id, "priority": level }),
            None => json!({ "connId": conn_id, "enable": false }),
        };
        let body = json!({ "instantActive": true, "list": [item] });

        debug!(conn_id, ?priority, "setting WAN priority");
        let _: Value = self.post(PRIORITY_PATH, session, &body).await?;
        Ok(())
    }

    /// Power-cycle the cellular module behind a WAN.
    pub async fn reset_cellular_modem(&self, session: &Session, conn_id: u32) -> Result<(), Error> {
        // The router expects connId as a string on this endpoint.
        let body = json!({ "connId": conn_id.to_string() });

        debug!(conn_id, "resetting cellular modem");
        let _: Value = self.post(MODEM_RESET_PATH, session, &body).await?;
        Ok(())
    }
}
