// WAN status endpoint
//
// `/api/status.wan.connection?id=1 2 3` answers with one record per
// requested connection id, keyed by the id as a string.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::auth::Session;
use crate::client::PeplinkClient;
use crate::error::Error;
use crate::models::{RawWanConnection, numbered};

const WAN_STATUS_PATH: &str = "/api/status.wan.connection";

impl PeplinkClient {
    /// Fetch status for the given WAN connection ids.
    ///
    /// Ids the router does not know are simply absent from the result.
    pub async fn wan_status(
        &self,
        session: &Session,
        conn_ids: &[u32],
    ) -> Result<BTreeMap<u32, RawWanConnection>, Error> {
        let ids = conn_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("%20");
        let path = format!("{WAN_STATUS_PATH}?id={ids}");

        let response: Map<String, Value> = self.get(&path, session).await?;
        numbered(&response).map_err(|e| Error::Deserialization {
            message: format!("{WAN_STATUS_PATH}: {e}"),
            body: String::new(),
        })
    }
}
