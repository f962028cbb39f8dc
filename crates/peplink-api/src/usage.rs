// WAN usage allowance endpoint

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::auth::Session;
use crate::client::PeplinkClient;
use crate::error::Error;
use crate::models::{RawUsage, numbered};

const USAGE_PATH: &str = "/api/status.wan.connection.allowance";

impl PeplinkClient {
    /// Fetch bandwidth-allowance counters for every WAN that tracks usage.
    pub async fn wan_usage(&self, session: &Session) -> Result<BTreeMap<u32, RawUsage>, Error> {
        let response: Map<String, Value> = self.get(USAGE_PATH, session).await?;
        numbered(&response).map_err(|e| Error::Deserialization {
            message: format!("{USAGE_PATH}: {e}"),
            body: String::new(),
        })
    }
}
