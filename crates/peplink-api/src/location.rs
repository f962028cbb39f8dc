// GPS location endpoint

use serde::Deserialize;
use serde_json::Value;

use crate::auth::Session;
use crate::client::PeplinkClient;
use crate::error::Error;
use crate::models::RawLocation;

const LOCATION_PATH: &str = "/api/info.location";

impl PeplinkClient {
    /// Fetch the router's GPS position.
    ///
    /// Some firmware nests the fix under `location`, some return it at the
    /// response root. A router without a fix answers with neither
    /// coordinate; check [`RawLocation::has_fix`].
    pub async fn location(&self, session: &Session) -> Result<RawLocation, Error> {
        let response: Value = self.get(LOCATION_PATH, session).await?;
        let fix = match response.get("location") {
            Some(nested) if nested.is_object() => nested,
            _ => &response,
        };
        if !fix.is_object() {
            return Ok(RawLocation::default());
        }
        RawLocation::deserialize(fix).map_err(|e| Error::Deserialization {
            message: format!("{LOCATION_PATH}: {e}"),
            body: String::new(),
        })
    }
}
