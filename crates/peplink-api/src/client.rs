// Router API HTTP client
//
// Wraps `reqwest::Client` with session attachment, the `{stat, response}`
// envelope, and status-code classification. Endpoint groups (wan, usage,
// system, etc.) are inherent methods in separate files so this module
// stays focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::Session;
use crate::error::Error;
use crate::transport::TransportConfig;

const BODY_PREVIEW_CHARS: usize = 200;

/// Raw HTTP client for a single router's local API.
///
/// Stateless with respect to authentication: every request takes the
/// [`Session`] to present, so the caller owns the session lifecycle.
#[derive(Debug, Clone)]
pub struct PeplinkClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl PeplinkClient {
    /// Create a client for the router at `base_url` (e.g. `https://192.168.50.1`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout_secs: TransportConfig::default().timeout.as_secs(),
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve a path (with optional pre-encoded query) against the base URL.
    pub(crate) fn url(&self, path_and_query: &str) -> Result<Url, Error> {
        self.base_url.join(path_and_query).map_err(Error::InvalidUrl)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET and unwrap the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        session: &Session,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {}", url.path());

        let resp = session
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        self.parse_envelope(path, resp).await
    }

    /// Send an authenticated POST with a JSON body and unwrap the envelope.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        session: &Session,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {}", url.path());

        let resp = session
            .authorize(self.http.post(url))
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        self.parse_envelope(path, resp).await
    }

    /// Classify a send failure, surfacing timeouts as their own variant.
    pub(crate) fn send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    async fn parse_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::UnsupportedEndpoint { path: strip_query(path) });
        }
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                path: strip_query(path),
            });
        }

        let body = resp.text().await.map_err(|e| self.send_error(e))?;
        decode_envelope(path, &body)
    }
}

/// Decode a `{stat, code, message, response}` body.
///
/// A failed envelope with code 401 is a session expiry even though the HTTP
/// status was 200. Endpoints that answer without a `response` member
/// (the `cgi-bin` family) are decoded from the document root.
pub(crate) fn decode_envelope<T: DeserializeOwned>(path: &str, body: &str) -> Result<T, Error> {
    let mut doc: Value = serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: preview(body),
    })?;

    let stat = doc.get("stat").and_then(Value::as_str).unwrap_or("ok");
    if stat != "ok" {
        let code = doc.get("code").and_then(envelope_code);
        let message = doc
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| format!("stat={stat}"), str::to_owned);
        return Err(match code {
            Some(401) => Error::SessionExpired,
            Some(404) => Error::UnsupportedEndpoint { path: strip_query(path) },
            _ => Error::Api { code, message },
        });
    }

    let payload = match doc.get_mut("response") {
        Some(inner) if !inner.is_null() => inner.take(),
        _ => doc,
    };

    serde_json::from_value(payload).map_err(|e| Error::Deserialization {
        message: format!("{}: {e}", strip_query(path)),
        body: preview(body),
    })
}

fn envelope_code(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn strip_query(path: &str) -> String {
    path.split('?').next().unwrap_or(path).to_owned()
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
