// ── Core error types ──
//
// Engine-level errors from peplink-core. Consumers never see HTTP status
// codes or JSON decode failures directly; `From<peplink_api::Error>`
// folds transport-layer errors into the kinds that drive retry and
// health decisions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Unified error type for the core crate.
///
/// `Clone` so one login outcome can be handed to every waiter.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach router at {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Router request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session expired and re-authentication did not restore access")]
    SessionExpired,

    #[error("Router engine is stopped")]
    RouterStopped,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed router response: {message}")]
    Parse { message: String },

    #[error("Not supported by this router's firmware: {endpoint}")]
    UnsupportedFeature { endpoint: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Router rejected the request: {message}")]
    Rejected { message: String, code: Option<i64> },

    #[error("WAN {wan} not found in the discovered topology")]
    WanNotFound { wan: u32 },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Coarse classification used by retry policy and health evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    SessionExpired,
    Network,
    Timeout,
    Parse,
    Unsupported,
    Rejected,
    Validation,
    Config,
    Stopped,
}

impl ErrorKind {
    /// Network errors and timeouts are treated identically.
    pub fn is_network(self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::AuthenticationFailed { .. } => ErrorKind::Auth,
            Self::SessionExpired => ErrorKind::SessionExpired,
            Self::RouterStopped => ErrorKind::Stopped,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::UnsupportedFeature { .. } => ErrorKind::Unsupported,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::WanNotFound { .. } | Self::ValidationFailed { .. } => ErrorKind::Validation,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Worth retrying after a backoff (login) or on the next tick (polls).
    pub fn is_transient(&self) -> bool {
        self.kind().is_network()
    }
}

/// Last failure recorded against a snapshot record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchError {
    pub kind: ErrorKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl FetchError {
    pub fn new(err: &CoreError, at: DateTime<Utc>) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            at,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<peplink_api::Error> for CoreError {
    fn from(err: peplink_api::Error) -> Self {
        match err {
            peplink_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            peplink_api::Error::SessionExpired => CoreError::SessionExpired,
            peplink_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else {
                    CoreError::Network {
                        url: e
                            .url()
                            .map(|u| u.origin().ascii_serialization())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            peplink_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            peplink_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            peplink_api::Error::Tls(msg) => CoreError::Network {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            peplink_api::Error::HttpStatus { status, path } if status >= 500 => {
                CoreError::Network {
                    url: path,
                    reason: format!("HTTP {status}"),
                }
            }
            peplink_api::Error::HttpStatus { status, path } => CoreError::Rejected {
                message: format!("HTTP {status} from {path}"),
                code: Some(i64::from(status)),
            },
            peplink_api::Error::UnsupportedEndpoint { path } => {
                CoreError::UnsupportedFeature { endpoint: path }
            }
            peplink_api::Error::Api { code, message } => CoreError::Rejected { message, code },
            peplink_api::Error::Deserialization { message, body: _ } => {
                CoreError::Parse { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_count_as_network() {
        let err = CoreError::from(peplink_api::Error::Timeout { timeout_secs: 30 });
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.is_transient());
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        let five = CoreError::from(peplink_api::Error::HttpStatus {
            status: 502,
            path: "/api/status.client".into(),
        });
        let four = CoreError::from(peplink_api::Error::HttpStatus {
            status: 400,
            path: "/api/status.client".into(),
        });
        assert!(five.is_transient());
        assert_eq!(four.kind(), ErrorKind::Rejected);
    }

    #[test]
    fn unsupported_and_parse_map_to_their_kinds() {
        let unsupported = CoreError::from(peplink_api::Error::UnsupportedEndpoint {
            path: "/api/info.location".into(),
        });
        let parse = CoreError::from(peplink_api::Error::Deserialization {
            message: "expected object".into(),
            body: "[]".into(),
        });
        assert_eq!(unsupported.kind(), ErrorKind::Unsupported);
        assert_eq!(parse.kind(), ErrorKind::Parse);
    }
}
