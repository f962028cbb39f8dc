use thiserror::Error;

/// Top-level error type for the `peplink-api` crate.
///
/// Covers every failure mode of the router's local API: authentication,
/// transport, the `{stat, response}` envelope, and payload decoding.
/// `peplink-core` folds these into its own coarser error kinds.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login or token grant rejected (wrong credentials, disabled client, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Session cookie or access token is no longer accepted.
    ///
    /// Raised both for HTTP 401 and for an HTTP 200 envelope carrying
    /// `{"stat":"fail","code":401}`.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Unexpected HTTP status outside the envelope.
    #[error("HTTP {status} from {path}")]
    HttpStatus { status: u16, path: String },

    // ── Router API ──────────────────────────────────────────────────
    /// Endpoint does not exist on this model or firmware.
    #[error("Endpoint not supported by this router: {path}")]
    UnsupportedEndpoint { path: String },

    /// Envelope reported `stat: fail` for a reason other than auth.
    #[error("Router API error: {message}")]
    Api { code: Option<i64>, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with a preview of the raw body.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session is gone and a fresh login may help.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the router lacks this endpoint.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedEndpoint { .. })
    }

    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }
}
