//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use peplink_config::ConfigError;
use peplink_core::{CoreError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach router at {url}")]
    #[diagnostic(
        code(peplink::connection_failed),
        help(
            "Check that the router is powered on and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Router request timed out after {seconds}s")]
    #[diagnostic(
        code(peplink::timeout),
        help("Increase the timeout with --timeout or check the router's load.")
    )]
    Timeout { seconds: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(peplink::auth_failed),
        help(
            "Verify the admin username and password (or API client credentials)\n\
             in profile '{profile}'. The router blocks logins for a while after\n\
             repeated failures."
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(peplink::no_credentials),
        help(
            "Set username and password_env in the profile,\n\
             or pass --username / PEPLINK_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    // ── Router responses ─────────────────────────────────────────────
    #[error("WAN {wan} not found")]
    #[diagnostic(
        code(peplink::wan_not_found),
        help("Run: peplink wans list   (or peplink wans rediscover after adding a WAN)")
    )]
    WanNotFound { wan: u32 },

    #[error("Router rejected the request: {message}")]
    #[diagnostic(code(peplink::rejected))]
    Rejected { message: String },

    #[error("Not supported by this router: {feature}")]
    #[diagnostic(
        code(peplink::unsupported),
        help("The router's firmware does not expose this endpoint.")
    )]
    Unsupported { feature: String },

    #[error("{cadence} poll failed: {message}")]
    #[diagnostic(code(peplink::poll_failed), help("Run with -v for request details."))]
    PollFailed {
        cadence: String,
        kind: ErrorKind,
        message: String,
    },

    #[error("Unexpected response from router: {message}")]
    #[diagnostic(code(peplink::parse))]
    Parse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(peplink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(peplink::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No router configured")]
    #[diagnostic(
        code(peplink::no_config),
        help(
            "Add a [profiles.<name>] table to {path}\n\
             or pass --url with --username and PEPLINK_PASSWORD."
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(peplink::config))]
    Config(String),

    #[error("Router engine stopped")]
    #[diagnostic(code(peplink::stopped))]
    Stopped,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(peplink::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Stopped => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::WanNotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            Self::PollFailed { kind, .. } => match kind {
                ErrorKind::Network => exit_code::CONNECTION,
                ErrorKind::Timeout => exit_code::TIMEOUT,
                ErrorKind::Auth | ErrorKind::SessionExpired => exit_code::AUTH,
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }

    /// Name the profile in authentication errors.
    pub fn with_profile(self, name: &str) -> Self {
        match self {
            Self::AuthFailed { message, .. } => Self::AuthFailed {
                profile: name.to_owned(),
                message,
            },
            other => other,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Network { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },
            CoreError::SessionExpired => CliError::AuthFailed {
                profile: "current".into(),
                message: "session expired and could not be renewed".into(),
            },
            CoreError::RouterStopped => CliError::Stopped,
            CoreError::Parse { message } => CliError::Parse { message },
            CoreError::UnsupportedFeature { endpoint } => CliError::Unsupported { feature: endpoint },
            CoreError::Rejected { message, code } => CliError::Rejected {
                message: match code {
                    Some(code) => format!("{message} (code {code})"),
                    None => message,
                },
            },
            CoreError::WanNotFound { wan } => CliError::WanNotFound { wan },
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Config(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::UnknownProfile { name, available } => {
                CliError::ProfileNotFound { name, available }
            }
            ConfigError::NoProfile => CliError::NoConfig {
                path: peplink_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let auth = CliError::from(CoreError::AuthenticationFailed {
            message: "bad password".into(),
        });
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let wan = CliError::from(CoreError::WanNotFound { wan: 9 });
        assert_eq!(wan.exit_code(), exit_code::NOT_FOUND);

        let net = CliError::from(CoreError::Network {
            url: "https://192.168.50.1".into(),
            reason: "connection refused".into(),
        });
        assert_eq!(net.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn missing_profile_is_a_usage_error() {
        let err = CliError::from(ConfigError::NoProfile);
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
