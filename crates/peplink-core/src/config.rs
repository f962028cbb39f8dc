// ── Runtime router configuration ──
//
// These types describe *how* to talk to one router and how often to poll
// it. They carry credential data and cadence tuning, but never touch disk.
// The CLI (via peplink-config) constructs a `RouterConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use crate::scheduler::Cadence;

/// Shortest accepted polling interval.
pub const MIN_INTERVAL: Duration = Duration::from_secs(5);
/// Longest accepted polling interval.
pub const MAX_INTERVAL: Duration = Duration::from_secs(3600);

pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_DIAGNOSTICS_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_USAGE_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_VPN_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_GPS_INTERVAL: Duration = Duration::from_secs(120);

/// A cadence is stale once its last success is older than
/// `interval * DEFAULT_STALE_TOLERANCE`.
pub const DEFAULT_STALE_TOLERANCE: u32 = 3;

/// Access-token lifetime assumed when the grant does not report one.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(46 * 60 * 60);

/// How to authenticate with the router.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Admin username/password; yields a `pauth` session cookie.
    UserPass {
        username: String,
        password: SecretString,
    },
    /// API client credentials; yields a time-limited access token.
    Token {
        client_id: String,
        client_secret: SecretString,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification. Default, routers ship self-signed certs.
    #[default]
    DangerAcceptInvalid,
}

/// Interval and on/off switch for one polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceConfig {
    pub interval: Duration,
    pub enabled: bool,
}

impl CadenceConfig {
    pub const fn enabled(interval: Duration) -> Self {
        Self {
            interval,
            enabled: true,
        }
    }

    pub const fn disabled(interval: Duration) -> Self {
        Self {
            interval,
            enabled: false,
        }
    }
}

/// Polling configuration for every cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CadenceSet {
    pub status: CadenceConfig,
    pub diagnostics: CadenceConfig,
    pub usage: CadenceConfig,
    pub vpn: CadenceConfig,
    pub gps: CadenceConfig,
}

impl Default for CadenceSet {
    fn default() -> Self {
        Self {
            status: CadenceConfig::enabled(DEFAULT_STATUS_INTERVAL),
            diagnostics: CadenceConfig::enabled(DEFAULT_DIAGNOSTICS_INTERVAL),
            usage: CadenceConfig::enabled(DEFAULT_USAGE_INTERVAL),
            // Location is privacy-sensitive and VPN polling is opt-in.
            vpn: CadenceConfig::disabled(DEFAULT_VPN_INTERVAL),
            gps: CadenceConfig::disabled(DEFAULT_GPS_INTERVAL),
        }
    }
}

impl CadenceSet {
    pub fn get(&self, cadence: Cadence) -> CadenceConfig {
        match cadence {
            Cadence::Status => self.status,
            Cadence::Diagnostics => self.diagnostics,
            Cadence::Usage => self.usage,
            Cadence::Vpn => self.vpn,
            Cadence::Gps => self.gps,
        }
    }

    pub fn get_mut(&mut self, cadence: Cadence) -> &mut CadenceConfig {
        match cadence {
            Cadence::Status => &mut self.status,
            Cadence::Diagnostics => &mut self.diagnostics,
            Cadence::Usage => &mut self.usage,
            Cadence::Vpn => &mut self.vpn,
            Cadence::Gps => &mut self.gps,
        }
    }

    /// Enabled cadences with their intervals.
    pub fn active(&self) -> impl Iterator<Item = (Cadence, Duration)> + '_ {
        Cadence::all()
            .filter(|c| self.get(*c).enabled)
            .map(|c| (c, self.get(c).interval))
    }
}

/// Login retry and lockout policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginPolicy {
    /// Extra attempts after a network failure during login.
    pub retries: u32,
    /// First backoff delay; doubles per attempt.
    pub backoff: Duration,
    /// After rejected credentials, `acquire()` fails fast for this long
    /// before another login is attempted.
    pub rejected_cooldown: Duration,
}

impl Default for LoginPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            backoff: Duration::from_millis(500),
            rejected_cooldown: Duration::from_secs(300),
        }
    }
}

/// Configuration for one router.
///
/// Built by the CLI, passed to [`Router`](crate::Router); core never
/// reads config files.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Router URL (e.g., `https://192.168.50.1`).
    pub url: Url,
    /// Authentication mode and credentials.
    pub auth: AuthCredentials,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Polling cadences.
    pub cadences: CadenceSet,
    /// Staleness multiple applied to each cadence interval.
    pub stale_tolerance: u32,
    /// Login retry and lockout policy.
    pub login: LoginPolicy,
    /// Spawn cadence schedulers on connect. Disabled for one-shot CLI use.
    pub polling_enabled: bool,
}

impl RouterConfig {
    /// Defaults for everything but the address and credentials.
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            tls: TlsVerification::default(),
            timeout: peplink_api::transport::DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: peplink_api::transport::DEFAULT_CONNECT_TIMEOUT,
            cadences: CadenceSet::default(),
            stale_tolerance: DEFAULT_STALE_TOLERANCE,
            login: LoginPolicy::default(),
            polling_enabled: true,
        }
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(CoreError::Config {
                message: format!("unsupported URL scheme '{}'", self.url.scheme()),
            });
        }
        if self.url.host_str().is_none_or(str::is_empty) {
            return Err(CoreError::Config {
                message: "router URL has no host".into(),
            });
        }

        match &self.auth {
            AuthCredentials::UserPass { username, .. } if username.trim().is_empty() => {
                return Err(CoreError::Config {
                    message: "username must not be empty".into(),
                });
            }
            AuthCredentials::Token { client_id, .. } if client_id.trim().is_empty() => {
                return Err(CoreError::Config {
                    message: "client id must not be empty".into(),
                });
            }
            _ => {}
        }

        for cadence in Cadence::all() {
            let interval = self.cadences.get(cadence).interval;
            if !(MIN_INTERVAL..=MAX_INTERVAL).contains(&interval) {
                return Err(CoreError::Config {
                    message: format!(
                        "{cadence} interval {}s outside {}..={}s",
                        interval.as_secs(),
                        MIN_INTERVAL.as_secs(),
                        MAX_INTERVAL.as_secs()
                    ),
                });
            }
        }

        if self.stale_tolerance == 0 {
            return Err(CoreError::Config {
                message: "stale tolerance must be at least 1".into(),
            });
        }
        if self.timeout.is_zero() {
            return Err(CoreError::Config {
                message: "request timeout must be non-zero".into(),
            });
        }
        Ok(())
    }
}
