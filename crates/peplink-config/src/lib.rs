//! Shared configuration for the Peplink CLI.
//!
//! TOML profiles (one per router), credential resolution (env +
//! plaintext), and translation to `peplink_core::RouterConfig`. The CLI
//! layers its flag overrides on top.

mod duration;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use peplink_core::config::DEFAULT_STALE_TOLERANCE;
use peplink_core::{AuthCredentials, Cadence, CadenceConfig, RouterConfig, TlsVerification};

pub use duration::HumanDuration;

/// Prefix of environment overrides, e.g. `PEPLINK_DEFAULTS__OUTPUT=json`.
pub const ENV_PREFIX: &str = "PEPLINK_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("no profile selected and no default_profile configured")]
    NoProfile,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: None,
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Pick the profile named `requested`, else `default_profile`, else the
    /// only profile when exactly one exists.
    pub fn profile<'a>(
        &'a self,
        requested: Option<&'a str>,
    ) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = match requested.or(self.default_profile.as_deref()) {
            Some(name) => name,
            None if self.profiles.len() == 1 => {
                let Some(only) = self.profiles.keys().next() else {
                    return Err(ConfigError::NoProfile);
                };
                only.as_str()
            }
            None => return Err(ConfigError::NoProfile),
        };

        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.to_owned(),
                available: self.profile_list(),
            })
    }

    fn profile_list(&self) -> String {
        if self.profiles.is_empty() {
            "none".into()
        } else {
            self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Per-request timeout applied to profiles that set none.
    #[serde(default = "default_timeout")]
    pub timeout: HumanDuration,

    #[serde(default = "default_stale_tolerance")]
    pub stale_tolerance: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            stale_tolerance: default_stale_tolerance(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> HumanDuration {
    HumanDuration(Duration::from_secs(30))
}
fn default_stale_tolerance() -> u32 {
    DEFAULT_STALE_TOLERANCE
}

/// How a profile authenticates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Admin username and password (session cookie).
    #[default]
    Userpass,
    /// API client id and secret (access token).
    Token,
}

/// Interval and switch override for one cadence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CadenceOverride {
    pub interval: Option<HumanDuration>,
    pub enabled: Option<bool>,
}

impl CadenceOverride {
    fn apply(self, base: &mut CadenceConfig) {
        if let Some(interval) = self.interval {
            base.interval = interval.0;
        }
        if let Some(enabled) = self.enabled {
            base.enabled = enabled;
        }
    }
}

/// `[profiles.<name>.poll]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollSettings {
    pub status: CadenceOverride,
    pub diagnostics: CadenceOverride,
    pub usage: CadenceOverride,
    pub vpn: CadenceOverride,
    pub gps: CadenceOverride,
}

impl PollSettings {
    pub fn get(&self, cadence: Cadence) -> CadenceOverride {
        match cadence {
            Cadence::Status => self.status,
            Cadence::Diagnostics => self.diagnostics,
            Cadence::Usage => self.usage,
            Cadence::Vpn => self.vpn,
            Cadence::Gps => self.gps,
        }
    }
}

/// A named router profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Router base URL (e.g., "https://192.168.50.1").
    pub url: String,

    #[serde(default)]
    pub auth_mode: AuthMode,

    /// Admin username for `userpass` auth.
    pub username: Option<String>,

    /// Password (plaintext, prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    /// API client id for `token` auth.
    pub client_id: Option<String>,

    /// Client secret (plaintext, prefer `client_secret_env`).
    pub client_secret: Option<String>,

    /// Environment variable holding the client secret.
    pub client_secret_env: Option<String>,

    /// Path to custom CA certificate. Implies strict verification.
    pub ca_cert: Option<PathBuf>,

    /// Verify against the system CA store instead of accepting the
    /// router's self-signed certificate.
    pub verify_tls: Option<bool>,

    /// Override the default request timeout.
    pub timeout: Option<HumanDuration>,

    /// Override the staleness multiple.
    pub stale_tolerance: Option<u32>,

    #[serde(default)]
    pub poll: PollSettings,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "peplink-monitor", "peplink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("peplink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file at `path`, then `PEPLINK_` environment
/// variables. Nested keys are separated by `__`.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment. A missing file is
/// not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment(path).extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Secret from the named env var, else the shared `PEPLINK_*` var, else
/// the plaintext value.
fn resolve_secret(
    env_name: Option<&str>,
    shared_env: &str,
    plaintext: Option<&str>,
) -> Option<SecretString> {
    env_name
        .and_then(|name| std::env::var(name).ok())
        .or_else(|| std::env::var(shared_env).ok())
        .or_else(|| plaintext.map(str::to_owned))
        .filter(|s| !s.is_empty())
        .map(SecretString::from)
}

/// Resolve `AuthCredentials` from a profile's `auth_mode`.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    let missing = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };

    match profile.auth_mode {
        AuthMode::Userpass => {
            let username = profile
                .username
                .clone()
                .or_else(|| std::env::var("PEPLINK_USERNAME").ok())
                .ok_or_else(missing)?;
            let password = resolve_secret(
                profile.password_env.as_deref(),
                "PEPLINK_PASSWORD",
                profile.password.as_deref(),
            )
            .ok_or_else(missing)?;
            Ok(AuthCredentials::UserPass { username, password })
        }
        AuthMode::Token => {
            let client_id = profile
                .client_id
                .clone()
                .or_else(|| std::env::var("PEPLINK_CLIENT_ID").ok())
                .ok_or_else(missing)?;
            let client_secret = resolve_secret(
                profile.client_secret_env.as_deref(),
                "PEPLINK_CLIENT_SECRET",
                profile.client_secret.as_deref(),
            )
            .ok_or_else(missing)?;
            Ok(AuthCredentials::Token {
                client_id,
                client_secret,
            })
        }
    }
}

/// Build a validated `RouterConfig` from a profile and the global
/// defaults. No CLI flag overrides.
pub fn profile_to_router_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<RouterConfig, ConfigError> {
    let url: url::Url = profile.url.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {}", profile.url),
    })?;

    let auth = resolve_auth(profile, profile_name)?;
    let mut config = RouterConfig::new(url, auth);

    config.tls = if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else if profile.verify_tls.unwrap_or(false) {
        TlsVerification::SystemDefaults
    } else {
        TlsVerification::DangerAcceptInvalid
    };

    config.timeout = profile.timeout.unwrap_or(defaults.timeout).0;
    config.stale_tolerance = profile.stale_tolerance.unwrap_or(defaults.stale_tolerance);

    for cadence in Cadence::all() {
        profile
            .poll
            .get(cadence)
            .apply(config.cadences.get_mut(cadence));
    }

    config
        .validate()
        .map_err(|e| ConfigError::Validation {
            field: format!("profile '{profile_name}'"),
            reason: e.to_string(),
        })?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn profiles(names: &[&str]) -> Config {
        Config {
            default_profile: None,
            defaults: Defaults::default(),
            profiles: names
                .iter()
                .map(|n| ((*n).to_owned(), Profile::default()))
                .collect(),
        }
    }

    #[test]
    fn single_profile_is_implicit_default() {
        let cfg = profiles(&["van"]);
        assert_eq!(cfg.profile(None).unwrap().0, "van");
    }

    #[test]
    fn ambiguous_profile_requires_a_name() {
        let cfg = profiles(&["van", "home"]);
        assert!(matches!(cfg.profile(None), Err(ConfigError::NoProfile)));
        match cfg.profile(Some("cabin")) {
            Err(ConfigError::UnknownProfile { available, .. }) => {
                assert_eq!(available, "home, van");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn default_tls_accepts_self_signed() {
        let profile = Profile {
            url: "https://192.168.50.1".into(),
            username: Some("admin".into()),
            password: Some("pw".into()),
            ..Profile::default()
        };
        let cfg = profile_to_router_config(&profile, "home", &Defaults::default()).unwrap();
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }
}
