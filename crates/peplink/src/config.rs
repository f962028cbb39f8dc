//! CLI configuration: thin wrapper around `peplink_config` that layers
//! `GlobalOpts` flag overrides (--url, --username, --timeout, ...) on top
//! of the selected profile.

use clap::ValueEnum;
use peplink_config::{Config, ConfigError, Profile, profile_to_router_config};
use peplink_core::{RouterConfig, TlsVerification};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Name used for a router given entirely on the command line.
const ADHOC_PROFILE: &str = "cli";

/// Load the config file, failing on a malformed file but not a missing one.
pub fn load() -> Result<Config, CliError> {
    Ok(peplink_config::load_config()?)
}

/// Output format: flag, else `[defaults] output`, else table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&cfg.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

/// Color mode: flag, else `[defaults] color`, else auto.
pub fn color_mode(global: &GlobalOpts, cfg: &Config) -> ColorMode {
    global
        .color
        .or_else(|| ColorMode::from_str(&cfg.defaults.color, true).ok())
        .unwrap_or(ColorMode::Auto)
}

/// Resolve the router to talk to from flags and config.
pub fn resolve_router(
    global: &GlobalOpts,
    cfg: &Config,
) -> Result<(String, RouterConfig), CliError> {
    let (name, profile) = match cfg.profile(global.profile.as_deref()) {
        Ok((name, profile)) => (name.to_owned(), profile.clone()),
        // No profile at all: the flags must describe the router.
        Err(ConfigError::NoProfile) if global.url.is_some() => {
            (ADHOC_PROFILE.to_owned(), Profile::default())
        }
        Err(e) => return Err(e.into()),
    };
    let router = build(global, cfg, &name, profile)?;
    Ok((name, router))
}

/// Every configured profile, with the global flag overrides that make
/// sense for more than one router (TLS, timeout).
pub fn resolve_all(global: &GlobalOpts, cfg: &Config) -> Result<Vec<(String, RouterConfig)>, CliError> {
    if cfg.profiles.is_empty() {
        return Err(ConfigError::NoProfile.into());
    }
    cfg.profiles
        .iter()
        .map(|(name, profile)| {
            let mut router = profile_to_router_config(profile, name, &cfg.defaults)?;
            apply_transport_overrides(global, &mut router);
            Ok((name.clone(), router))
        })
        .collect()
}

fn build(
    global: &GlobalOpts,
    cfg: &Config,
    name: &str,
    mut profile: Profile,
) -> Result<RouterConfig, CliError> {
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if let Some(ref password) = global.password {
        profile.password = Some(password.clone());
        profile.password_env = None;
    }

    let mut router = profile_to_router_config(&profile, name, &cfg.defaults)?;
    apply_transport_overrides(global, &mut router);
    router.validate()?;
    Ok(router)
}

fn apply_transport_overrides(global: &GlobalOpts, router: &mut RouterConfig) {
    if global.strict_tls && router.tls == TlsVerification::DangerAcceptInvalid {
        router.tls = TlsVerification::SystemDefaults;
    }
    if let Some(timeout) = global.timeout {
        router.timeout = timeout;
    }
}
