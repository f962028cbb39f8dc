//! Config command handlers.

use tabled::Tabled;

use peplink_config::{AuthMode, Config};

use crate::cli::{ConfigArgs, ConfigCommand, OutputFormat};
use crate::error::CliError;
use crate::output::Printer;

const REDACTED: &str = "********";

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Auth")]
    auth: String,
    #[tabled(rename = "Default")]
    default: String,
}

/// Copy of `cfg` with plaintext secrets masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(REDACTED.into());
        }
        if profile.client_secret.is_some() {
            profile.client_secret = Some(REDACTED.into());
        }
    }
    cfg
}

pub fn handle(args: &ConfigArgs, cfg: &Config, printer: &Printer) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let safe = redacted(cfg);
            let out = match printer.format {
                OutputFormat::Table => {
                    toml::to_string_pretty(&safe).map_err(|e| CliError::Render(e.to_string()))?
                }
                _ => printer.single(&safe, String::new)?,
            };
            printer.print(out.trim_end());
            Ok(())
        }

        ConfigCommand::Path => {
            printer.print(&peplink_config::config_path().display().to_string());
            Ok(())
        }

        ConfigCommand::Profiles => {
            let default = cfg.default_profile.as_deref();
            let names: Vec<&String> = cfg.profiles.keys().collect();
            let out = printer.list(&names, || {
                cfg.profiles
                    .iter()
                    .map(|(name, p)| ProfileRow {
                        name: name.clone(),
                        url: p.url.clone(),
                        auth: match p.auth_mode {
                            AuthMode::Userpass => "userpass".into(),
                            AuthMode::Token => "token".into(),
                        },
                        default: if default == Some(name.as_str()) {
                            "*".into()
                        } else {
                            String::new()
                        },
                    })
                    .collect()
            })?;
            printer.print(&out);
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use peplink_config::Profile;

    use super::*;

    #[test]
    fn show_masks_plaintext_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "van".into(),
            Profile {
                url: "https://192.168.50.1".into(),
                password: Some("hunter2".into()),
                password_env: Some("VAN_PASSWORD".into()),
                ..Profile::default()
            },
        );

        let safe = redacted(&cfg);
        let van = &safe.profiles["van"];
        assert_eq!(van.password.as_deref(), Some(REDACTED));
        assert_eq!(van.password_env.as_deref(), Some("VAN_PASSWORD"));
        assert!(van.client_secret.is_none());
    }
}
