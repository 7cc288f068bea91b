//! Config subcommand handlers.

use std::collections::HashMap;
use std::fmt::Write as _;

use dialoguer::{Confirm, Input, Select};

use panwatch_config::{AuthMode, api_key_entry, password_entry, store_secret};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

fn auth_mode_str(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::Credentials => "credentials",
        AuthMode::ApiKey => "api-key",
    }
}

/// Format config for display, masking secrets.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "scan_interval = {}", cfg.defaults.scan_interval);

    for name in cfg.profile_names() {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        if let Some(port) = p.port {
            let _ = writeln!(out, "port = {port}");
        }
        if let Some(ref vsys) = p.vsys {
            let _ = writeln!(out, "vsys = \"{vsys}\"");
        }
        let _ = writeln!(out, "auth_mode = \"{}\"", auth_mode_str(p.auth_mode));
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(interval) = p.scan_interval {
            let _ = writeln!(out, "scan_interval = {interval}");
        }
    }

    out
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

fn invalid(field: &str, reason: &str) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

fn parse_value<T: std::str::FromStr>(
    field: &str,
    value: &str,
    reason: &str,
) -> Result<T, CliError> {
    value.parse().map_err(|_| invalid(field, reason))
}

/// Prompt for a secret and offer to keep it in the system keyring.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored
/// in the keyring.
fn prompt_secret_storage(
    prompt: &str,
    entry: &str,
    label: &str,
) -> Result<Option<String>, CliError> {
    let secret = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(invalid(label, "cannot be empty"));
    }

    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_secret(entry, &secret)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("panwatch configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let host: String = Input::new()
                .with_prompt("Firewall host or IP")
                .interact_text()
                .map_err(prompt_err)?;

            let port: u16 = Input::new()
                .with_prompt("HTTPS port")
                .default(443)
                .interact_text()
                .map_err(prompt_err)?;

            let vsys: String = Input::new()
                .with_prompt("Virtual system")
                .default("vsys1".into())
                .interact_text()
                .map_err(prompt_err)?;

            let auth_choices = &["Username/Password", "API key"];
            let auth_selection = Select::new()
                .with_prompt("Authentication method")
                .items(auth_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile {
                host,
                port: (port != 443).then_some(port),
                vsys: (vsys != "vsys1").then_some(vsys),
                ..Profile::default()
            };

            if auth_selection == 0 {
                let username: String = Input::new()
                    .with_prompt("Username")
                    .interact_text()
                    .map_err(prompt_err)?;
                profile.username = Some(username);
                profile.password = prompt_secret_storage(
                    "Password: ",
                    &password_entry(&profile_name),
                    "password",
                )?;
            } else {
                profile.auth_mode = AuthMode::ApiKey;
                profile.api_key = prompt_secret_storage(
                    "API key: ",
                    &api_key_entry(&profile_name),
                    "API key",
                )?;
            }

            let insecure = Confirm::new()
                .with_prompt("Accept a self-signed management certificate?")
                .default(false)
                .interact()
                .map_err(prompt_err)?;
            profile.insecure = insecure.then_some(true);

            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: panwatch status");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let redacted = Config {
                profiles: cfg
                    .profiles
                    .iter()
                    .map(|(name, p)| {
                        let masked = Profile {
                            password: p.password.as_ref().map(|_| "****".into()),
                            api_key: p.api_key.as_ref().map(|_| "****".into()),
                            ..p.clone()
                        };
                        (name.clone(), masked)
                    })
                    .collect::<HashMap<_, _>>(),
                ..cfg
            };
            let out = output::render_single(&global.output, &redacted, format_config_redacted, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "host" => profile.host = value,
                "port" => profile.port = Some(parse_value("port", &value, "must be 1-65535")?),
                "vsys" => profile.vsys = Some(value),
                "auth_mode" | "auth-mode" => {
                    profile.auth_mode = match value.as_str() {
                        "credentials" => AuthMode::Credentials,
                        "api-key" | "api_key" => AuthMode::ApiKey,
                        _ => {
                            return Err(invalid(
                                "auth_mode",
                                "must be 'credentials' or 'api-key'",
                            ));
                        }
                    };
                }
                "username" => profile.username = Some(value),
                "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
                "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                "insecure" => {
                    profile.insecure =
                        Some(parse_value("insecure", &value, "must be 'true' or 'false'")?);
                }
                "timeout" => {
                    profile.timeout =
                        Some(parse_value("timeout", &value, "must be a number (seconds)")?);
                }
                "scan_interval" | "scan-interval" => {
                    let secs: u64 =
                        parse_value("scan_interval", &value, "must be a number (seconds)")?;
                    if secs != 0 && secs < panwatch_core::config::MIN_SCAN_INTERVAL_SECS {
                        return Err(invalid("scan_interval", "must be at least 10 seconds"));
                    }
                    profile.scan_interval = Some(secs);
                }
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: host, port, vsys, \
                             auth_mode, username, api_key_env, ca_cert, insecure, timeout, \
                             scan_interval"
                        ),
                    });
                }
            }

            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: panwatch config init");
            } else {
                for name in cfg.profile_names() {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: config::available_profiles(&cfg),
                });
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPassword ─────────────────────────────────────────────
        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let prof = cfg
                .profiles
                .get(&profile_name)
                .ok_or_else(|| CliError::ProfileNotFound {
                    name: profile_name.clone(),
                    available: config::available_profiles(&cfg),
                })?;

            let (entry, prompt) = match prof.auth_mode {
                AuthMode::Credentials => (password_entry(&profile_name), "Password: "),
                AuthMode::ApiKey => (api_key_entry(&profile_name), "API key: "),
            };
            let secret = rpassword::prompt_password(prompt).map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(invalid("secret", "value cannot be empty"));
            }
            store_secret(&entry, &secret)?;

            eprintln!("✓ Secret stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Defaults;

    #[test]
    fn redacted_view_masks_secrets() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "edge".into(),
            Profile {
                host: "10.0.0.1".into(),
                username: Some("admin".into()),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );

        let out = format_config_redacted(&cfg);
        assert!(out.contains("[profiles.edge]"));
        assert!(out.contains("password = \"****\""));
        assert!(!out.contains("hunter2"));
        assert!(out.contains("auth_mode = \"credentials\""));
    }

    #[test]
    fn defaults_section_is_rendered() {
        let out = format_config_redacted(&Config {
            defaults: Defaults::default(),
            ..Config::default()
        });
        assert!(out.contains("scan_interval = 30"));
    }
}
