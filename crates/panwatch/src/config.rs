//! CLI configuration: thin wrapper around `panwatch_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--host, --api-key, --insecure, ...).

use secrecy::SecretString;

use panwatch_core::{AuthCredentials, FirewallConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use panwatch_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let names = config.profile_names();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build a `FirewallConfig` from the config file, profile, and flags.
pub fn build_firewall_config(global: &GlobalOpts) -> Result<FirewallConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    match cfg.profiles.get(&profile_name) {
        Some(profile) => resolve_profile(profile, &profile_name, &cfg.defaults, global),
        // An explicitly named profile must exist.
        None if global.profile.is_some() => Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        }),
        None => {
            if global.host.is_none() {
                return Err(CliError::NoConfig {
                    path: config_path().display().to_string(),
                });
            }
            resolve_profile(&Profile::default(), &profile_name, &cfg.defaults, global)
        }
    }
}

/// Translate a `Profile` plus global flags into a `FirewallConfig`.
///
/// Flags take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<FirewallConfig, CliError> {
    let mut profile = profile.clone();
    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if global.port.is_some() {
        profile.port = global.port;
    }
    if global.vsys.is_some() {
        profile.vsys.clone_from(&global.vsys);
    }
    if global.username.is_some() {
        profile.username.clone_from(&global.username);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }

    if profile.host.trim().is_empty() {
        return Err(CliError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }

    let auth = match global.api_key {
        Some(ref key) => AuthCredentials::ApiKey(SecretString::from(key.clone())),
        None => panwatch_config::resolve_auth(&profile, profile_name)?,
    };

    Ok(panwatch_config::firewall_config(&profile, auth, defaults)?)
}

/// Watch mode: the requested interval, or the profile's.
pub fn for_watch(mut config: FirewallConfig, interval: Option<u64>) -> FirewallConfig {
    if let Some(secs) = interval {
        config.scan_interval_secs = secs;
    }
    config
}
