//! Shared configuration for the panwatch tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `panwatch_core::FirewallConfig`. The CLI layers its flag
//! overrides on top.

use std::collections::HashMap;
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

use panwatch_core::config::{DEFAULT_PORT, DEFAULT_SCAN_INTERVAL_SECS, DEFAULT_VSYS};
use panwatch_core::{AuthCredentials, CoreError, FirewallConfig, TlsVerification};

/// Service name for secrets stored in the system keyring.
pub const KEYRING_SERVICE: &str = "panwatch";
/// Environment variable consulted first for the admin password.
pub const PASSWORD_ENV: &str = "PANWATCH_PASSWORD";
/// Environment variable consulted when a profile has no username.
pub const USERNAME_ENV: &str = "PANWATCH_USERNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error(transparent)]
    Firewall(#[from] CoreError),

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

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named firewall profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }

    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between refreshes in watch mode.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            scan_interval: default_scan_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL_SECS
}

/// How a profile authenticates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthMode {
    /// Username and password, exchanged for a key on connect.
    #[default]
    Credentials,
    /// Pre-generated API key.
    ApiKey,
}

/// A named firewall profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Management hostname or IP, without scheme.
    pub host: String,

    pub port: Option<u16>,

    /// Virtual system, `vsys1` when unset.
    pub vsys: Option<String>,

    #[serde(default)]
    pub auth_mode: AuthMode,

    pub username: Option<String>,

    /// Plaintext password (prefer keyring or env var).
    pub password: Option<String>,

    /// Plaintext API key (prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name holding the API key.
    pub api_key_env: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Skip certificate verification.
    pub insecure: Option<bool>,

    pub timeout: Option<u64>,

    pub scan_interval: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "panwatch", "panwatch").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("panwatch");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` plus environment.
///
/// Layers: built-in defaults, then the TOML file (if present), then
/// `PANWATCH_`-prefixed variables with `__` as the nesting separator
/// (`PANWATCH_DEFAULTS__TIMEOUT=10`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PANWATCH_").split("__"))
        .extract()?;
    Ok(config)
}

/// Load config, returning the default if it is missing or unreadable.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Write the config to the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Keyring entry name for a profile's password.
pub fn password_entry(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Keyring entry name for a profile's API key.
pub fn api_key_entry(profile_name: &str) -> String {
    format!("{profile_name}/api-key")
}

/// Store a secret in the system keyring.
pub fn store_secret(entry_name: &str, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, entry_name)?.set_password(secret)?;
    Ok(())
}

fn keyring_secret(entry_name: &str) -> Option<SecretString> {
    keyring::Entry::new(KEYRING_SERVICE, entry_name)
        .and_then(|entry| entry.get_password())
        .ok()
        .map(SecretString::from)
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an API key: the profile's env var, then keyring, then plaintext.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(val) = profile
        .api_key_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Ok(SecretString::from(val));
    }

    if let Some(secret) = keyring_secret(&api_key_entry(profile_name)) {
        return Ok(secret);
    }

    profile
        .api_key
        .clone()
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve username and password.
///
/// The username comes from the profile or `PANWATCH_USERNAME`; the
/// password from `PANWATCH_PASSWORD`, then keyring, then plaintext.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };

    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .ok_or_else(no_credentials)?;

    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok((username, SecretString::from(pw)));
    }

    if let Some(pw) = keyring_secret(&password_entry(profile_name)) {
        return Ok((username, pw));
    }

    let password = profile.password.clone().ok_or_else(no_credentials)?;
    Ok((username, SecretString::from(password)))
}

/// Resolve `AuthCredentials` according to the profile's `auth_mode`.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    match profile.auth_mode {
        AuthMode::ApiKey => Ok(AuthCredentials::ApiKey(resolve_api_key(
            profile,
            profile_name,
        )?)),
        AuthMode::Credentials => {
            let (username, password) = resolve_credentials(profile, profile_name)?;
            Ok(AuthCredentials::Credentials { username, password })
        }
    }
}

/// TLS mode for a profile. `insecure` wins over a custom CA.
pub fn tls_for(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca) = profile.ca_cert {
        TlsVerification::CustomCa(ca.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a validated `FirewallConfig` from a profile, no flag overrides.
pub fn profile_to_firewall_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<FirewallConfig, ConfigError> {
    let host = profile.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("profile '{profile_name}' has no host"),
        });
    }

    let auth = resolve_auth(profile, profile_name)?;
    firewall_config(profile, auth, defaults)
}

/// Build a validated `FirewallConfig` from a profile with credentials
/// already resolved.
pub fn firewall_config(
    profile: &Profile,
    auth: AuthCredentials,
    defaults: &Defaults,
) -> Result<FirewallConfig, ConfigError> {
    let mut config = FirewallConfig::new(profile.host.trim(), auth);
    config.port = profile.port.unwrap_or(DEFAULT_PORT);
    config.vsys = profile.vsys.clone().unwrap_or_else(|| DEFAULT_VSYS.into());
    config.tls = tls_for(profile, defaults);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.scan_interval_secs = profile.scan_interval.unwrap_or(defaults.scan_interval);

    config.validate()?;
    Ok(config)
}
