// ── Runtime connection configuration ──
//
// These types describe *how* to reach one firewall. They carry credential
// data and polling cadence but never touch disk; the CLI builds a
// `FirewallConfig` from its profile and hands it in.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::CoreError;

/// Default HTTPS management port.
pub const DEFAULT_PORT: u16 = 443;
/// Default virtual system.
pub const DEFAULT_VSYS: &str = "vsys1";
/// Default seconds between periodic refreshes.
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 30;
/// Smallest accepted refresh interval.
pub const MIN_SCAN_INTERVAL_SECS: u64 = 10;

/// How to authenticate against the XML API.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Pre-generated API key, sent as-is.
    ApiKey(SecretString),
    /// Administrator credentials exchanged for a key on connect.
    Credentials {
        username: String,
        password: SecretString,
    },
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed management certificates).
    DangerAcceptInvalid,
}

/// Configuration for one firewall connection.
#[derive(Debug, Clone)]
pub struct FirewallConfig {
    /// Management hostname or IP address, without scheme.
    pub host: String,
    pub port: u16,
    pub auth: AuthCredentials,
    /// Virtual system whose security rulebase is exposed.
    pub vsys: String,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Seconds between periodic refreshes. 0 disables the refresh task.
    pub scan_interval_secs: u64,
    /// Upper bound on how long a synchronous commit may take.
    pub commit_timeout: Duration,
}

impl FirewallConfig {
    /// Config with defaults for everything but the host and credentials.
    pub fn new(host: impl Into<String>, auth: AuthCredentials) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            auth,
            vsys: DEFAULT_VSYS.into(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            commit_timeout: Duration::from_secs(600),
        }
    }

    /// Reject configurations that cannot work.
    ///
    /// A scan interval of 0 (periodic refresh off) is allowed; anything
    /// else must be at least [`MIN_SCAN_INTERVAL_SECS`].
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.host.trim().is_empty() {
            return Err(CoreError::Config {
                message: "host must not be empty".into(),
            });
        }
        if self.port == 0 {
            return Err(CoreError::Config {
                message: "port must be non-zero".into(),
            });
        }
        if self.vsys.trim().is_empty() {
            return Err(CoreError::Config {
                message: "vsys must not be empty".into(),
            });
        }
        if self.scan_interval_secs != 0 && self.scan_interval_secs < MIN_SCAN_INTERVAL_SECS {
            return Err(CoreError::Config {
                message: format!(
                    "scan interval {}s is below the minimum of {MIN_SCAN_INTERVAL_SECS}s",
                    self.scan_interval_secs
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FirewallConfig {
        FirewallConfig::new(
            "fw.example.net",
            AuthCredentials::ApiKey(SecretString::from("k".to_string())),
        )
    }

    #[test]
    fn defaults() {
        let cfg = config();
        assert_eq!(cfg.port, 443);
        assert_eq!(cfg.vsys, "vsys1");
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
        assert_eq!(cfg.scan_interval_secs, 30);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn scan_interval_below_minimum_is_rejected() {
        let mut cfg = config();
        cfg.scan_interval_secs = 5;
        assert!(matches!(cfg.validate(), Err(CoreError::Config { .. })));
        cfg.scan_interval_secs = 10;
        assert!(cfg.validate().is_ok());
        cfg.scan_interval_secs = 0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_host_is_rejected() {
        let mut cfg = config();
        cfg.host = "  ".into();
        assert!(cfg.validate().is_err());
    }
}
