// ── Firewall handle ──
//
// The seam between the refresh/toggle routines and the device. The
// routines only ever talk to `dyn Firewall`; `XmlFirewall` is the
// production implementation over the XML API client.

use async_trait::async_trait;
use tracing::{debug, info};

use panwatch_api::transport::{TlsMode, TransportConfig};
use panwatch_api::{CommitOutcome, XmlApiClient, XmlResponse};

use crate::config::{AuthCredentials, FirewallConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::SecurityRule;

/// Operations the core needs from one firewall.
///
/// Implementations are used by exactly one controller at a time; calls
/// are never issued concurrently for the same handle.
#[async_trait]
pub trait Firewall: Send + Sync {
    /// Send an operational command verbatim and return the reply.
    async fn run_operational_command(&self, cmd: &str) -> Result<XmlResponse, CoreError>;

    /// Fetch the security rulebase of the configured virtual system, in
    /// rulebase order.
    async fn list_security_rules(&self) -> Result<Vec<SecurityRule>, CoreError>;

    /// Write the rule's `disabled` flag to the candidate configuration.
    async fn push_rule(&self, rule: &SecurityRule) -> Result<(), CoreError>;

    /// Commit the candidate configuration, optionally waiting for the job.
    async fn commit(&self, synchronous: bool) -> Result<CommitOutcome, CoreError>;
}

// ── XmlFirewall ──────────────────────────────────────────────────

/// [`Firewall`] backed by the PAN-OS XML API.
pub struct XmlFirewall {
    client: XmlApiClient,
    vsys: String,
}

impl XmlFirewall {
    /// Build the client for `config` and authenticate it.
    pub async fn connect(config: &FirewallConfig) -> Result<Self, CoreError> {
        let base_url = XmlApiClient::endpoint_url(&config.host, config.port)?;
        let transport = build_transport(config);
        let client = XmlApiClient::new(base_url, &transport)?;

        match &config.auth {
            AuthCredentials::ApiKey(key) => {
                client.set_api_key(key.clone());
                debug!("using configured API key");
            }
            AuthCredentials::Credentials { username, password } => {
                client.login(username, password).await?;
                info!(host = %config.host, "API key generated");
            }
        }

        Ok(Self::from_client(client, config.vsys.clone()))
    }

    /// Wrap an already-authenticated client.
    pub fn from_client(client: XmlApiClient, vsys: impl Into<String>) -> Self {
        Self {
            client,
            vsys: vsys.into(),
        }
    }

    pub fn client(&self) -> &XmlApiClient {
        &self.client
    }

    pub fn vsys(&self) -> &str {
        &self.vsys
    }
}

#[async_trait]
impl Firewall for XmlFirewall {
    async fn run_operational_command(&self, cmd: &str) -> Result<XmlResponse, CoreError> {
        Ok(self.client.op(cmd).await?)
    }

    async fn list_security_rules(&self) -> Result<Vec<SecurityRule>, CoreError> {
        let entries = self.client.list_security_rules(&self.vsys).await?;
        Ok(entries.into_iter().map(SecurityRule::from).collect())
    }

    async fn push_rule(&self, rule: &SecurityRule) -> Result<(), CoreError> {
        self.client
            .set_rule_disabled(&self.vsys, &rule.name, rule.disabled)
            .await?;
        Ok(())
    }

    async fn commit(&self, synchronous: bool) -> Result<CommitOutcome, CoreError> {
        Ok(self.client.commit(synchronous).await?)
    }
}

// ── Helpers ──────────────────────────────────────────────────────

/// Build a [`TransportConfig`] from the firewall configuration.
fn build_transport(config: &FirewallConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        commit_timeout: config.commit_timeout,
        ..TransportConfig::default()
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;

    #[test]
    fn transport_carries_tls_and_timeouts() {
        let mut config = FirewallConfig::new(
            "fw",
            AuthCredentials::ApiKey(SecretString::from("k".to_string())),
        );
        config.tls = TlsVerification::DangerAcceptInvalid;
        config.timeout = Duration::from_secs(5);
        config.commit_timeout = Duration::from_secs(90);

        let transport = build_transport(&config);
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert_eq!(transport.commit_timeout, Duration::from_secs(90));
        assert_eq!(transport.commit_poll_interval, Duration::from_secs(2));
    }
}
