//! In-memory [`Firewall`] for tests.
//!
//! Replies to operational commands are canned per command string; rule
//! pushes edit an in-memory rulebase that the next listing returns. Every
//! call is recorded so ordering can be asserted.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use panwatch_api::{CommitOutcome, XmlResponse, op};

use crate::error::CoreError;
use crate::firewall::Firewall;
use crate::model::SecurityRule;

/// A call received by [`MockFirewall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Op(String),
    ListRules,
    Push { rule: String, disabled: bool },
    Commit { synchronous: bool },
}

/// Scriptable in-memory firewall.
#[derive(Default)]
pub struct MockFirewall {
    replies: RwLock<HashMap<String, Result<String, String>>>,
    rules: RwLock<Vec<SecurityRule>>,
    calls: RwLock<Vec<MockCall>>,
    fail_rules: RwLock<Option<String>>,
    fail_push: RwLock<Option<String>>,
    fail_commit: RwLock<Option<String>>,
}

impl MockFirewall {
    pub fn new() -> Self {
        Self::default()
    }

    /// A healthy PA-440 with two rules and a reply for every operational
    /// command a refresh issues (the advanced-routing BGP form excepted).
    pub fn with_sample_data() -> Self {
        let mut block_guest = SecurityRule::named("block-guest");
        block_guest.disabled = true;

        Self::new()
            .with_rule(SecurityRule::named("allow-dns"))
            .with_rule(block_guest)
            .with_reply(
                op::RESOURCE_MONITOR,
                "<core0>10.0</core0><core1>0.0</core1><core2>20.0</core2><core3>-5.0</core3>",
            )
            .with_reply(
                op::SYSTEM_INFO,
                "<system><hostname>edge-fw</hostname><serial>0123456789</serial>\
                 <model>PA-440</model><sw-version>11.1.2</sw-version></system>",
            )
            .with_reply(
                op::SESSION_INFO,
                "<number-of-active-sessions>1200</number-of-active-sessions>\
                 <new-connection-establish-rate>35</new-connection-establish-rate>\
                 <throughput>2500 kbps</throughput>",
            )
            .with_reply(op::SYSTEM_RESOURCES, "<mgmt-cpu>7%</mgmt-cpu>")
            .with_reply(op::ROUTING_TABLE, "<entry/><entry/><entry/>")
            .with_reply(op::BGP_PEERS, "<entry/><entry/>")
    }

    /// Reply to `cmd` with `body` wrapped in a success envelope.
    pub fn with_reply(mut self, cmd: &str, body: &str) -> Self {
        self.replies.get_mut().insert(
            cmd.to_owned(),
            Ok(format!(r#"<response status="success"><result>{body}</result></response>"#)),
        );
        self
    }

    /// Fail `cmd` with an API error carrying `message`.
    pub fn with_failure(mut self, cmd: &str, message: &str) -> Self {
        self.replies
            .get_mut()
            .insert(cmd.to_owned(), Err(message.to_owned()));
        self
    }

    pub fn with_rule(mut self, rule: SecurityRule) -> Self {
        self.rules.get_mut().push(rule);
        self
    }

    pub fn with_rules_failure(mut self, message: &str) -> Self {
        *self.fail_rules.get_mut() = Some(message.to_owned());
        self
    }

    pub fn with_push_failure(mut self, message: &str) -> Self {
        *self.fail_push.get_mut() = Some(message.to_owned());
        self
    }

    pub fn with_commit_failure(mut self, message: &str) -> Self {
        *self.fail_commit.get_mut() = Some(message.to_owned());
        self
    }

    /// Make the rulebase listing fail from now on (or recover with `None`).
    pub async fn set_rules_failure(&self, message: Option<&str>) {
        *self.fail_rules.write().await = message.map(str::to_owned);
    }

    /// Every call so far, in order.
    pub async fn calls(&self) -> Vec<MockCall> {
        self.calls.read().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    async fn record(&self, call: MockCall) {
        self.calls.write().await.push(call);
    }
}

fn api_error(message: &str) -> CoreError {
    CoreError::Api {
        message: message.to_owned(),
        code: None,
        status: None,
    }
}

#[async_trait]
impl Firewall for MockFirewall {
    async fn run_operational_command(&self, cmd: &str) -> Result<XmlResponse, CoreError> {
        self.record(MockCall::Op(cmd.to_owned())).await;
        match self.replies.read().await.get(cmd) {
            Some(Ok(body)) => Ok(XmlResponse::new(body.clone())),
            Some(Err(message)) => Err(api_error(message)),
            None => Err(api_error(&format!("no canned reply for {cmd}"))),
        }
    }

    async fn list_security_rules(&self) -> Result<Vec<SecurityRule>, CoreError> {
        self.record(MockCall::ListRules).await;
        if let Some(message) = self.fail_rules.read().await.as_deref() {
            return Err(api_error(message));
        }
        Ok(self.rules.read().await.clone())
    }

    async fn push_rule(&self, rule: &SecurityRule) -> Result<(), CoreError> {
        self.record(MockCall::Push {
            rule: rule.name.clone(),
            disabled: rule.disabled,
        })
        .await;
        if let Some(message) = self.fail_push.read().await.as_deref() {
            return Err(api_error(message));
        }
        for stored in self.rules.write().await.iter_mut() {
            if stored.name == rule.name {
                stored.disabled = rule.disabled;
            }
        }
        Ok(())
    }

    async fn commit(&self, synchronous: bool) -> Result<CommitOutcome, CoreError> {
        self.record(MockCall::Commit { synchronous }).await;
        if let Some(message) = self.fail_commit.read().await.as_deref() {
            return Err(CoreError::CommitFailed {
                job_id: 1,
                details: message.to_owned(),
            });
        }
        Ok(CommitOutcome::Completed {
            job_id: 1,
            details: "Configuration committed successfully".into(),
        })
    }
}
