//! Async client for the PAN-OS XML management API.
//!
//! Covers the small slice of the API that monitoring and rule toggling need:
//!
//! - **Key generation** ([`XmlApiClient::login`]) exchanges a username and
//!   password for an API key, sent as `X-PAN-KEY` on every later request.
//! - **Operational commands** ([`XmlApiClient::op`]) send a `<show>...</show>`
//!   command verbatim and hand back the raw [`XmlResponse`].
//! - **Security rules** ([`XmlApiClient::list_security_rules`],
//!   [`XmlApiClient::set_rule_disabled`]) read and edit the candidate
//!   configuration of one virtual system.
//! - **Commit** ([`XmlApiClient::commit`]) enqueues a commit job and, when
//!   asked, polls the job until the device reports it finished.

pub mod auth;
pub mod client;
pub mod commit;
pub mod error;
pub mod models;
pub mod op;
pub mod rules;
pub mod transport;

pub use client::XmlApiClient;
pub use commit::CommitOutcome;
pub use error::Error;
pub use models::{RuleEntry, XmlResponse};
pub use transport::{TlsMode, TransportConfig};
