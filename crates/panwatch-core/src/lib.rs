//! Monitoring and rule control for PAN-OS firewalls, on top of `panwatch-api`.
//!
//! - **[`refresh()`]**: Issues the operational commands, scans the replies
//!   defensively, and folds them into one [`Snapshot`]. Only the rulebase
//!   read is fatal; every other metric degrades to a sentinel and is noted
//!   in [`Snapshot::errors`].
//!
//! - **[`set_rule_disabled()`]**: Flips one rule in the candidate
//!   configuration and commits synchronously.
//!
//! - **[`Controller`]**: Owns one firewall handle: connects, runs the
//!   periodic refresh, serializes rule changes through a command queue,
//!   and publishes snapshots via the [`SnapshotStore`].
//!
//! - **[`DeviceRegistry`]**: Running controllers keyed by device serial.
//!
//! - **[`entity`]**: Sensor and switch views over a snapshot.
//!
//! The device is reached through the [`Firewall`] trait; [`XmlFirewall`]
//! implements it over the XML API. With the `testing` feature,
//! `testing::MockFirewall` implements it in memory.

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod entity;
pub mod error;
pub mod extract;
pub mod firewall;
pub mod model;
pub mod refresh;
pub mod registry;
pub mod store;
pub mod stream;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod toggle;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{AuthCredentials, FirewallConfig, TlsVerification};
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use firewall::{Firewall, XmlFirewall};
pub use model::{DeviceIdentity, FetchError, Metric, RuleAction, SecurityRule, Snapshot};
pub use refresh::refresh;
pub use registry::DeviceRegistry;
pub use store::SnapshotStore;
pub use stream::SnapshotStream;
pub use toggle::set_rule_disabled;

pub use panwatch_api::CommitOutcome;
