// Operational commands
//
// `type=op` sends an XML command verbatim. Replies differ across PAN-OS
// versions and routing modes, so they are returned untyped and scanned
// by the caller.

use tracing::debug;

use crate::client::XmlApiClient;
use crate::error::Error;
use crate::models::XmlResponse;

/// Per-second dataplane resource monitor.
pub const RESOURCE_MONITOR: &str =
    "<show><running><resource-monitor><second/></resource-monitor></running></show>";
/// Hostname, serial, model, software version, uptime, ...
pub const SYSTEM_INFO: &str = "<show><system><info/></system></show>";
/// Session table summary (active sessions, cps, throughput).
pub const SESSION_INFO: &str = "<show><session><info/></session></show>";
/// Management-plane `top` style resource output.
pub const SYSTEM_RESOURCES: &str = "<show><system><resources/></system></show>";
/// Legacy routing engine route table.
pub const ROUTING_TABLE: &str = "<show><routing><route/></routing></show>";
/// Legacy routing engine BGP peers.
pub const BGP_PEERS: &str = "<show><routing><protocol><bgp><peer/></bgp></protocol></routing></show>";
/// Advanced routing engine BGP peer summary.
pub const BGP_PEERS_ADVANCED: &str =
    "<show><advanced-routing><bgp><peer><summary/></peer></bgp></advanced-routing></show>";

impl XmlApiClient {
    /// Run an operational command.
    ///
    /// `POST /api/` with `type=op&cmd={cmd}`
    pub async fn op(&self, cmd: &str) -> Result<XmlResponse, Error> {
        debug!(cmd, "running operational command");
        self.request(&[("type", "op"), ("cmd", cmd)]).await
    }

    /// Poll a job by id.
    ///
    /// `<show><jobs><id>{id}</id></jobs></show>`
    pub async fn show_job(&self, job_id: u64) -> Result<XmlResponse, Error> {
        let cmd = format!("<show><jobs><id>{job_id}</id></jobs></show>");
        self.op(&cmd).await
    }
}
