// ── Refresh routine ──
//
// One pass over the firewall producing a complete `Snapshot`. Only the
// rulebase read is fatal; every other sub-fetch degrades to its sentinel,
// records a `FetchError`, and leaves its siblings alone.

use chrono::Utc;
use roxmltree::Document;
use tracing::{debug, info, trace, warn};

use panwatch_api::op;

use crate::error::CoreError;
use crate::extract::{self, ACTIVE_SESSIONS, CONNECTION_RATE, FieldSpec, THROUGHPUT_KBPS};
use crate::firewall::Firewall;
use crate::model::{FetchError, Metric, Snapshot};

/// Session counters in snapshot order: active, cps, kbps.
const SESSION_FIELDS: [&FieldSpec; 3] = [&ACTIVE_SESSIONS, &CONNECTION_RATE, &THROUGHPUT_KBPS];

/// Build a fresh snapshot.
///
/// Fails with [`CoreError::RefreshFailed`] only when the security rules
/// cannot be listed.
pub async fn refresh(fw: &dyn Firewall) -> Result<Snapshot, CoreError> {
    let rules = fw
        .list_security_rules()
        .await
        .map_err(|e| CoreError::RefreshFailed {
            message: format!("listing security rules: {e}"),
        })?;

    let mut snap = Snapshot {
        rules: rules.into_iter().map(|r| (r.name.clone(), r)).collect(),
        refreshed_at: Utc::now(),
        ..Snapshot::default()
    };
    debug!(rules = snap.rules.len(), "security rules loaded");
    let errors = &mut snap.errors;

    snap.dataplane_cpu_percent = degrade(
        errors,
        Metric::DataplaneCpu,
        read(fw, op::RESOURCE_MONITOR, extract::dataplane_cpu).await,
    );

    snap.system_info = degrade(
        errors,
        Metric::SystemInfo,
        read(fw, op::SYSTEM_INFO, extract::system_info).await,
    )
    .unwrap_or_default();

    let [active, cps, kbps] = degrade(
        errors,
        Metric::SessionInfo,
        read(fw, op::SESSION_INFO, session_counters).await,
    )
    .unwrap_or_else(|| SESSION_FIELDS.map(|spec| spec.sentinel));
    snap.concurrent_connections = active;
    snap.connections_per_second = cps;
    snap.total_throughput_kbps = kbps;

    snap.management_cpu_percent = degrade(
        errors,
        Metric::ManagementCpu,
        read(fw, op::SYSTEM_RESOURCES, extract::management_cpu)
            .await
            .and_then(|cpu| {
                cpu.map_err(|e| CoreError::Internal(format!("unparsable management CPU reading ({e:?})")))
            }),
    );

    snap.number_of_routes = degrade(
        errors,
        Metric::Routes,
        read(fw, op::ROUTING_TABLE, extract::count_entries).await,
    )
    .unwrap_or(0);

    let bgp = match read(fw, op::BGP_PEERS, extract::count_entries).await {
        Ok(peers) => Ok(peers),
        Err(e) => {
            debug!(error = %e, "BGP peer command failed, trying advanced routing form");
            read(fw, op::BGP_PEERS_ADVANCED, extract::count_entries).await
        }
    };
    snap.bgp_peers = degrade(errors, Metric::BgpPeers, bgp).unwrap_or(0);

    info!(
        rules = snap.rules.len(),
        dataplane_cpu = ?snap.dataplane_cpu_percent,
        management_cpu = ?snap.management_cpu_percent,
        sessions = snap.concurrent_connections,
        cps = snap.connections_per_second,
        kbps = snap.total_throughput_kbps,
        routes = snap.number_of_routes,
        bgp_peers = snap.bgp_peers,
        degraded = snap.errors.len(),
        "refresh complete"
    );
    Ok(snap)
}

/// Run `cmd` and apply `scan` to the parsed reply.
async fn read<T>(
    fw: &dyn Firewall,
    cmd: &str,
    scan: impl FnOnce(&Document<'_>) -> T,
) -> Result<T, CoreError> {
    let resp = fw.run_operational_command(cmd).await?;
    trace!(cmd, raw = extract::preview(resp.body()), "operational reply");
    let doc = resp.document()?;
    Ok(scan(&doc))
}

/// Keep the value, or log and record the failure and yield `None`.
fn degrade<T>(
    errors: &mut Vec<FetchError>,
    metric: Metric,
    result: Result<T, CoreError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(%metric, error = %e, "fetch failed, using fallback value");
            errors.push(FetchError {
                metric,
                message: e.to_string(),
            });
            None
        }
    }
}

fn session_counters(doc: &Document<'_>) -> [u64; 3] {
    SESSION_FIELDS.map(|spec| {
        spec.lookup(doc).unwrap_or_else(|e| {
            debug!(field = spec.name, reason = ?e, "session field unavailable");
            spec.sentinel
        })
    })
}
