#![allow(clippy::unwrap_used)]
// Refresh and toggle routines against the in-memory firewall.

use pretty_assertions::assert_eq;

use panwatch_api::op;
use panwatch_core::testing::{MockCall, MockFirewall};
use panwatch_core::{CommitOutcome, CoreError, Metric, SecurityRule, refresh, set_rule_disabled};

fn approx(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|a| (a - b).abs() < f64::EPSILON)
}

// ── Refresh tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_healthy_refresh() {
    let fw = MockFirewall::with_sample_data();
    let snap = refresh(&fw).await.unwrap();

    assert_eq!(snap.rules.len(), 2);
    assert!(snap.rules["block-guest"].disabled);
    assert!(approx(snap.dataplane_cpu_percent, 15.0));
    assert_eq!(snap.management_cpu_percent, Some(7));
    assert_eq!(snap.concurrent_connections, 1200);
    assert_eq!(snap.connections_per_second, 35);
    assert_eq!(snap.total_throughput_kbps, 2500);
    assert_eq!(snap.number_of_routes, 3);
    assert_eq!(snap.bgp_peers, 2);
    assert_eq!(
        snap.system_info.get("sw_version").map(String::as_str),
        Some("11.1.2")
    );
    assert!(snap.errors.is_empty(), "unexpected errors: {:?}", snap.errors);
}

#[tokio::test]
async fn test_commands_issued_in_order() {
    let fw = MockFirewall::with_sample_data();
    refresh(&fw).await.unwrap();

    let calls = fw.calls().await;
    assert_eq!(
        calls,
        vec![
            MockCall::ListRules,
            MockCall::Op(op::RESOURCE_MONITOR.into()),
            MockCall::Op(op::SYSTEM_INFO.into()),
            MockCall::Op(op::SESSION_INFO.into()),
            MockCall::Op(op::SYSTEM_RESOURCES.into()),
            MockCall::Op(op::ROUTING_TABLE.into()),
            MockCall::Op(op::BGP_PEERS.into()),
        ]
    );
}

#[tokio::test]
async fn test_rule_listing_failure_is_fatal() {
    let fw = MockFirewall::with_sample_data().with_rules_failure("xpath error");
    let err = refresh(&fw).await.unwrap_err();
    assert!(matches!(err, CoreError::RefreshFailed { .. }), "got: {err:?}");
    // Nothing else is attempted once the rulebase read fails.
    assert_eq!(fw.calls().await, vec![MockCall::ListRules]);
}

#[tokio::test]
async fn test_failed_metric_degrades_alone() {
    let healthy = refresh(&MockFirewall::with_sample_data()).await.unwrap();

    let fw = MockFirewall::with_sample_data().with_failure(op::RESOURCE_MONITOR, "timeout");
    let snap = refresh(&fw).await.unwrap();

    assert_eq!(snap.dataplane_cpu_percent, None);
    assert!(snap.is_degraded(Metric::DataplaneCpu));
    assert_eq!(snap.errors.len(), 1);

    assert_eq!(snap.rules, healthy.rules);
    assert_eq!(snap.system_info, healthy.system_info);
    assert_eq!(snap.concurrent_connections, healthy.concurrent_connections);
    assert_eq!(snap.management_cpu_percent, healthy.management_cpu_percent);
    assert_eq!(snap.number_of_routes, healthy.number_of_routes);
    assert_eq!(snap.bgp_peers, healthy.bgp_peers);
}

#[tokio::test]
async fn test_every_sentinel() {
    let fw = MockFirewall::with_sample_data()
        .with_failure(op::RESOURCE_MONITOR, "x")
        .with_failure(op::SYSTEM_INFO, "x")
        .with_failure(op::SESSION_INFO, "x")
        .with_failure(op::SYSTEM_RESOURCES, "x")
        .with_failure(op::ROUTING_TABLE, "x")
        .with_failure(op::BGP_PEERS, "x");
    let snap = refresh(&fw).await.unwrap();

    assert_eq!(snap.rules.len(), 2);
    assert_eq!(snap.dataplane_cpu_percent, None);
    assert!(snap.system_info.is_empty());
    assert_eq!(snap.concurrent_connections, 0);
    assert_eq!(snap.connections_per_second, 0);
    assert_eq!(snap.total_throughput_kbps, 0);
    assert_eq!(snap.management_cpu_percent, None);
    assert_eq!(snap.number_of_routes, 0);
    assert_eq!(snap.bgp_peers, 0);
    assert_eq!(snap.errors.len(), 6);
}

#[tokio::test]
async fn test_missing_active_sessions_is_zero() {
    let fw = MockFirewall::with_sample_data().with_reply(
        op::SESSION_INFO,
        "<cps>12</cps><kbps>800</kbps>",
    );
    let snap = refresh(&fw).await.unwrap();

    assert_eq!(snap.concurrent_connections, 0);
    assert_eq!(snap.connections_per_second, 12);
    assert_eq!(snap.total_throughput_kbps, 800);
    assert!(!snap.is_degraded(Metric::SessionInfo));
}

#[tokio::test]
async fn test_no_active_cores_is_zero_not_none() {
    let fw = MockFirewall::with_sample_data()
        .with_reply(op::RESOURCE_MONITOR, "<core0>0</core0><core1>0</core1>");
    let snap = refresh(&fw).await.unwrap();
    assert!(approx(snap.dataplane_cpu_percent, 0.0));
}

#[tokio::test]
async fn test_exponent_core_loads_are_skipped() {
    let fw = MockFirewall::with_sample_data()
        .with_reply(op::RESOURCE_MONITOR, "<core0>1e2</core0><core1>20.0</core1>");
    let snap = refresh(&fw).await.unwrap();
    assert!(approx(snap.dataplane_cpu_percent, 20.0));
}

#[tokio::test]
async fn test_resources_without_cpu_tag_is_zero() {
    let fw = MockFirewall::with_sample_data().with_reply(
        op::SYSTEM_RESOURCES,
        "top - 10:00:00 up 1 day, load average: 0.1",
    );
    let snap = refresh(&fw).await.unwrap();

    assert_eq!(snap.management_cpu_percent, Some(0));
    assert!(snap.errors.is_empty(), "unexpected errors: {:?}", snap.errors);
}

#[tokio::test]
async fn test_unparsable_management_cpu_degrades() {
    let fw = MockFirewall::with_sample_data()
        .with_reply(op::SYSTEM_RESOURCES, "<mgmt-cpu>high</mgmt-cpu>");
    let snap = refresh(&fw).await.unwrap();

    assert_eq!(snap.management_cpu_percent, None);
    assert!(snap.is_degraded(Metric::ManagementCpu));
    assert_eq!(snap.errors.len(), 1);
    assert!(snap.errors[0].message.contains("high"), "got: {:?}", snap.errors[0]);
}

#[tokio::test]
async fn test_bgp_falls_back_to_advanced_routing() {
    let fw = MockFirewall::with_sample_data()
        .with_failure(op::BGP_PEERS, "show -> routing is unexpected")
        .with_reply(
            op::BGP_PEERS_ADVANCED,
            "<entry><peer>a</peer></entry><entry><peer>b</peer></entry><entry><peer>c</peer></entry>",
        );
    let snap = refresh(&fw).await.unwrap();

    assert_eq!(snap.bgp_peers, 3);
    assert!(!snap.is_degraded(Metric::BgpPeers));

    let calls = fw.calls().await;
    let primary = calls
        .iter()
        .position(|c| *c == MockCall::Op(op::BGP_PEERS.into()))
        .unwrap();
    let fallback = calls
        .iter()
        .position(|c| *c == MockCall::Op(op::BGP_PEERS_ADVANCED.into()))
        .unwrap();
    assert!(primary < fallback);
}

#[tokio::test]
async fn test_bgp_both_forms_fail() {
    // The sample data has no advanced-routing reply.
    let fw = MockFirewall::with_sample_data().with_failure(op::BGP_PEERS, "unsupported");
    let snap = refresh(&fw).await.unwrap();

    assert_eq!(snap.bgp_peers, 0);
    assert!(snap.is_degraded(Metric::BgpPeers));
}

#[tokio::test]
async fn test_duplicate_rule_names_last_wins() {
    let mut second = SecurityRule::named("dup");
    second.disabled = true;
    let fw = MockFirewall::with_sample_data()
        .with_rule(SecurityRule::named("dup"))
        .with_rule(second);

    let snap = refresh(&fw).await.unwrap();
    assert_eq!(snap.rules.len(), 3);
    assert!(snap.rules["dup"].disabled);
}

// ── Toggle tests ────────────────────────────────────────────────────

#[tokio::test]
async fn test_toggle_unknown_rule_issues_nothing() {
    let fw = MockFirewall::with_sample_data();
    let snap = refresh(&fw).await.unwrap();
    fw.clear_calls().await;

    let err = set_rule_disabled(&fw, &snap, "nonexistent", true)
        .await
        .unwrap_err();

    assert!(
        matches!(err, CoreError::RuleNotFound { ref name } if name == "nonexistent"),
        "got: {err:?}"
    );
    assert!(fw.calls().await.is_empty());
}

#[tokio::test]
async fn test_toggle_pushes_then_commits_once() {
    let fw = MockFirewall::with_sample_data();
    let snap = refresh(&fw).await.unwrap();
    fw.clear_calls().await;

    let outcome = set_rule_disabled(&fw, &snap, "allow-dns", true).await.unwrap();

    assert!(matches!(outcome, CommitOutcome::Completed { .. }));
    assert_eq!(
        fw.calls().await,
        vec![
            MockCall::Push {
                rule: "allow-dns".into(),
                disabled: true,
            },
            MockCall::Commit { synchronous: true },
        ]
    );
    // The cached snapshot is left alone.
    assert!(!snap.rules["allow-dns"].disabled);
}

#[tokio::test]
async fn test_toggle_push_failure_skips_commit() {
    let fw = MockFirewall::with_sample_data().with_push_failure("locked by admin");
    let snap = refresh(&fw).await.unwrap();
    fw.clear_calls().await;

    let err = set_rule_disabled(&fw, &snap, "allow-dns", true)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Api { .. }), "got: {err:?}");
    assert_eq!(fw.calls().await.len(), 1);
}

#[tokio::test]
async fn test_toggle_commit_failure_propagates() {
    let fw = MockFirewall::with_sample_data().with_commit_failure("validation error");
    let snap = refresh(&fw).await.unwrap();

    let err = set_rule_disabled(&fw, &snap, "block-guest", false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::CommitFailed { .. }), "got: {err:?}");
}
