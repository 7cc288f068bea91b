// ── Rule toggle routine ──
//
// Enable or disable one security rule: edit the candidate configuration,
// then commit synchronously. The snapshot is never modified here; the
// caller refreshes once this returns.

use tracing::info;

use panwatch_api::CommitOutcome;

use crate::error::CoreError;
use crate::firewall::Firewall;
use crate::model::Snapshot;

/// Set `disabled` on the rule named `name` and commit.
///
/// The rule must be present in `snapshot`; otherwise this fails with
/// [`CoreError::RuleNotFound`] without touching the device. Push and
/// commit failures propagate as-is; nothing is rolled back.
pub async fn set_rule_disabled(
    fw: &dyn Firewall,
    snapshot: &Snapshot,
    name: &str,
    disabled: bool,
) -> Result<CommitOutcome, CoreError> {
    let mut rule = snapshot
        .rule(name)
        .cloned()
        .ok_or_else(|| CoreError::RuleNotFound { name: name.into() })?;

    rule.disabled = disabled;
    fw.push_rule(&rule).await?;
    let outcome = fw.commit(true).await?;

    info!(rule = name, disabled, ?outcome, "rule state committed");
    Ok(outcome)
}
