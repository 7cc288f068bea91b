// ── API-to-domain type conversions ──
//
// Bridges raw `panwatch_api` types into `panwatch_core::model` types.

use panwatch_api::RuleEntry;

use crate::model::{RuleAction, SecurityRule};

impl From<RuleEntry> for SecurityRule {
    fn from(entry: RuleEntry) -> Self {
        Self {
            name: entry.name,
            uuid: entry.uuid,
            disabled: entry.disabled,
            action: entry.action.map_or(RuleAction::Unknown, RuleAction::from),
            from_zones: entry.from,
            to_zones: entry.to,
            source: entry.source,
            destination: entry.destination,
            application: entry.application,
            service: entry.service,
            description: entry.description,
            tags: entry.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_entry_maps_zones_and_action() {
        let entry = RuleEntry {
            name: "allow-web".into(),
            disabled: true,
            action: Some("allow".into()),
            from: vec!["trust".into()],
            to: vec!["untrust".into()],
            ..RuleEntry::default()
        };
        let rule = SecurityRule::from(entry);
        assert_eq!(rule.name, "allow-web");
        assert!(rule.disabled);
        assert_eq!(rule.action, RuleAction::Allow);
        assert_eq!(rule.from_zones, vec!["trust"]);
        assert_eq!(rule.to_zones, vec!["untrust"]);
    }

    #[test]
    fn missing_action_is_unknown() {
        let rule = SecurityRule::from(RuleEntry {
            name: "r".into(),
            ..RuleEntry::default()
        });
        assert_eq!(rule.action, RuleAction::Unknown);
    }
}
