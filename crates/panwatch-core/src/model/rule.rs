// ── Security rule domain types ──

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// What a security rule does with matching traffic.
#[derive(Debug, Clone, PartialEq, Eq, Default, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(into = "String", from = "String")]
pub enum RuleAction {
    Allow,
    Deny,
    Drop,
    ResetClient,
    ResetServer,
    ResetBoth,
    /// Missing `<action>` element.
    #[default]
    Unknown,
    /// Any action this build does not know about, kept verbatim.
    #[strum(default)]
    Other(String),
}

impl RuleAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Drop => "drop",
            Self::ResetClient => "reset-client",
            Self::ResetServer => "reset-server",
            Self::ResetBoth => "reset-both",
            Self::Unknown => "unknown",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RuleAction> for String {
    fn from(action: RuleAction) -> Self {
        action.as_str().to_owned()
    }
}

impl From<String> for RuleAction {
    fn from(raw: String) -> Self {
        // `Other` is the strum default, so parsing cannot fail.
        Self::from_str(&raw).unwrap_or(Self::Other(raw))
    }
}

/// One security policy entry of a virtual system's rulebase.
///
/// Identity is the rule name. The firewall owns the rule; this is the
/// state cached at the last refresh and goes stale after out-of-band
/// edits on the device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    pub name: String,
    pub uuid: Option<String>,
    pub disabled: bool,
    pub action: RuleAction,
    pub from_zones: Vec<String>,
    pub to_zones: Vec<String>,
    pub source: Vec<String>,
    pub destination: Vec<String>,
    pub application: Vec<String>,
    pub service: Vec<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl SecurityRule {
    /// A rule with only a name; everything else defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn action_parses_kebab_case() {
        assert_eq!(RuleAction::from_str("reset-both").unwrap(), RuleAction::ResetBoth);
        assert_eq!(RuleAction::from_str("ALLOW").unwrap(), RuleAction::Allow);
        assert_eq!(RuleAction::ResetClient.to_string(), "reset-client");
    }

    #[test]
    fn unknown_action_is_kept_verbatim() {
        assert_eq!(
            RuleAction::from_str("drop-icmp").unwrap(),
            RuleAction::Other("drop-icmp".into())
        );
        assert_eq!(RuleAction::Other("drop-icmp".into()).to_string(), "drop-icmp");
    }
}
