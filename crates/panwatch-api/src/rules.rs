// Security rulebase endpoints
//
// Reads and edits go to the candidate configuration of one virtual
// system. Edits only become active after a commit.

use tracing::debug;

use crate::client::XmlApiClient;
use crate::error::Error;
use crate::models::RuleEntry;

/// XPath of the security rulebase for `vsys` on a standalone firewall.
pub fn rulebase_xpath(vsys: &str) -> String {
    format!(
        "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='{vsys}']/rulebase/security/rules"
    )
}

/// XPath of a single security rule.
pub fn rule_xpath(vsys: &str, rule: &str) -> String {
    format!("{}/entry[@name='{rule}']", rulebase_xpath(vsys))
}

impl XmlApiClient {
    /// List every security rule in the candidate rulebase of `vsys`.
    ///
    /// `POST /api/` with `type=config&action=get&xpath={rulebase}`. An empty
    /// rulebase (no `<rules>` element) yields an empty list.
    pub async fn list_security_rules(&self, vsys: &str) -> Result<Vec<RuleEntry>, Error> {
        let xpath = rulebase_xpath(vsys);
        debug!(vsys, "listing security rules");

        let resp = self
            .request(&[("type", "config"), ("action", "get"), ("xpath", &xpath)])
            .await?;

        let doc = resp.document()?;
        let rules = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "rules")
            .map(|rules| {
                rules
                    .children()
                    .filter(|n| n.is_element() && n.tag_name().name() == "entry")
                    .filter_map(RuleEntry::from_node)
                    .collect()
            })
            .unwrap_or_default();
        Ok(rules)
    }

    /// Set the `disabled` flag of one rule in the candidate configuration.
    ///
    /// `POST /api/` with `type=config&action=set&xpath={rule}&element=<disabled>yes|no</disabled>`
    pub async fn set_rule_disabled(
        &self,
        vsys: &str,
        rule: &str,
        disabled: bool,
    ) -> Result<(), Error> {
        let xpath = rule_xpath(vsys, rule);
        let element = format!("<disabled>{}</disabled>", if disabled { "yes" } else { "no" });
        debug!(vsys, rule, disabled, "pushing rule state to candidate config");

        self.request(&[
            ("type", "config"),
            ("action", "set"),
            ("xpath", &xpath),
            ("element", &element),
        ])
        .await?;
        Ok(())
    }
}
