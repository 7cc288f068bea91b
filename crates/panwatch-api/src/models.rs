// XML API response models
//
// PAN-OS wraps every reply as `<response status="success|error">`. The
// envelope is validated once here; callers get either the raw document
// (operational commands, whose shape varies by OS version) or a typed
// entry (security rules, whose shape is stable).

use roxmltree::{Document, Node};

use crate::error::Error;

/// A successful XML API reply, kept as text.
///
/// The body is re-parsed on demand with [`document`](Self::document) since
/// `roxmltree` borrows from the input and operational replies are scanned
/// by callers with their own heuristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlResponse {
    body: String,
}

impl XmlResponse {
    /// Wrap a body that is already known to be a success envelope.
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// The raw XML text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the body into a read-only DOM.
    pub fn document(&self) -> Result<Document<'_>, Error> {
        Document::parse(&self.body).map_err(|e| Error::Xml {
            message: e.to_string(),
            body: self.body.clone(),
        })
    }

    /// Validate the `<response>` envelope.
    ///
    /// Returns the response unchanged on `status="success"` (or a missing
    /// status attribute), `Error::Api` on `status="error"`, and
    /// `Error::Authentication` when the device answers with code 403.
    pub(crate) fn from_envelope(body: String) -> Result<Self, Error> {
        let failure = {
            let doc = Document::parse(&body).map_err(|e| Error::Xml {
                message: e.to_string(),
                body: body.clone(),
            })?;
            let root = doc.root_element();
            if root.tag_name().name() != "response" {
                return Err(Error::Xml {
                    message: format!("expected <response>, got <{}>", root.tag_name().name()),
                    body: body.clone(),
                });
            }
            if root.attribute("status") == Some("error") {
                Some((
                    root.attribute("code").map(String::from),
                    collect_text(root),
                ))
            } else {
                None
            }
        };

        match failure {
            None => Ok(Self { body }),
            Some((Some(code), message)) if code == "403" => Err(Error::Authentication { message }),
            Some((code, message)) => Err(Error::Api { message, code }),
        }
    }
}

/// Join every non-empty text node under `node` with `"; "`.
pub(crate) fn collect_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

/// First child element of `node` named `tag`.
pub(crate) fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)
}

/// Trimmed, non-empty text of the child element named `tag`.
pub(crate) fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|c| c.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Texts of `<member>` elements under the child element named `tag`.
fn members(node: Node<'_, '_>, tag: &str) -> Vec<String> {
    child(node, tag)
        .map(|list| {
            list.children()
                .filter(|m| m.is_element() && m.tag_name().name() == "member")
                .filter_map(|m| m.text())
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// One `<entry>` of the security rulebase as returned by `action=get`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleEntry {
    pub name: String,
    pub uuid: Option<String>,
    pub disabled: bool,
    pub action: Option<String>,
    pub from: Vec<String>,
    pub to: Vec<String>,
    pub source: Vec<String>,
    pub destination: Vec<String>,
    pub application: Vec<String>,
    pub service: Vec<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl RuleEntry {
    /// Build from an `<entry name="...">` node. Entries without a name
    /// attribute are skipped.
    pub(crate) fn from_node(node: Node<'_, '_>) -> Option<Self> {
        let name = node.attribute("name")?.to_owned();
        Some(Self {
            name,
            uuid: node.attribute("uuid").map(String::from),
            disabled: child_text(node, "disabled").is_some_and(|v| v.eq_ignore_ascii_case("yes")),
            action: child_text(node, "action"),
            from: members(node, "from"),
            to: members(node, "to"),
            source: members(node, "source"),
            destination: members(node, "destination"),
            application: members(node, "application"),
            service: members(node, "service"),
            description: child_text(node, "description"),
            tags: members(node, "tag"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_passes_through() {
        let body = r#"<response status="success"><result><x>1</x></result></response>"#;
        let resp = XmlResponse::from_envelope(body.into()).unwrap();
        assert_eq!(resp.body(), body);
        assert!(resp.document().is_ok());
    }

    #[test]
    fn error_envelope_collects_message_lines() {
        let body = r#"<response status="error" code="17"><msg><line>bad xpath</line><line>see log</line></msg></response>"#;
        let err = XmlResponse::from_envelope(body.into()).unwrap_err();
        match err {
            Error::Api { message, code } => {
                assert_eq!(message, "bad xpath; see log");
                assert_eq!(code.as_deref(), Some("17"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn code_403_is_authentication() {
        let body = r#"<response status="error" code="403"><result><msg>Invalid credentials.</msg></result></response>"#;
        let err = XmlResponse::from_envelope(body.into()).unwrap_err();
        assert!(err.is_auth_error());
    }

    #[test]
    fn non_xml_body_is_xml_error() {
        let err = XmlResponse::from_envelope("<html>oops".into()).unwrap_err();
        assert!(matches!(err, Error::Xml { .. }));
    }

    #[test]
    fn rule_entry_reads_members_and_flags() {
        let xml = r#"<entry name="allow-web" uuid="u-1">
            <from><member>trust</member></from>
            <to><member>untrust</member></to>
            <source><member>any</member></source>
            <destination><member>any</member></destination>
            <application><member>web-browsing</member><member>ssl</member></application>
            <service><member>application-default</member></service>
            <action>allow</action>
            <disabled>yes</disabled>
            <tag><member>web</member></tag>
        </entry>"#;
        let doc = Document::parse(xml).unwrap();
        let rule = RuleEntry::from_node(doc.root_element()).unwrap();
        assert_eq!(rule.name, "allow-web");
        assert_eq!(rule.uuid.as_deref(), Some("u-1"));
        assert!(rule.disabled);
        assert_eq!(rule.application, vec!["web-browsing", "ssl"]);
        assert_eq!(rule.tags, vec!["web"]);
        assert_eq!(rule.action.as_deref(), Some("allow"));
        assert!(rule.description.is_none());
    }

    #[test]
    fn rule_entry_without_disabled_is_enabled() {
        let doc = Document::parse(r#"<entry name="r"><action>deny</action></entry>"#).unwrap();
        let rule = RuleEntry::from_node(doc.root_element()).unwrap();
        assert!(!rule.disabled);
        assert!(rule.from.is_empty());
    }
}
