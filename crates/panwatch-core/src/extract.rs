// ── Operational reply extraction ──
//
// Operational replies have no stable schema across PAN-OS versions, so
// values are found by scanning tags rather than by fixed paths. Session
// counters go through a small table of `(primary, fallback, parse,
// sentinel)` specs instead of per-field code.

use std::collections::BTreeMap;

use roxmltree::{Document, Node};

/// How much of a raw reply is logged at trace level.
pub const RAW_PREVIEW_CHARS: usize = 800;

/// Leading slice of `body` for trace logging.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(RAW_PREVIEW_CHARS) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn trimmed_text<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.text().map(str::trim).filter(|t| !t.is_empty())
}

// ── Dataplane CPU ────────────────────────────────────────────────

/// Mean load of all active dataplane cores, rounded to one decimal.
///
/// Every element whose tag contains `core` (any case) and whose text is
/// a plain decimal number contributes if the value is positive.
/// Exponent forms such as `1e2` are skipped. No active cores yields `0.0`.
pub fn dataplane_cpu(doc: &Document<'_>) -> f64 {
    let loads: Vec<f64> = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name().to_ascii_lowercase().contains("core"))
        .filter_map(trimmed_text)
        .filter(|t| !t.contains(['e', 'E']))
        .filter_map(|t| t.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();

    if loads.is_empty() {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean = loads.iter().sum::<f64>() / loads.len() as f64;
    (mean * 10.0).round() / 10.0
}

// ── System info ──────────────────────────────────────────────────

/// Replace the characters PAN-OS uses in tag names that are awkward in
/// attribute keys.
pub fn sanitize_key(tag: &str) -> String {
    tag.replace(['-', ':'], "_")
}

/// Flatten every leaf element with text into `sanitized tag -> text`.
///
/// Later elements with the same tag overwrite earlier ones.
pub fn system_info(doc: &Document<'_>) -> BTreeMap<String, String> {
    doc.descendants()
        .filter(|n| {
            n.is_element()
                && n.tag_name().namespace().is_none()
                && !n.children().any(|c| c.is_element())
        })
        .filter_map(|n| trimmed_text(n).map(|t| (sanitize_key(n.tag_name().name()), t.to_owned())))
        .collect()
}

// ── Management CPU ───────────────────────────────────────────────

/// Text of the first element whose tag contains `cpu`, parsed as an
/// integer percentage.
///
/// A reply with no such element (plain `top` output, for one) reads as
/// `0`. Text that is not a number is [`FieldError::Malformed`].
pub fn management_cpu(doc: &Document<'_>) -> Result<i64, FieldError> {
    let Some(text) = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name().to_ascii_lowercase().contains("cpu"))
        .find_map(trimmed_text)
    else {
        return Ok(0);
    };
    text.trim_end_matches('%')
        .trim()
        .parse()
        .map_err(|_| FieldError::Malformed(text.to_owned()))
}

// ── Counting ─────────────────────────────────────────────────────

/// Number of `<entry>` elements anywhere in the reply.
pub fn count_entries(doc: &Document<'_>) -> u64 {
    doc.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "entry")
        .count()
        .try_into()
        .unwrap_or(u64::MAX)
}

// ── Session info ─────────────────────────────────────────────────

/// Why a table-driven field fell back to its sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Neither the primary nor the fallback tag was present.
    Missing,
    /// The tag was present but its text held no usable number.
    Malformed(String),
}

/// One value extracted by tag lookup.
pub struct FieldSpec {
    pub name: &'static str,
    pub primary: &'static str,
    pub fallback: &'static str,
    pub parse: fn(&str) -> Result<u64, FieldError>,
    pub sentinel: u64,
}

impl FieldSpec {
    /// Look up the primary tag, then the fallback, and parse the text.
    pub fn lookup(&self, doc: &Document<'_>) -> Result<u64, FieldError> {
        let text = find_text(doc, self.primary)
            .or_else(|| find_text(doc, self.fallback))
            .ok_or(FieldError::Missing)?;
        (self.parse)(text)
    }

    /// [`lookup`](Self::lookup), with the sentinel on any failure.
    pub fn extract(&self, doc: &Document<'_>) -> u64 {
        self.lookup(doc).unwrap_or(self.sentinel)
    }
}

fn find_text<'a>(doc: &'a Document<'_>, tag: &str) -> Option<&'a str> {
    doc.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
        .and_then(trimmed_text)
}

/// Digits of the first whitespace-separated token (`"1200 kbps"` -> 1200).
pub fn parse_leading_digits(text: &str) -> Result<u64, FieldError> {
    let token = text.split_whitespace().next().unwrap_or_default();
    let digits: String = token.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse()
        .map_err(|_| FieldError::Malformed(text.to_owned()))
}

pub const ACTIVE_SESSIONS: FieldSpec = FieldSpec {
    name: "concurrent_connections",
    primary: "number-of-active-sessions",
    fallback: "active-sessions",
    parse: parse_leading_digits,
    sentinel: 0,
};

pub const CONNECTION_RATE: FieldSpec = FieldSpec {
    name: "connections_per_second",
    primary: "new-connection-establish-rate",
    fallback: "cps",
    parse: parse_leading_digits,
    sentinel: 0,
};

pub const THROUGHPUT_KBPS: FieldSpec = FieldSpec {
    name: "total_throughput_kbps",
    primary: "throughput",
    fallback: "kbps",
    parse: parse_leading_digits,
    sentinel: 0,
};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn doc(xml: &str) -> Document<'_> {
        Document::parse(xml).unwrap()
    }

    #[test]
    fn dataplane_cpu_averages_positive_cores() {
        let d = doc(r"<response><result>
            <core0>10.0</core0><core1>0.0</core1><core2>20.0</core2><core3>-5.0</core3>
        </result></response>");
        assert!((dataplane_cpu(&d) - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dataplane_cpu_rounds_to_one_decimal() {
        let d = doc("<r><CoreLoad>1</CoreLoad><core>2</core><core>2</core></r>");
        assert!((dataplane_cpu(&d) - 1.7).abs() < f64::EPSILON);
    }

    #[test]
    fn dataplane_cpu_without_cores_is_zero() {
        let d = doc("<r><dp0><value>3</value></dp0><core>idle</core></r>");
        assert!(dataplane_cpu(&d).abs() < f64::EPSILON);
    }

    #[test]
    fn dataplane_cpu_skips_exponent_forms() {
        let d = doc("<r><core0>1e2</core0><core1>20.0</core1><core2>5E1</core2></r>");
        assert!((dataplane_cpu(&d) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn system_info_flattens_leaves_with_sanitized_keys() {
        let d = doc(r#"<response status="success"><result><system>
            <hostname>edge-fw</hostname>
            <sw-version>11.1.2</sw-version>
            <mac-address>00:1b:17:00:00:01</mac-address>
            <serial>0123456789</serial>
            <empty>   </empty>
        </system></result></response>"#);
        let info = system_info(&d);
        assert_eq!(info.get("hostname").map(String::as_str), Some("edge-fw"));
        assert_eq!(info.get("sw_version").map(String::as_str), Some("11.1.2"));
        assert_eq!(info.get("mac_address").map(String::as_str), Some("00:1b:17:00:00:01"));
        assert!(!info.contains_key("empty"));
        assert!(!info.contains_key("system"));
    }

    #[test]
    fn sanitize_key_replaces_hyphen_and_colon() {
        assert_eq!(sanitize_key("sw-version"), "sw_version");
        assert_eq!(sanitize_key("ipv6:link-local"), "ipv6_link_local");
    }

    #[test]
    fn management_cpu_strips_percent() {
        let d = doc("<r><mgmt-cpu>7%</mgmt-cpu></r>");
        assert_eq!(management_cpu(&d), Ok(7));
    }

    #[test]
    fn management_cpu_takes_first_cpu_element() {
        let d = doc("<r><cpu-load> 12 </cpu-load><cpu-idle>88</cpu-idle></r>");
        assert_eq!(management_cpu(&d), Ok(12));
    }

    #[test]
    fn management_cpu_without_cpu_element_is_zero() {
        assert_eq!(management_cpu(&doc("<r><mem>1</mem></r>")), Ok(0));
        let top = doc("<response><result>top - 10:00:00 up 1 day, load average: 0.1</result></response>");
        assert_eq!(management_cpu(&top), Ok(0));
    }

    #[test]
    fn management_cpu_unparsable_is_malformed() {
        assert_eq!(
            management_cpu(&doc("<r><cpu>high</cpu></r>")),
            Err(FieldError::Malformed("high".into()))
        );
    }

    #[test]
    fn counts_entries_at_any_depth() {
        let d = doc("<r><entry/><x><entry><entry/></entry></x></r>");
        assert_eq!(count_entries(&d), 3);
    }

    #[test]
    fn session_fields_use_primary_then_fallback() {
        let d = doc(r"<response><result>
            <active-sessions>321</active-sessions>
            <new-connection-establish-rate>45 cps</new-connection-establish-rate>
            <kbps>2500</kbps>
        </result></response>");
        assert_eq!(ACTIVE_SESSIONS.extract(&d), 321);
        assert_eq!(CONNECTION_RATE.extract(&d), 45);
        assert_eq!(THROUGHPUT_KBPS.extract(&d), 2500);
    }

    #[test]
    fn missing_session_field_is_sentinel() {
        let d = doc("<response><result><cps>3</cps></result></response>");
        assert_eq!(ACTIVE_SESSIONS.lookup(&d), Err(FieldError::Missing));
        assert_eq!(ACTIVE_SESSIONS.extract(&d), 0);
    }

    #[test]
    fn malformed_session_field_is_sentinel() {
        let d = doc("<r><throughput>n/a</throughput></r>");
        assert_eq!(
            THROUGHPUT_KBPS.lookup(&d),
            Err(FieldError::Malformed("n/a".into()))
        );
        assert_eq!(THROUGHPUT_KBPS.extract(&d), 0);
    }

    #[test]
    fn leading_digits_ignore_units_and_separators() {
        assert_eq!(parse_leading_digits("1,204 kbps"), Ok(1204));
        assert_eq!(parse_leading_digits("0x1"), Ok(1));
        assert!(parse_leading_digits("").is_err());
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(RAW_PREVIEW_CHARS + 10);
        assert_eq!(preview(&long).chars().count(), RAW_PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }
}
