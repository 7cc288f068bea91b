// ── Entity layer ──
//
// Presentation view over a snapshot: one sensor per metric, one switch
// per security rule, and the device metadata they share. Entities hold
// no state of their own; every read goes to the snapshot passed in.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

use crate::command::CommandResult;
use crate::controller::Controller;
use crate::error::CoreError;
use crate::model::{DeviceIdentity, Snapshot};

pub const MANUFACTURER: &str = "Palo Alto Networks";

// ── Device info ──────────────────────────────────────────────────

/// Metadata every entity of one firewall shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifier: String,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: String,
    pub sw_version: Option<String>,
    pub configuration_url: String,
}

impl DeviceInfo {
    pub fn new(identity: &DeviceIdentity, host: &str) -> Self {
        Self {
            identifier: identity.serial.clone(),
            name: format!("PAN Firewall {}", identity.serial),
            manufacturer: MANUFACTURER,
            model: identity.model.clone(),
            sw_version: identity.sw_version.clone(),
            configuration_url: format!("https://{host}"),
        }
    }
}

// ── Sensors ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Percentage,
    DataRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
}

/// Every sensor a firewall exposes. The string form is the key used in
/// unique ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    DataplaneCpu,
    ManagementCpu,
    ConcurrentConnections,
    ConnectionsPerSecond,
    #[strum(serialize = "total_throughput_kbps")]
    #[serde(rename = "total_throughput_kbps")]
    TotalThroughput,
    NumberOfRoutes,
    BgpPeers,
    SystemInfo,
}

impl SensorKind {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::DataplaneCpu => "Dataplane CPU",
            Self::ManagementCpu => "Management CPU",
            Self::ConcurrentConnections => "Concurrent Connections",
            Self::ConnectionsPerSecond => "Connections per Second",
            Self::TotalThroughput => "Total Throughput",
            Self::NumberOfRoutes => "Number of Routes",
            Self::BgpPeers => "BGP Peers",
            Self::SystemInfo => "System Info",
        }
    }

    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::DataplaneCpu | Self::ManagementCpu => Some("%"),
            Self::ConcurrentConnections => Some("sessions"),
            Self::ConnectionsPerSecond => Some("cps"),
            Self::TotalThroughput => Some("Mbps"),
            Self::NumberOfRoutes => Some("routes"),
            Self::BgpPeers => Some("peers"),
            Self::SystemInfo => None,
        }
    }

    pub fn device_class(self) -> Option<DeviceClass> {
        match self {
            Self::DataplaneCpu | Self::ManagementCpu => Some(DeviceClass::Percentage),
            Self::TotalThroughput => Some(DeviceClass::DataRate),
            _ => None,
        }
    }

    pub fn state_class(self) -> Option<StateClass> {
        match self {
            Self::NumberOfRoutes | Self::BgpPeers => Some(StateClass::Total),
            Self::SystemInfo => None,
            _ => Some(StateClass::Measurement),
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::SystemInfo => "mdi:information",
            _ => "mdi:shield",
        }
    }
}

/// A sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Float(f64),
    Integer(i64),
    Count(u64),
    Text(String),
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(v) => write!(f, "{v:.1}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Count(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// One metric of one firewall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorEntity {
    kind: SensorKind,
    serial: String,
}

impl SensorEntity {
    pub fn new(kind: SensorKind, serial: impl Into<String>) -> Self {
        Self {
            kind,
            serial: serial.into(),
        }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.display_name()
    }

    /// `pan_{serial}_{key}`
    pub fn unique_id(&self) -> String {
        format!("pan_{}_{}", self.serial, self.kind.as_ref())
    }

    /// Current reading; `None` means unknown.
    pub fn state(&self, snapshot: &Snapshot) -> Option<SensorValue> {
        match self.kind {
            SensorKind::DataplaneCpu => snapshot.dataplane_cpu_percent.map(SensorValue::Float),
            SensorKind::ManagementCpu => snapshot.management_cpu_percent.map(SensorValue::Integer),
            SensorKind::ConcurrentConnections => {
                Some(SensorValue::Count(snapshot.concurrent_connections))
            }
            SensorKind::ConnectionsPerSecond => {
                Some(SensorValue::Count(snapshot.connections_per_second))
            }
            SensorKind::TotalThroughput => {
                Some(SensorValue::Float(snapshot.total_throughput_mbps()))
            }
            SensorKind::NumberOfRoutes => Some(SensorValue::Count(snapshot.number_of_routes)),
            SensorKind::BgpPeers => Some(SensorValue::Count(snapshot.bgp_peers)),
            SensorKind::SystemInfo => Some(SensorValue::Text("OK".into())),
        }
    }

    /// Extra attributes. Only the system-info sensor has any.
    pub fn attributes(&self, snapshot: &Snapshot) -> BTreeMap<String, String> {
        match self.kind {
            SensorKind::SystemInfo => snapshot.system_info.clone(),
            _ => BTreeMap::new(),
        }
    }
}

/// All sensors for a device, in display order.
pub fn sensors(identity: &DeviceIdentity) -> Vec<SensorEntity> {
    SensorKind::iter()
        .map(|kind| SensorEntity::new(kind, identity.serial.clone()))
        .collect()
}

// ── Rule switches ────────────────────────────────────────────────

/// A security rule as an on/off switch. On means the rule is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSwitch {
    rule: String,
    serial: String,
}

impl RuleSwitch {
    pub fn new(rule: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            serial: serial.into(),
        }
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn name(&self) -> String {
        format!("PAN Rule {}", self.rule)
    }

    /// `{serial}_{rule}`
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.serial, self.rule)
    }

    pub fn icon(&self) -> &'static str {
        "mdi:shield-lock"
    }

    /// True iff the rule exists in `snapshot` and is not disabled.
    pub fn is_on(&self, snapshot: &Snapshot) -> bool {
        snapshot.rule(&self.rule).is_some_and(|r| !r.disabled)
    }

    pub fn attributes(&self, snapshot: &Snapshot) -> BTreeMap<String, String> {
        let Some(rule) = snapshot.rule(&self.rule) else {
            return BTreeMap::new();
        };
        let mut attrs = BTreeMap::from([
            ("action".to_owned(), rule.action.to_string()),
            ("from".to_owned(), rule.from_zones.join(", ")),
            ("to".to_owned(), rule.to_zones.join(", ")),
            ("source".to_owned(), rule.source.join(", ")),
            ("destination".to_owned(), rule.destination.join(", ")),
            ("application".to_owned(), rule.application.join(", ")),
            ("service".to_owned(), rule.service.join(", ")),
        ]);
        if let Some(desc) = &rule.description {
            attrs.insert("description".into(), desc.clone());
        }
        if !rule.tags.is_empty() {
            attrs.insert("tags".into(), rule.tags.join(", "));
        }
        attrs
    }

    /// Enable the rule, commit, and refresh.
    pub async fn turn_on(&self, controller: &Controller) -> Result<CommandResult, CoreError> {
        controller.set_rule_disabled(self.rule.clone(), false).await
    }

    /// Disable the rule, commit, and refresh.
    pub async fn turn_off(&self, controller: &Controller) -> Result<CommandResult, CoreError> {
        controller.set_rule_disabled(self.rule.clone(), true).await
    }
}

/// One switch per rule in `snapshot`, ordered by rule name.
pub fn rule_switches(identity: &DeviceIdentity, snapshot: &Snapshot) -> Vec<RuleSwitch> {
    snapshot
        .rules
        .keys()
        .map(|name| RuleSwitch::new(name.clone(), identity.serial.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::SecurityRule;

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            serial: "0123456789".into(),
            model: "PA-440".into(),
            sw_version: Some("11.1.2".into()),
            hostname: None,
        }
    }

    fn snapshot() -> Snapshot {
        let mut disabled = SecurityRule::named("block-guest");
        disabled.disabled = true;
        Snapshot {
            rules: BTreeMap::from([
                ("allow-dns".to_owned(), SecurityRule::named("allow-dns")),
                ("block-guest".to_owned(), disabled),
            ]),
            dataplane_cpu_percent: Some(15.0),
            management_cpu_percent: None,
            total_throughput_kbps: 2500,
            system_info: BTreeMap::from([("hostname".to_owned(), "edge-fw".to_owned())]),
            ..Snapshot::default()
        }
    }

    #[test]
    fn sensor_unique_ids_and_units() {
        let all = sensors(&identity());
        assert_eq!(all.len(), 8);
        let ids: Vec<String> = all.iter().map(SensorEntity::unique_id).collect();
        assert!(ids.contains(&"pan_0123456789_dataplane_cpu".to_owned()));
        assert!(ids.contains(&"pan_0123456789_total_throughput_kbps".to_owned()));
        assert!(ids.contains(&"pan_0123456789_system_info".to_owned()));
        assert_eq!(SensorKind::TotalThroughput.unit(), Some("Mbps"));
        assert_eq!(SensorKind::BgpPeers.state_class(), Some(StateClass::Total));
    }

    #[test]
    fn throughput_sensor_reports_mbps() {
        let sensor = SensorEntity::new(SensorKind::TotalThroughput, "s");
        assert_eq!(sensor.state(&snapshot()), Some(SensorValue::Float(2.5)));
    }

    #[test]
    fn unknown_management_cpu_has_no_state() {
        let sensor = SensorEntity::new(SensorKind::ManagementCpu, "s");
        assert_eq!(sensor.state(&snapshot()), None);
    }

    #[test]
    fn system_info_sensor_is_ok_with_attributes() {
        let sensor = SensorEntity::new(SensorKind::SystemInfo, "s");
        let snap = snapshot();
        assert_eq!(sensor.state(&snap), Some(SensorValue::Text("OK".into())));
        assert_eq!(
            sensor.attributes(&snap).get("hostname").map(String::as_str),
            Some("edge-fw")
        );
    }

    #[test]
    fn switch_is_on_only_for_present_enabled_rules() {
        let snap = snapshot();
        assert!(RuleSwitch::new("allow-dns", "s").is_on(&snap));
        assert!(!RuleSwitch::new("block-guest", "s").is_on(&snap));
        assert!(!RuleSwitch::new("gone", "s").is_on(&snap));
    }

    #[test]
    fn switch_naming() {
        let switches = rule_switches(&identity(), &snapshot());
        assert_eq!(switches.len(), 2);
        assert_eq!(switches[0].name(), "PAN Rule allow-dns");
        assert_eq!(switches[0].unique_id(), "0123456789_allow-dns");
    }

    #[test]
    fn device_info_metadata() {
        let info = DeviceInfo::new(&identity(), "192.0.2.1");
        assert_eq!(info.name, "PAN Firewall 0123456789");
        assert_eq!(info.manufacturer, "Palo Alto Networks");
        assert_eq!(info.configuration_url, "https://192.0.2.1");
        assert_eq!(info.model, "PA-440");
    }
}
