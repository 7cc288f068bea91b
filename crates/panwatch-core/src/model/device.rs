// ── Device identity ──

use std::collections::BTreeMap;

use serde::Serialize;

/// Model name used when system info does not report one.
pub const FALLBACK_MODEL: &str = "PAN-OS Firewall";

/// Who the firewall says it is, read from `show system info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceIdentity {
    /// Serial number, or the configured host when the device did not
    /// report one. Used as the registry key and in unique ids.
    pub serial: String,
    pub model: String,
    pub sw_version: Option<String>,
    pub hostname: Option<String>,
}

impl DeviceIdentity {
    /// Build from a sanitized system-info mapping.
    pub fn from_system_info(info: &BTreeMap<String, String>, host: &str) -> Self {
        Self {
            serial: info
                .get("serial")
                .cloned()
                .unwrap_or_else(|| host.to_owned()),
            model: info
                .get("model")
                .cloned()
                .unwrap_or_else(|| FALLBACK_MODEL.to_owned()),
            sw_version: info.get("sw_version").cloned(),
            hostname: info.get("hostname").cloned(),
        }
    }
}
