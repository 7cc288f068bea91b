//! Health metric handlers: one row per sensor.

use serde::Serialize;
use tabled::Tabled;

use panwatch_core::entity::{self, SensorValue};
use panwatch_core::{Controller, DeviceIdentity, Snapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

/// A sensor's reading in one snapshot.
#[derive(Debug, Serialize)]
pub struct Reading {
    pub key: String,
    pub name: &'static str,
    pub value: Option<SensorValue>,
    pub unit: Option<&'static str>,
    pub unique_id: String,
}

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Sensor")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Readings for every metric sensor. The system-info sensor is left to
/// `system info`.
pub fn readings(identity: &DeviceIdentity, snapshot: &Snapshot) -> Vec<Reading> {
    entity::sensors(identity)
        .into_iter()
        .filter(|s| s.kind() != entity::SensorKind::SystemInfo)
        .map(|s| Reading {
            key: s.kind().as_ref().to_owned(),
            name: s.name(),
            value: s.state(snapshot),
            unit: s.kind().unit(),
            unique_id: s.unique_id(),
        })
        .collect()
}

/// `value unit`, or `-` when unknown.
pub fn format_reading(reading: &Reading) -> String {
    match (&reading.value, reading.unit) {
        (None, _) => "-".into(),
        (Some(v), Some("%")) => format!("{v}%"),
        (Some(v), Some(unit)) => format!("{v} {unit}"),
        (Some(v), None) => v.to_string(),
    }
}

/// Print degraded metrics to stderr.
pub fn report_degraded(snapshot: &Snapshot, quiet: bool) {
    if quiet {
        return;
    }
    for err in &snapshot.errors {
        eprintln!("warning: {} unavailable: {}", err.metric, err.message);
    }
}

pub fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let identity = util::identity(controller)?;
    let snap = controller.snapshot();
    let color = output::should_color(&global.color);

    let data = readings(&identity, &snap);
    let out = output::render_list(
        &global.output,
        &data,
        |r| ReadingRow {
            name: r.name,
            value: if r.value.is_some() {
                format_reading(r)
            } else {
                output::dim("-", color)
            },
        },
        |r| format!("{}={}", r.key, r.value.as_ref().map_or_else(String::new, ToString::to_string)),
    );
    output::print_output(&out, global.quiet);
    report_degraded(&snap, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> DeviceIdentity {
        DeviceIdentity {
            serial: "0123456789".into(),
            model: "PA-440".into(),
            sw_version: None,
            hostname: None,
        }
    }

    #[test]
    fn unknown_cpu_renders_dash() {
        let snap = Snapshot {
            total_throughput_kbps: 2500,
            ..Snapshot::default()
        };
        let rs = readings(&identity(), &snap);

        let cpu = rs.iter().find(|r| r.key == "dataplane_cpu").map(format_reading);
        assert_eq!(cpu.as_deref(), Some("-"));

        let tp = rs
            .iter()
            .find(|r| r.key == "total_throughput_kbps")
            .map(format_reading);
        assert_eq!(tp.as_deref(), Some("2.5 Mbps"));
    }

    #[test]
    fn system_info_sensor_excluded() {
        let rs = readings(&identity(), &Snapshot::default());
        assert_eq!(rs.len(), 7);
        assert!(rs.iter().all(|r| r.unique_id.starts_with("pan_0123456789_")));
    }
}
