//! System info and identity handlers.

use std::collections::BTreeMap;

use panwatch_core::Controller;
use panwatch_core::entity::DeviceInfo;

use crate::cli::{GlobalOpts, SystemArgs, SystemCommand};
use crate::error::CliError;
use crate::output;

use super::util;

/// Aligned `key  value` lines.
fn info_detail(info: &BTreeMap<String, String>) -> String {
    let width = info.keys().map(String::len).max().unwrap_or(0);
    info.iter()
        .map(|(k, v)| format!("{k:<width$}  {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn device_detail(info: &DeviceInfo) -> String {
    [
        format!("Name:         {}", info.name),
        format!("Serial:       {}", info.identifier),
        format!("Manufacturer: {}", info.manufacturer),
        format!("Model:        {}", info.model),
        format!("Version:      {}", info.sw_version.as_deref().unwrap_or("-")),
        format!("URL:          {}", info.configuration_url),
    ]
    .join("\n")
}

pub fn handle(
    controller: &Controller,
    args: &SystemArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SystemCommand::Info => {
            let snap = controller.snapshot();
            let out = output::render_single(&global.output, &snap.system_info, info_detail, |info| {
                info.iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            });
            output::print_output(&out, global.quiet);
            if snap.system_info.is_empty() && !global.quiet {
                eprintln!("warning: the firewall returned no system information");
            }
            Ok(())
        }

        SystemCommand::Identity => {
            let identity = util::identity(controller)?;
            let info = DeviceInfo::new(&identity, &controller.config().host);
            let out = output::render_single(&global.output, &info, device_detail, |i| {
                i.identifier.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
