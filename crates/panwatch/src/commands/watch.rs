//! Watch mode: keep the controller running and print every snapshot.

use chrono::Local;

use panwatch_core::config::MIN_SCAN_INTERVAL_SECS;
use panwatch_core::{Controller, FirewallConfig, Snapshot};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::{status, util};

/// One summary line per snapshot.
fn summary_line(snapshot: &Snapshot, readings: &[status::Reading]) -> String {
    let fields = readings
        .iter()
        .map(|r| format!("{}={}", r.key, status::format_reading(r)))
        .collect::<Vec<_>>()
        .join("  ");
    let degraded = if snapshot.errors.is_empty() {
        String::new()
    } else {
        format!("  ({} degraded)", snapshot.errors.len())
    };
    format!(
        "{} rules={}  {fields}{degraded}",
        snapshot.refreshed_at.with_timezone(&Local).format("%H:%M:%S"),
        snapshot.rules.len(),
    )
}

fn print_snapshot(
    controller: &Controller,
    snapshot: &Snapshot,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let identity = util::identity(controller)?;
    let readings = status::readings(&identity, snapshot);
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => summary_line(snapshot, &readings),
        // One document per refresh keeps the stream line-oriented.
        _ => output::render_compact(&readings),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(
    config: FirewallConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let config = config::for_watch(config, args.interval);
    if config.scan_interval_secs < MIN_SCAN_INTERVAL_SECS {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: format!(
                "watch needs a refresh interval of at least {MIN_SCAN_INTERVAL_SECS} seconds"
            ),
        });
    }

    let controller = Controller::new(config);
    controller.connect().await?;

    let result = run(&controller, args.count.unwrap_or(u64::MAX), global).await;
    controller.disconnect().await;
    result
}

async fn run(controller: &Controller, limit: u64, global: &GlobalOpts) -> Result<(), CliError> {
    // Subscribed after connect, so only later refreshes wake us.
    let mut stream = controller.subscribe();
    print_snapshot(controller, stream.current(), global)?;
    let mut printed = 1u64;

    while printed < limit {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = stream.changed() => {
                let Some(snapshot) = next else { break };
                print_snapshot(controller, &snapshot, global)?;
                printed += 1;
            }
        }
    }
    Ok(())
}
