//! Command dispatch: bridges CLI args -> controller -> output formatting.

pub mod config_cmd;
pub mod rules;
pub mod status;
pub mod system;
pub mod util;
pub mod watch;

use panwatch_core::{Controller, FirewallConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a firewall-bound command to its handler.
///
/// Everything except `watch` runs one-shot: connect (which performs the
/// first refresh), handle, disconnect.
pub async fn dispatch(
    cmd: Command,
    mut config: FirewallConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if let Command::Watch(args) = cmd {
        return watch::handle(config, args, global).await;
    }

    config.scan_interval_secs = 0;
    let controller = Controller::new(config);
    controller.connect().await?;

    let result = match cmd {
        Command::Rules(args) => rules::handle(&controller, args, global).await,
        Command::Status => status::handle(&controller, global),
        Command::System(args) => system::handle(&controller, &args, global),
        // Handled before a connection is made
        Command::Watch(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    };

    controller.disconnect().await;
    result
}
