// ── Command API ──
//
// Writes against a firewall flow through the controller's command
// channel, so one device never sees two configuration sessions at once.

use std::sync::Arc;

use panwatch_api::CommitOutcome;

use crate::error::CoreError;
use crate::model::Snapshot;

/// A command plus the channel its result goes back on.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Operations routed through the command processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Enable (`disabled: false`) or disable a security rule, commit, and
    /// refresh.
    SetRuleDisabled { name: String, disabled: bool },
    /// Force an immediate refresh.
    Refresh,
}

/// Result of a successfully processed [`Command`].
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// The rule change was committed and a fresh snapshot published.
    RuleUpdated {
        commit: CommitOutcome,
        snapshot: Arc<Snapshot>,
    },
    Refreshed(Arc<Snapshot>),
}

impl CommandResult {
    /// The snapshot published as part of this command.
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        match self {
            Self::RuleUpdated { snapshot, .. } | Self::Refreshed(snapshot) => snapshot,
        }
    }
}
