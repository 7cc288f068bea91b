// ── Controller abstraction ──
//
// Lifecycle management for one firewall: authentication, the periodic
// refresh task, the command queue, and snapshot publication through the
// SnapshotStore.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::FirewallConfig;
use crate::error::CoreError;
use crate::firewall::{Firewall, XmlFirewall};
use crate::model::{DeviceIdentity, Snapshot};
use crate::refresh::refresh;
use crate::store::SnapshotStore;
use crate::stream::SnapshotStream;
use crate::toggle;

const COMMAND_CHANNEL_SIZE: usize = 16;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// Owner of one firewall handle.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. All clones share the
/// same handle, snapshot store and command queue.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller").finish_non_exhaustive()
    }
}

struct ControllerInner {
    config: FirewallConfig,
    store: Arc<SnapshotStore>,
    connection_state: watch::Sender<ConnectionState>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    /// Child token for the current connection; cancelled on disconnect,
    /// replaced on reconnect.
    cancel_child: Mutex<CancellationToken>,
    firewall: Mutex<Option<Arc<dyn Firewall>>>,
    /// Handle supplied up front instead of connecting over the XML API.
    injected: Option<Arc<dyn Firewall>>,
    identity: RwLock<Option<DeviceIdentity>>,
    /// Held for the duration of every refresh and every push+commit, so
    /// the periodic task never interleaves with a configuration change.
    device_guard: Mutex<()>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller that talks to the firewall over the XML API.
    /// Does NOT connect; call [`connect()`](Self::connect).
    pub fn new(config: FirewallConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a controller around an existing firewall handle.
    pub fn with_firewall(config: FirewallConfig, firewall: Arc<dyn Firewall>) -> Self {
        Self::build(config, Some(firewall))
    }

    fn build(config: FirewallConfig, injected: Option<Arc<dyn Firewall>>) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store: Arc::new(SnapshotStore::new()),
                connection_state,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                firewall: Mutex::new(None),
                injected,
                identity: RwLock::new(None),
                device_guard: Mutex::new(()),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the firewall configuration.
    pub fn config(&self) -> &FirewallConfig {
        &self.inner.config
    }

    /// Access the underlying SnapshotStore.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the firewall.
    ///
    /// Authenticates, performs an initial refresh (which must succeed),
    /// records the device identity, then spawns the command processor
    /// and, if a scan interval is set, the periodic refresh task.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        match self.establish().await {
            Ok(()) => {
                let _ = self.inner.connection_state.send(ConnectionState::Connected);
                info!(host = %self.inner.config.host, key = %self.device_key(), "connected to firewall");
                Ok(())
            }
            Err(e) => {
                *self.inner.firewall.lock().await = None;
                let _ = self.inner.connection_state.send(ConnectionState::Failed);
                Err(e)
            }
        }
    }

    async fn establish(&self) -> Result<(), CoreError> {
        let config = &self.inner.config;
        config.validate()?;

        // A second connect replaces the running tasks instead of orphaning them.
        self.stop_tasks().await;

        // Fresh child token for this connection (supports reconnect).
        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let firewall: Arc<dyn Firewall> = match &self.inner.injected {
            Some(fw) => Arc::clone(fw),
            None => Arc::new(XmlFirewall::connect(config).await?),
        };
        *self.inner.firewall.lock().await = Some(firewall);

        let snapshot = self.refresh_now().await?;
        let identity = DeviceIdentity::from_system_info(&snapshot.system_info, &config.host);
        debug!(serial = %identity.serial, model = %identity.model, "device identity resolved");
        *self.inner.identity.write().expect("identity lock poisoned") = Some(identity);

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let ctrl = self.clone();
            handles.push(tokio::spawn(command_processor_task(ctrl, rx)));
        }

        let interval_secs = config.scan_interval_secs;
        if interval_secs > 0 {
            let ctrl = self.clone();
            let cancel = child.clone();
            handles.push(tokio::spawn(refresh_task(ctrl, interval_secs, cancel)));
        }

        Ok(())
    }

    /// Disconnect from the firewall.
    ///
    /// Cancels and joins background tasks, drops the firewall handle, and
    /// resets the connection state to
    /// [`Disconnected`](ConnectionState::Disconnected). The last snapshot
    /// stays readable.
    pub async fn disconnect(&self) {
        self.stop_tasks().await;
        *self.inner.firewall.lock().await = None;

        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Cancel and join the background tasks of the current connection.
    async fn stop_tasks(&self) {
        // Cancel the child token (not the parent -- allows reconnect).
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        drop(handles);

        // Recreate the command channel so a reconnect can spawn a fresh
        // receiver. The previous one was consumed by the processor task.
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        *self.inner.command_tx.lock().await = tx;
        *self.inner.command_rx.lock().await = Some(rx);
    }

    /// Refresh now and publish the result.
    ///
    /// On failure the previously published snapshot stays in place.
    pub async fn refresh_now(&self) -> Result<Arc<Snapshot>, CoreError> {
        let firewall = self.firewall().await?;
        let _guard = self.inner.device_guard.lock().await;
        let snapshot = refresh(firewall.as_ref()).await?;
        Ok(self.inner.store.publish(snapshot))
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command against the firewall.
    ///
    /// Sends the command through the internal channel to the command
    /// processor task and awaits the result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::Disconnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        let command_tx = self.inner.command_tx.lock().await.clone();

        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::Disconnected)?;

        rx.await.map_err(|_| CoreError::Disconnected)?
    }

    /// Enable or disable a rule through the command queue.
    pub async fn set_rule_disabled(
        &self,
        name: impl Into<String>,
        disabled: bool,
    ) -> Result<CommandResult, CoreError> {
        self.execute(Command::SetRuleDisabled {
            name: name.into(),
            disabled,
        })
        .await
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Disables the periodic refresh since only a single
    /// request-response cycle is needed.
    pub async fn oneshot<F, Fut, T>(config: FirewallConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.scan_interval_secs = 0;

        let controller = Controller::new(cfg);
        controller.connect().await?;
        let result = f(controller.clone()).await;
        controller.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.snapshot()
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    /// Device identity, known once connected.
    pub fn identity(&self) -> Option<DeviceIdentity> {
        self.inner
            .identity
            .read()
            .expect("identity lock poisoned")
            .clone()
    }

    /// Registry key: the device serial, or the configured host before the
    /// first successful connect.
    pub fn device_key(&self) -> String {
        self.identity()
            .map_or_else(|| self.inner.config.host.clone(), |id| id.serial)
    }

    async fn firewall(&self) -> Result<Arc<dyn Firewall>, CoreError> {
        self.inner
            .firewall
            .lock()
            .await
            .clone()
            .ok_or(CoreError::Disconnected)
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh the snapshot.
async fn refresh_task(controller: Controller, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.refresh_now().await {
                    warn!(error = %e, "periodic refresh failed, keeping previous snapshot");
                }
            }
        }
    }
}

/// Process commands from the mpsc channel one at a time.
async fn command_processor_task(controller: Controller, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = controller.inner.cancel_child.lock().await.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&controller, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(controller: &Controller, cmd: Command) -> Result<CommandResult, CoreError> {
    match cmd {
        Command::SetRuleDisabled { name, disabled } => {
            let firewall = controller.firewall().await?;
            let commit = {
                let _guard = controller.inner.device_guard.lock().await;
                let snapshot = controller.snapshot();
                toggle::set_rule_disabled(firewall.as_ref(), &snapshot, &name, disabled).await?
            };
            let snapshot = controller.refresh_now().await?;
            Ok(CommandResult::RuleUpdated { commit, snapshot })
        }
        Command::Refresh => controller.refresh_now().await.map(CommandResult::Refreshed),
    }
}
