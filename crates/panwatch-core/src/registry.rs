// ── Device registry ──
//
// Process-wide map of running controllers keyed by device identity.
// Starting a device connects it; stopping it disconnects and forgets it.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

use crate::config::FirewallConfig;
use crate::controller::Controller;
use crate::error::CoreError;

/// Running controllers keyed by [`Controller::device_key`].
#[derive(Default)]
pub struct DeviceRegistry {
    controllers: DashMap<String, Controller>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a controller for `config` and register it.
    pub async fn start(&self, config: FirewallConfig) -> Result<Controller, CoreError> {
        self.start_controller(Controller::new(config)).await
    }

    /// Connect `controller` and register it under its device key.
    ///
    /// The key is only known after connecting, so a duplicate is detected
    /// afterwards: the new controller is disconnected again and
    /// [`CoreError::AlreadyRunning`] returned.
    pub async fn start_controller(&self, controller: Controller) -> Result<Controller, CoreError> {
        controller.connect().await?;
        let key = controller.device_key();

        let inserted = match self.controllers.entry(key.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(controller.clone());
                true
            }
        };

        if !inserted {
            controller.disconnect().await;
            return Err(CoreError::AlreadyRunning { key });
        }

        info!(%key, "device started");
        Ok(controller)
    }

    /// Disconnect and remove the controller registered under `key`.
    pub async fn stop(&self, key: &str) -> Result<(), CoreError> {
        let (_, controller) = self
            .controllers
            .remove(key)
            .ok_or_else(|| CoreError::NotRunning { key: key.into() })?;
        controller.disconnect().await;
        info!(key, "device stopped");
        Ok(())
    }

    /// Stop every registered controller.
    pub async fn stop_all(&self) {
        for key in self.keys() {
            if let Some((_, controller)) = self.controllers.remove(&key) {
                controller.disconnect().await;
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Controller> {
        self.controllers.get(key).map(|c| c.value().clone())
    }

    /// Keys of all registered devices, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.controllers.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
