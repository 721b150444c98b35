// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration Store
//!
//! Holds the live configuration of every registered device together with its
//! snapshot history.
//!
//! # Concurrency
//!
//! Each device's live state sits behind its own async mutex: one writer per
//! device at a time, devices independent of each other. History reads
//! (`latest`, `by_version`, `history`, `history_after`) never take a device
//! lock and may run while that device is being changed.
//!
//! # Examples
//!
//! ```rust
//! use cim_network_config::domain::{DeviceConfiguration, DeviceId};
//! use cim_network_config::store::ConfigurationStore;
//! use cim_network_config::EngineConfig;
//!
//! # tokio_test::block_on(async {
//! let store = ConfigurationStore::new(EngineConfig::default()).unwrap();
//! let id = DeviceId::new("core-01").unwrap();
//! store.register_device(id.clone(), DeviceConfiguration::new()).unwrap();
//!
//! let version = store.save_snapshot(&id, "Baseline", "ops").await.unwrap();
//! assert_eq!(store.latest(&id).unwrap().version(), version);
//! # });
//! ```

pub mod history;
pub mod memento;

pub use history::ConfigurationHistory;
pub use memento::{ConfigVersion, ConfigurationMemento, AFTER_PREFIX, BEFORE_PREFIX};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::domain::{DeviceConfiguration, DeviceId};
use crate::errors::{NetConfigError, NetConfigResult};

/// Operator recorded on the registration snapshot
pub const SYSTEM_INIT_OPERATOR: &str = "SYSTEM_INIT";
/// Description of the registration snapshot
pub const INITIAL_DESCRIPTION: &str = "Initial configuration";

/// Health of a device's live configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    /// Configuration is settled
    Online,
    /// A transactional apply is in progress
    Configuring,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "ONLINE"),
            Self::Configuring => write!(f, "CONFIGURING"),
        }
    }
}

/// Live state of one device
#[derive(Debug, Clone)]
pub struct DeviceState {
    configuration: DeviceConfiguration,
    status: DeviceStatus,
    last_modified: DateTime<Utc>,
}

impl DeviceState {
    fn new(configuration: DeviceConfiguration) -> Self {
        Self {
            configuration,
            status: DeviceStatus::Online,
            last_modified: Utc::now(),
        }
    }

    pub fn configuration(&self) -> &DeviceConfiguration {
        &self.configuration
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    /// Mutate the live configuration in place
    pub(crate) fn modify<R>(&mut self, f: impl FnOnce(&mut DeviceConfiguration) -> R) -> R {
        let result = f(&mut self.configuration);
        self.last_modified = Utc::now();
        result
    }

    pub(crate) fn set_status(&mut self, status: DeviceStatus) {
        self.status = status;
    }

    /// Replace every configuration category with the memento's; the device is Online afterwards
    pub(crate) fn restore_from(&mut self, memento: &ConfigurationMemento) {
        self.configuration = memento.to_configuration();
        self.status = DeviceStatus::Online;
        self.last_modified = Utc::now();
    }
}

/// Outcome of a point-in-time rollback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "version", rename_all = "snake_case")]
pub enum EmergencyRollback {
    /// The requested version was restored
    RestoredVersion(ConfigVersion),
    /// The requested version was unknown; the latest snapshot was restored instead
    RestoredLatest(ConfigVersion),
    /// History is empty; the live configuration is unchanged
    NoSnapshotAvailable,
}

/// Live device configurations plus their snapshot history
#[derive(Debug)]
pub struct ConfigurationStore {
    config: EngineConfig,
    devices: DashMap<DeviceId, Arc<Mutex<DeviceState>>>,
    history: ConfigurationHistory,
}

impl ConfigurationStore {
    /// Store running with `config`, rejected if [`EngineConfig::validate`] fails
    pub fn new(config: EngineConfig) -> NetConfigResult<Self> {
        config.validate()?;
        Ok(Self::with_validated(config))
    }

    fn with_validated(config: EngineConfig) -> Self {
        Self {
            history: ConfigurationHistory::new(config.max_history),
            devices: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a device with its starting configuration
    ///
    /// Records an "Initial configuration" snapshot when the engine is
    /// configured to, and returns its version.
    pub fn register_device(
        &self,
        device_id: DeviceId,
        initial: DeviceConfiguration,
    ) -> NetConfigResult<Option<ConfigVersion>> {
        match self.devices.entry(device_id.clone()) {
            Entry::Occupied(_) => Err(NetConfigError::DeviceAlreadyRegistered(
                device_id.to_string(),
            )),
            Entry::Vacant(slot) => {
                let version = self.config.initial_snapshot.then(|| {
                    self.history
                        .record(&device_id, &initial, INITIAL_DESCRIPTION, SYSTEM_INIT_OPERATOR)
                        .version()
                });
                slot.insert(Arc::new(Mutex::new(DeviceState::new(initial))));
                info!(device = %device_id, "Registered device");
                Ok(version)
            }
        }
    }

    pub fn is_registered(&self, device_id: &DeviceId) -> bool {
        self.devices.contains_key(device_id)
    }

    /// Registered device ids, sorted
    pub fn devices(&self) -> Vec<DeviceId> {
        let mut ids: Vec<DeviceId> = self.devices.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    fn handle(&self, device_id: &DeviceId) -> NetConfigResult<Arc<Mutex<DeviceState>>> {
        self.devices
            .get(device_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| NetConfigError::DeviceNotFound(device_id.to_string()))
    }

    /// Wait for exclusive access to a device's live state
    pub(crate) async fn lock_device(
        &self,
        device_id: &DeviceId,
    ) -> NetConfigResult<OwnedMutexGuard<DeviceState>> {
        Ok(self.handle(device_id)?.lock_owned().await)
    }

    /// Record a snapshot of state the caller already holds locked
    pub(crate) fn record_locked(
        &self,
        device_id: &DeviceId,
        state: &DeviceState,
        description: impl Into<String>,
        operator: impl Into<String>,
    ) -> ConfigurationMemento {
        let memento = self
            .history
            .record(device_id, &state.configuration, description, operator);
        info!(
            device = %device_id,
            version = %memento.version(),
            description = memento.description(),
            "Saved configuration snapshot"
        );
        memento
    }

    /// Capture an unrecorded snapshot of state the caller already holds locked
    pub(crate) fn capture_locked(
        &self,
        device_id: &DeviceId,
        state: &DeviceState,
        description: impl Into<String>,
        operator: impl Into<String>,
    ) -> ConfigurationMemento {
        self.history
            .capture(device_id, &state.configuration, description, operator)
    }

    /// Snapshot the device's live configuration into its history
    pub async fn save_snapshot(
        &self,
        device_id: &DeviceId,
        description: impl Into<String>,
        operator: impl Into<String>,
    ) -> NetConfigResult<ConfigVersion> {
        let state = self.lock_device(device_id).await?;
        Ok(self
            .record_locked(device_id, &state, description, operator)
            .version())
    }

    /// Replace the device's live configuration with the memento's
    ///
    /// The memento must have been taken from the same device.
    pub async fn restore(
        &self,
        device_id: &DeviceId,
        memento: &ConfigurationMemento,
    ) -> NetConfigResult<()> {
        if memento.device_id() != device_id {
            return Err(NetConfigError::DeviceMismatch {
                device: device_id.to_string(),
                snapshot_device: memento.device_id().to_string(),
            });
        }
        let mut state = self.lock_device(device_id).await?;
        state.restore_from(memento);
        info!(device = %device_id, version = %memento.version(), "Restored configuration");
        Ok(())
    }

    /// Restore an exact version, failing when it is not in the device's history
    pub async fn restore_version(
        &self,
        device_id: &DeviceId,
        version: ConfigVersion,
    ) -> NetConfigResult<()> {
        let memento =
            self.by_version(device_id, version)
                .ok_or_else(|| NetConfigError::VersionNotFound {
                    device: device_id.to_string(),
                    version,
                })?;
        self.restore(device_id, &memento).await
    }

    /// Point-in-time rollback with fallback to the latest snapshot
    pub async fn rollback_to_version(
        &self,
        device_id: &DeviceId,
        version: ConfigVersion,
    ) -> NetConfigResult<EmergencyRollback> {
        let mut state = self.lock_device(device_id).await?;

        if let Some(memento) = self.by_version(device_id, version) {
            state.restore_from(&memento);
            info!(device = %device_id, %version, "Rolled back to requested version");
            return Ok(EmergencyRollback::RestoredVersion(version));
        }

        warn!(device = %device_id, %version, "Version not found, falling back to latest snapshot");
        match self.latest(device_id) {
            Some(memento) => {
                state.restore_from(&memento);
                info!(device = %device_id, version = %memento.version(), "Rolled back to latest snapshot");
                Ok(EmergencyRollback::RestoredLatest(memento.version()))
            }
            None => {
                warn!(device = %device_id, "No snapshot available for rollback");
                Ok(EmergencyRollback::NoSnapshotAvailable)
            }
        }
    }

    /// Restore the most recent snapshot
    pub async fn rollback_to_latest(&self, device_id: &DeviceId) -> NetConfigResult<ConfigVersion> {
        let mut state = self.lock_device(device_id).await?;
        let memento = self
            .latest(device_id)
            .ok_or_else(|| NetConfigError::NoSnapshotAvailable(device_id.to_string()))?;
        state.restore_from(&memento);
        info!(device = %device_id, version = %memento.version(), "Rolled back to latest snapshot");
        Ok(memento.version())
    }

    /// Deep copy of the device's live configuration
    pub async fn current_configuration(
        &self,
        device_id: &DeviceId,
    ) -> NetConfigResult<DeviceConfiguration> {
        Ok(self.lock_device(device_id).await?.configuration.clone())
    }

    pub async fn status(&self, device_id: &DeviceId) -> NetConfigResult<DeviceStatus> {
        Ok(self.lock_device(device_id).await?.status)
    }

    pub fn latest(&self, device_id: &DeviceId) -> Option<ConfigurationMemento> {
        self.history.latest(device_id)
    }

    pub fn by_version(
        &self,
        device_id: &DeviceId,
        version: ConfigVersion,
    ) -> Option<ConfigurationMemento> {
        self.history.by_version(device_id, version)
    }

    /// Snapshots oldest to newest, at most `max_history`
    pub fn history(&self, device_id: &DeviceId) -> Vec<ConfigurationMemento> {
        self.history.history(device_id)
    }

    pub fn history_after(
        &self,
        device_id: &DeviceId,
        after: DateTime<Utc>,
    ) -> Vec<ConfigurationMemento> {
        self.history.history_after(device_id, after)
    }

    /// Most recent pre-change backup in the device's history
    pub fn latest_pre_change_backup(&self, device_id: &DeviceId) -> Option<ConfigurationMemento> {
        self.history
            .latest_matching(device_id, ConfigurationMemento::is_pre_change_backup)
    }
}

impl Default for ConfigurationStore {
    fn default() -> Self {
        Self::with_validated(EngineConfig::default())
    }
}
