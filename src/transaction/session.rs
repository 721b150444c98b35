// Copyright (c) 2025 - Cowboy AI, Inc.
//! Device Sessions
//!
//! A [`DeviceSession`] holds a device exclusively for a run of incremental
//! changes. The first change captures a backup of the configuration as it was
//! when the session began; later changes reuse it. [`DeviceSession::commit`]
//! discards the backup, [`DeviceSession::rollback`] restores it.
//!
//! # Invariants
//!
//! - At most one session per device exists at a time (it owns the device lock)
//! - A backup exists iff an uncommitted change was made
//! - A session dropped without `commit` rolls back

use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::domain::{
    DeviceConfiguration, DeviceId, NetworkInterface, OperatingMode, RoutingRule, SecurityPolicy,
};
use crate::store::{ConfigVersion, ConfigurationMemento, ConfigurationStore, DeviceState};

/// Operator recorded on automatic session backups
pub const SYSTEM_AUTO_OPERATOR: &str = "SYSTEM_AUTO";

/// Exclusive, revertible access to one device
#[derive(Debug)]
pub struct DeviceSession {
    device_id: DeviceId,
    operator: String,
    store: Arc<ConfigurationStore>,
    state: OwnedMutexGuard<DeviceState>,
    backup: Option<ConfigurationMemento>,
}

impl DeviceSession {
    pub(crate) fn new(
        device_id: DeviceId,
        operator: String,
        store: Arc<ConfigurationStore>,
        state: OwnedMutexGuard<DeviceState>,
    ) -> Self {
        debug!(device = %device_id, operator = %operator, "Session started");
        Self {
            device_id,
            operator,
            store,
            state,
            backup: None,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Live configuration including uncommitted changes
    pub fn configuration(&self) -> &DeviceConfiguration {
        self.state.configuration()
    }

    /// Backup captured by the first uncommitted change, if any
    pub fn backup(&self) -> Option<&ConfigurationMemento> {
        self.backup.as_ref()
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        self.backup.is_some()
    }

    /// Apply an arbitrary change, capturing the backup first if needed
    pub fn update<R>(
        &mut self,
        operation: &str,
        change: impl FnOnce(&mut DeviceConfiguration) -> R,
    ) -> R {
        if self.backup.is_none() {
            let backup = self.store.capture_locked(
                &self.device_id,
                &self.state,
                format!("Auto-backup before {operation}"),
                SYSTEM_AUTO_OPERATOR,
            );
            debug!(device = %self.device_id, version = %backup.version(), "Session backup captured");
            self.backup = Some(backup);
        }
        debug!(device = %self.device_id, operation, "Session change");
        self.state.modify(change)
    }

    /// Insert or replace an interface, returning the replaced one
    pub fn update_interface(&mut self, interface: NetworkInterface) -> Option<NetworkInterface> {
        let operation = format!("interface {} update", interface.name);
        self.update(&operation, |config| config.upsert_interface(interface))
    }

    pub fn add_routing_rule(&mut self, rule: RoutingRule) {
        self.update("routing update", |config| config.routing_rules.push(rule));
    }

    pub fn add_security_policy(&mut self, policy: SecurityPolicy) {
        self.update("security policy update", |config| {
            config.security_policies.push(policy)
        });
    }

    pub fn set_qos_setting(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        self.update("QoS update", |config| {
            config.qos_settings.insert(key, value);
        });
    }

    pub fn set_monitoring(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        self.update("monitoring update", |config| {
            config.monitoring.insert(key, value);
        });
    }

    pub fn set_operating_mode(&mut self, mode: OperatingMode) {
        self.update("operating mode change", |config| config.operating_mode = mode);
    }

    /// Record the session's current configuration in the device history
    pub fn save_snapshot(&self, description: impl Into<String>) -> ConfigVersion {
        self.store
            .record_locked(&self.device_id, &self.state, description, self.operator.as_str())
            .version()
    }

    /// Keep every change made in this session
    pub fn commit(mut self) {
        if self.backup.take().is_some() {
            info!(device = %self.device_id, "Session committed");
        }
    }

    /// Revert to the configuration the session started with
    ///
    /// Returns `true` if there was anything to revert.
    pub fn rollback(mut self) -> bool {
        self.revert()
    }

    fn revert(&mut self) -> bool {
        match self.backup.take() {
            Some(backup) => {
                self.state.restore_from(&backup);
                info!(device = %self.device_id, version = %backup.version(), "Session rolled back");
                true
            }
            None => false,
        }
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        if self.backup.is_some() {
            warn!(device = %self.device_id, "Session dropped without commit, rolling back");
            self.revert();
        }
    }
}
