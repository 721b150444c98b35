// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bounded, Versioned Snapshot History
//!
//! # Invariants
//!
//! - Versions come from one counter shared by every device and are never reused
//! - Each device's history is ordered oldest to newest by version
//! - A device never holds more than `max_history` snapshots; the oldest goes first
//!
//! Versions are allocated while the device's history entry is locked, so two
//! concurrent snapshots of one device land in version order. Different devices
//! do not block each other.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::memento::{ConfigVersion, ConfigurationMemento};
use crate::domain::{DeviceConfiguration, DeviceId};

/// Per-device snapshot history with a global version counter
#[derive(Debug)]
pub struct ConfigurationHistory {
    max_history: usize,
    entries: DashMap<DeviceId, VecDeque<ConfigurationMemento>>,
    last_version: AtomicU64,
}

impl ConfigurationHistory {
    /// History keeping at most `max_history` snapshots per device (at least one)
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            entries: DashMap::new(),
            last_version: AtomicU64::new(0),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    fn next_version(&self) -> ConfigVersion {
        ConfigVersion::new(self.last_version.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Capture a snapshot with a fresh version without recording it
    pub fn capture(
        &self,
        device_id: &DeviceId,
        configuration: &DeviceConfiguration,
        description: impl Into<String>,
        operator: impl Into<String>,
    ) -> ConfigurationMemento {
        ConfigurationMemento::new(
            device_id.clone(),
            self.next_version(),
            configuration.clone(),
            description,
            operator,
        )
    }

    /// Capture a snapshot and append it to the device's history
    pub fn record(
        &self,
        device_id: &DeviceId,
        configuration: &DeviceConfiguration,
        description: impl Into<String>,
        operator: impl Into<String>,
    ) -> ConfigurationMemento {
        let mut history = self.entries.entry(device_id.clone()).or_default();
        let memento = self.capture(device_id, configuration, description, operator);
        history.push_back(memento.clone());

        while history.len() > self.max_history {
            if let Some(evicted) = history.pop_front() {
                debug!(
                    device = %device_id,
                    version = %evicted.version(),
                    "Evicted oldest snapshot"
                );
            }
        }

        memento
    }

    pub fn latest(&self, device_id: &DeviceId) -> Option<ConfigurationMemento> {
        self.entries.get(device_id)?.back().cloned()
    }

    pub fn by_version(
        &self,
        device_id: &DeviceId,
        version: ConfigVersion,
    ) -> Option<ConfigurationMemento> {
        self.entries
            .get(device_id)?
            .iter()
            .find(|m| m.version() == version)
            .cloned()
    }

    /// Most recent snapshot matching `predicate`
    pub fn latest_matching<P>(
        &self,
        device_id: &DeviceId,
        predicate: P,
    ) -> Option<ConfigurationMemento>
    where
        P: Fn(&ConfigurationMemento) -> bool,
    {
        self.entries
            .get(device_id)?
            .iter()
            .rev()
            .find(|m| predicate(*m))
            .cloned()
    }

    /// Snapshots oldest to newest
    pub fn history(&self, device_id: &DeviceId) -> Vec<ConfigurationMemento> {
        self.entries
            .get(device_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshots created strictly after `after`, oldest to newest
    pub fn history_after(
        &self,
        device_id: &DeviceId,
        after: DateTime<Utc>,
    ) -> Vec<ConfigurationMemento> {
        self.entries
            .get(device_id)
            .map(|h| h.iter().filter(|m| m.created_at() > after).cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, device_id: &DeviceId) -> usize {
        self.entries.get(device_id).map_or(0, |h| h.len())
    }

    pub fn is_empty(&self, device_id: &DeviceId) -> bool {
        self.len(device_id) == 0
    }
}

impl Default for ConfigurationHistory {
    fn default() -> Self {
        Self::new(50)
    }
}
