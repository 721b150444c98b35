// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration Mementos
//!
//! A [`ConfigurationMemento`] is a versioned snapshot of one device's full
//! configuration. Its fields are private and the configuration sits behind an
//! `Arc`, so a memento handed out of the history can be cloned cheaply and
//! never mutated. Restoring from it always produces a fresh deep copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::domain::{DeviceConfiguration, DeviceId};

/// Description prefix of the snapshot taken before a transactional apply
pub const BEFORE_PREFIX: &str = "Before: ";
/// Description prefix of the snapshot taken after a committed apply
pub const AFTER_PREFIX: &str = "After: ";

/// Globally unique, strictly increasing snapshot version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigVersion(u64);

impl ConfigVersion {
    pub fn new(version: u64) -> Self {
        Self(version)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Immutable snapshot of a device configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationMemento {
    device_id: DeviceId,
    version: ConfigVersion,
    configuration: Arc<DeviceConfiguration>,
    description: String,
    operator: String,
    created_at: DateTime<Utc>,
}

impl ConfigurationMemento {
    pub(crate) fn new(
        device_id: DeviceId,
        version: ConfigVersion,
        configuration: DeviceConfiguration,
        description: impl Into<String>,
        operator: impl Into<String>,
    ) -> Self {
        Self {
            device_id,
            version,
            configuration: Arc::new(configuration),
            description: description.into(),
            operator: operator.into(),
            created_at: Utc::now(),
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn version(&self) -> ConfigVersion {
        self.version
    }

    /// Read-only view of the captured configuration
    pub fn configuration(&self) -> &DeviceConfiguration {
        &self.configuration
    }

    /// Deep copy of the captured configuration
    pub fn to_configuration(&self) -> DeviceConfiguration {
        DeviceConfiguration::clone(&self.configuration)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this is the pre-change backup of a transactional apply
    pub fn is_pre_change_backup(&self) -> bool {
        self.description.starts_with(BEFORE_PREFIX)
    }
}

impl fmt::Display for ConfigurationMemento {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] by {} at {}",
            self.device_id,
            self.version,
            self.description,
            self.operator,
            self.created_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
