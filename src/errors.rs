// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for network configuration operations

use thiserror::Error;

use crate::dsl::ParseError;
use crate::store::ConfigVersion;

/// Errors that can occur in configuration store and transaction operations
///
/// Validation problems found in a script and business rule failures during a
/// transactional apply are not errors: they are reported through
/// [`crate::dsl::Diagnostic`] and [`crate::transaction::ApplyOutcome`].
#[derive(Debug, Error)]
pub enum NetConfigError {
    /// Script could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Device identifier is malformed
    #[error("Invalid device id: {0}")]
    InvalidDeviceId(String),

    /// Device is not registered with the store
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Device is already registered with the store
    #[error("Device already registered: {0}")]
    DeviceAlreadyRegistered(String),

    /// Snapshot version does not exist in the device history
    #[error("Version {version} not found for device {device}")]
    VersionNotFound {
        device: String,
        version: ConfigVersion,
    },

    /// Snapshot belongs to a different device
    #[error("Snapshot of device {snapshot_device} cannot be restored onto {device}")]
    DeviceMismatch {
        device: String,
        snapshot_device: String,
    },

    /// Device history holds no snapshot to restore
    #[error("No snapshot available for device {0}")]
    NoSnapshotAvailable(String),

    /// Engine configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for configuration operations
pub type NetConfigResult<T> = Result<T, NetConfigError>;
