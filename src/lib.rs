// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network configuration components for the Composable Information Machine
//!
//! This crate turns a small line-oriented configuration language into
//! validated device configuration, and keeps every device's configuration in
//! a versioned store with apply-or-rollback semantics.
//!
//! ```text
//! script → dsl::parse → dsl::validate_and_interpret → TransactionManager
//!                                                         ↓
//!                                  ConfigurationStore (live state + history)
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cim_network_config::{
//!     ConfigurationStore, DeviceConfiguration, DeviceId, EngineConfig, TransactionManager,
//! };
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(ConfigurationStore::new(EngineConfig::default()).unwrap());
//! let device = DeviceId::new("edge-01").unwrap();
//! store.register_device(device.clone(), DeviceConfiguration::new()).unwrap();
//!
//! let manager = TransactionManager::new(Arc::clone(&store));
//! let outcome = manager
//!     .apply_script(
//!         &device,
//!         "interface eth0 ip 192.168.1.1 subnet 255.255.255.0 status UP",
//!         "Bring up uplink",
//!         "ops",
//!     )
//!     .await
//!     .unwrap();
//!
//! assert!(outcome.is_committed());
//! assert_eq!(store.history(&device).len(), 3);
//! # });
//! ```

pub mod config;
pub mod domain;
pub mod dsl;
pub mod errors;
pub mod store;
pub mod transaction;

// Re-export commonly used types
pub use config::EngineConfig;
pub use domain::{DeviceConfiguration, DeviceId};
pub use dsl::{parse, validate_and_interpret, InterpretationContext, ParseError};
pub use errors::{NetConfigError, NetConfigResult};
pub use store::{ConfigVersion, ConfigurationMemento, ConfigurationStore, EmergencyRollback};
pub use transaction::{ApplyOutcome, DeviceSession, RollbackReason, TransactionManager};
