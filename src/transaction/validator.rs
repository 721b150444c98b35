// Copyright (c) 2025 - Cowboy AI, Inc.
//! Post-Mutation Validation
//!
//! The check a transactional apply runs against the changed configuration
//! before committing. Implementations may be slow (an external policy engine,
//! a device dry-run); the transaction manager bounds them with a deadline.

use async_trait::async_trait;

use crate::domain::{invariants, DeviceConfiguration, DeviceId, RuleViolation};

/// Business validation of a complete, post-mutation configuration
#[async_trait]
pub trait ConfigurationValidator: Send + Sync {
    /// Validate `configuration` for `device_id`
    ///
    /// # Returns
    /// - `Ok(())` if the configuration may be committed
    /// - `Err(violations)` listing every rule that failed
    async fn validate(
        &self,
        device_id: &DeviceId,
        configuration: &DeviceConfiguration,
    ) -> Result<(), Vec<RuleViolation>>;
}

/// Default validator: the deterministic rules in [`crate::domain::invariants`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BusinessRuleValidator;

#[async_trait]
impl ConfigurationValidator for BusinessRuleValidator {
    async fn validate(
        &self,
        _device_id: &DeviceId,
        configuration: &DeviceConfiguration,
    ) -> Result<(), Vec<RuleViolation>> {
        invariants::validate_configuration(configuration)
    }
}
