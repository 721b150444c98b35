// Copyright (c) 2025 - Cowboy AI, Inc.
//! Transactional Configuration Changes
//!
//! # Apply With Rollback
//!
//! ```text
//! lock device
//!   → snapshot "Before: <description>"
//!   → mutate live configuration (or interpret a script into it)
//!   → business validation (with deadline)
//!   → ok:   snapshot "After: <description>", device Online  → Committed
//!   → fail: restore "Before" snapshot, device Online         → RolledBack
//! unlock device
//! ```
//!
//! The device stays locked for the whole sequence, so no other writer can
//! observe or interleave with a half-applied change. A failure never escapes
//! as an error: the caller receives [`ApplyOutcome::RolledBack`] once the
//! live configuration is back to exactly what it was before the call. An
//! apply whose future is dropped part way (a caller deadline, `select!`, an
//! aborted task) restores the "Before" snapshot before the lock is released.
//!
//! # Sessions
//!
//! [`TransactionManager::begin_session`] hands out a [`DeviceSession`] for
//! incremental changes with explicit commit or rollback.

pub mod session;
pub mod validator;

pub use session::{DeviceSession, SYSTEM_AUTO_OPERATOR};
pub use validator::{BusinessRuleValidator, ConfigurationValidator};

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::domain::{DeviceConfiguration, DeviceId, RuleViolation};
use crate::dsl::{parse, validate_and_interpret, Diagnostic, InterpretationContext, Statement};
use crate::errors::NetConfigResult;
use crate::store::{
    ConfigVersion, ConfigurationMemento, ConfigurationStore, DeviceState, DeviceStatus,
    AFTER_PREFIX, BEFORE_PREFIX,
};

/// Why a transactional apply was rolled back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "details", rename_all = "snake_case")]
pub enum RollbackReason {
    /// The script failed validation; nothing was interpreted
    Validation(Vec<Diagnostic>),
    /// The changed configuration broke business rules
    BusinessRules(Vec<RuleViolation>),
    /// Business validation did not finish within the deadline
    Timeout { after_ms: u64 },
}

/// Result of a transactional apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// Change is live and recorded
    Committed {
        /// Version of the "After" snapshot
        version: ConfigVersion,
        /// Version of the "Before" snapshot
        before: ConfigVersion,
        /// Advisory diagnostics from script validation
        warnings: Vec<Diagnostic>,
    },
    /// Change was undone
    RolledBack {
        /// Version of the snapshot the device was restored to
        restored: ConfigVersion,
        reason: RollbackReason,
    },
}

impl ApplyOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Per-device results of a change applied across many devices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub committed: Vec<(DeviceId, ConfigVersion)>,
    pub rolled_back: Vec<(DeviceId, RollbackReason)>,
    /// Devices the change could not be attempted on (e.g. not registered)
    pub failed: Vec<(DeviceId, String)>,
}

impl MaintenanceReport {
    /// Whether every device committed
    pub fn is_clean(&self) -> bool {
        self.rolled_back.is_empty() && self.failed.is_empty()
    }
}

/// Outcome of the mutation step, before business validation
type MutationResult = Result<Vec<Diagnostic>, Vec<Diagnostic>>;

/// Orchestrates apply-with-rollback over a [`ConfigurationStore`]
#[derive(Clone)]
pub struct TransactionManager {
    store: Arc<ConfigurationStore>,
    validator: Arc<dyn ConfigurationValidator>,
}

impl TransactionManager {
    /// Manager validating with [`BusinessRuleValidator`]
    pub fn new(store: Arc<ConfigurationStore>) -> Self {
        Self::with_validator(store, Arc::new(BusinessRuleValidator))
    }

    pub fn with_validator(
        store: Arc<ConfigurationStore>,
        validator: Arc<dyn ConfigurationValidator>,
    ) -> Self {
        Self { store, validator }
    }

    pub fn store(&self) -> &Arc<ConfigurationStore> {
        &self.store
    }

    /// Take exclusive hold of a device for incremental changes
    pub async fn begin_session(
        &self,
        device_id: &DeviceId,
        operator: impl Into<String>,
    ) -> NetConfigResult<DeviceSession> {
        let state = self.store.lock_device(device_id).await?;
        Ok(DeviceSession::new(
            device_id.clone(),
            operator.into(),
            Arc::clone(&self.store),
            state,
        ))
    }

    /// Replace a device's configuration, rolling back if validation fails
    ///
    /// Interfaces, routing rules, security policies, QoS settings and
    /// operating mode are taken from `new_config`. Monitoring settings are
    /// left as they are.
    pub async fn apply_with_rollback(
        &self,
        device_id: &DeviceId,
        new_config: DeviceConfiguration,
        description: &str,
        operator: &str,
    ) -> NetConfigResult<ApplyOutcome> {
        self.apply_change(device_id, description, operator, move |config| {
            replace_categories(config, new_config)
        })
        .await
    }

    /// Apply an in-place change to a device, rolling back if validation fails
    pub async fn apply_change<F>(
        &self,
        device_id: &DeviceId,
        description: &str,
        operator: &str,
        change: F,
    ) -> NetConfigResult<ApplyOutcome>
    where
        F: FnOnce(&mut DeviceConfiguration) + Send,
    {
        self.run(device_id, description, operator, move |config| {
            change(config);
            Ok(Vec::new())
        })
        .await
    }

    /// Parse a script and apply it to a device transactionally
    ///
    /// A script that does not parse is returned as an error before the device
    /// is touched. A script that fails validation rolls back with
    /// [`RollbackReason::Validation`].
    pub async fn apply_script(
        &self,
        device_id: &DeviceId,
        script: &str,
        description: &str,
        operator: &str,
    ) -> NetConfigResult<ApplyOutcome> {
        let statements = parse(script)?;
        self.run(device_id, description, operator, move |config| {
            interpret_into(&statements, config)
        })
        .await
    }

    /// Apply the same change to many devices concurrently
    ///
    /// Each device runs its own transaction; a device that fails rolls back
    /// without affecting the others.
    pub async fn apply_to_devices<F>(
        &self,
        device_ids: &[DeviceId],
        description: &str,
        operator: &str,
        change: F,
    ) -> MaintenanceReport
    where
        F: Fn(&mut DeviceConfiguration) + Sync,
    {
        let change = &change;
        let results = join_all(device_ids.iter().map(|id| async move {
            let outcome = self
                .run(id, description, operator, |config| {
                    change(config);
                    Ok(Vec::new())
                })
                .await;
            (id.clone(), outcome)
        }))
        .await;

        let mut report = MaintenanceReport::default();
        for (id, outcome) in results {
            match outcome {
                Ok(ApplyOutcome::Committed { version, .. }) => report.committed.push((id, version)),
                Ok(ApplyOutcome::RolledBack { reason, .. }) => report.rolled_back.push((id, reason)),
                Err(err) => report.failed.push((id, err.to_string())),
            }
        }

        info!(
            committed = report.committed.len(),
            rolled_back = report.rolled_back.len(),
            failed = report.failed.len(),
            "Maintenance window complete"
        );
        report
    }

    async fn run<F>(
        &self,
        device_id: &DeviceId,
        description: &str,
        operator: &str,
        mutate: F,
    ) -> NetConfigResult<ApplyOutcome>
    where
        F: FnOnce(&mut DeviceConfiguration) -> MutationResult + Send,
    {
        let span = info_span!(
            "apply",
            device = %device_id,
            transaction_id = %Uuid::now_v7()
        );

        async move {
            let state = self.store.lock_device(device_id).await?;
            let pending = self.begin(device_id, state, description, operator);
            Ok(self.transact(device_id, pending, description, operator, mutate).await)
        }
        .instrument(span)
        .await
    }

    fn begin(
        &self,
        device_id: &DeviceId,
        mut state: OwnedMutexGuard<DeviceState>,
        description: &str,
        operator: &str,
    ) -> PendingApply {
        let before = self.store.record_locked(
            device_id,
            &state,
            format!("{BEFORE_PREFIX}{description}"),
            operator,
        );
        state.set_status(DeviceStatus::Configuring);
        debug!(before = %before.version(), "Pre-change backup created");
        PendingApply {
            state,
            before,
            resolved: false,
        }
    }

    async fn transact<F>(
        &self,
        device_id: &DeviceId,
        mut pending: PendingApply,
        description: &str,
        operator: &str,
        mutate: F,
    ) -> ApplyOutcome
    where
        F: FnOnce(&mut DeviceConfiguration) -> MutationResult + Send,
    {
        let warnings = match pending.state.modify(mutate) {
            Ok(warnings) => warnings,
            Err(errors) => return pending.roll_back(RollbackReason::Validation(errors)),
        };

        let deadline = self.store.config().validation_timeout();
        let verdict = timeout(
            deadline,
            self.validator.validate(device_id, pending.state.configuration()),
        )
        .await;

        match verdict {
            Ok(Ok(())) => {
                let after = self.store.record_locked(
                    device_id,
                    &pending.state,
                    format!("{AFTER_PREFIX}{description}"),
                    operator,
                );
                pending.commit(after.version(), warnings)
            }
            Ok(Err(violations)) => pending.roll_back(RollbackReason::BusinessRules(violations)),
            Err(_) => pending.roll_back(RollbackReason::Timeout {
                after_ms: self.store.config().validation_timeout_ms,
            }),
        }
    }
}

/// A locked device between its "Before" snapshot and the commit or rollback
///
/// Dropping it unresolved (the apply future was cancelled) restores the
/// "Before" snapshot before the device lock is released.
struct PendingApply {
    state: OwnedMutexGuard<DeviceState>,
    before: ConfigurationMemento,
    resolved: bool,
}

impl PendingApply {
    fn commit(mut self, version: ConfigVersion, warnings: Vec<Diagnostic>) -> ApplyOutcome {
        self.state.set_status(DeviceStatus::Online);
        self.resolved = true;
        info!(%version, "Configuration committed");
        ApplyOutcome::Committed {
            version,
            before: self.before.version(),
            warnings,
        }
    }

    fn roll_back(mut self, reason: RollbackReason) -> ApplyOutcome {
        self.state.restore_from(&self.before);
        self.resolved = true;
        warn!(restored = %self.before.version(), reason = ?reason, "Configuration rolled back");
        ApplyOutcome::RolledBack {
            restored: self.before.version(),
            reason,
        }
    }
}

impl Drop for PendingApply {
    fn drop(&mut self) {
        if !self.resolved {
            self.state.restore_from(&self.before);
            warn!(
                device = %self.before.device_id(),
                restored = %self.before.version(),
                "Apply cancelled, configuration rolled back"
            );
        }
    }
}

/// Take every category but monitoring from `new_config`
fn replace_categories(config: &mut DeviceConfiguration, new_config: DeviceConfiguration) {
    config.interfaces = new_config.interfaces;
    config.routing_rules = new_config.routing_rules;
    config.security_policies = new_config.security_policies;
    config.qos_settings = new_config.qos_settings;
    config.operating_mode = new_config.operating_mode;
}

/// Run the two-pass interpreter against a live configuration
fn interpret_into(statements: &[Statement], config: &mut DeviceConfiguration) -> MutationResult {
    let mut ctx = InterpretationContext::from_configuration(config);
    match validate_and_interpret(statements, &mut ctx) {
        Ok(()) => {
            ctx.apply_to(config);
            Ok(ctx.warnings().to_vec())
        }
        Err(failure) => Err(failure.errors),
    }
}
