// Copyright (c) 2025 - Cowboy AI, Inc.
//! Transaction Manager and Session Integration Tests

mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cim_network_config::domain::{
    DeviceConfiguration, DeviceId, InterfaceStatus, OperatingMode, RuleViolation,
};
use cim_network_config::store::DeviceStatus;
use cim_network_config::transaction::{
    ConfigurationValidator, MaintenanceReport, SYSTEM_AUTO_OPERATOR,
};
use cim_network_config::{
    ApplyOutcome, EngineConfig, NetConfigError, RollbackReason, TransactionManager,
};
use fixtures::*;
use pretty_assertions::assert_eq;

/// Rejects every configuration
struct RejectAll;

#[async_trait]
impl ConfigurationValidator for RejectAll {
    async fn validate(
        &self,
        _device_id: &DeviceId,
        _configuration: &DeviceConfiguration,
    ) -> Result<(), Vec<RuleViolation>> {
        Err(vec![RuleViolation::EmptySettingKey { category: "QoS" }])
    }
}

/// Never answers within any reasonable deadline
struct Stalled;

#[async_trait]
impl ConfigurationValidator for Stalled {
    async fn validate(
        &self,
        _device_id: &DeviceId,
        _configuration: &DeviceConfiguration,
    ) -> Result<(), Vec<RuleViolation>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_forced_failure_restores_previous_configuration() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = TransactionManager::with_validator(Arc::clone(&store), Arc::new(RejectAll));
    let id = device_id(DEVICE_1);
    let before_call = store.current_configuration(&id).await.unwrap();

    let outcome = manager
        .apply_with_rollback(&id, upgraded_configuration(), "Upgrade", "ops")
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        ApplyOutcome::RolledBack {
            reason: RollbackReason::BusinessRules(_),
            ..
        }
    ));
    assert_eq!(store.current_configuration(&id).await.unwrap(), before_call);
    assert_eq!(store.status(&id).await.unwrap(), DeviceStatus::Online);
}

#[tokio::test]
async fn test_commit_records_before_and_after() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = manager_for(&store);
    let id = device_id(DEVICE_1);

    let outcome = manager
        .apply_with_rollback(&id, upgraded_configuration(), "Add eth1", "alice")
        .await
        .unwrap();

    let ApplyOutcome::Committed {
        version, before, ..
    } = outcome
    else {
        panic!("expected commit, got {outcome:?}");
    };
    assert!(before < version);

    let history = store.history(&id);
    let descriptions: Vec<&str> = history.iter().map(|m| m.description()).collect();
    assert_eq!(
        descriptions,
        vec!["Initial configuration", "Before: Add eth1", "After: Add eth1"]
    );
    assert_eq!(history[1].configuration(), &baseline_configuration());
    assert_eq!(history[2].configuration(), &upgraded_configuration());
    assert_eq!(history[2].operator(), "alice");
    assert_eq!(
        store.current_configuration(&id).await.unwrap().operating_mode,
        OperatingMode::HighPerformance
    );
}

#[tokio::test]
async fn test_business_rule_violations_roll_back() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = manager_for(&store);
    let id = device_id(DEVICE_1);

    let outcome = manager
        .apply_with_rollback(&id, broken_configuration(), "Bad routes", "ops")
        .await
        .unwrap();

    let ApplyOutcome::RolledBack {
        restored,
        reason: RollbackReason::BusinessRules(violations),
    } = outcome
    else {
        panic!("expected rollback, got {outcome:?}");
    };
    assert_eq!(violations.len(), 2);
    assert!(violations
        .iter()
        .any(|v| matches!(v, RuleViolation::DanglingRouteInterface { interface, .. } if interface == "eth9")));
    assert!(violations
        .iter()
        .any(|v| matches!(v, RuleViolation::UnreachableGateway { gateway, .. } if gateway == "172.31.0.1")));

    assert_eq!(
        store.by_version(&id, restored).unwrap().description(),
        "Before: Bad routes"
    );
    assert_eq!(
        store.current_configuration(&id).await.unwrap(),
        baseline_configuration()
    );
}

#[tokio::test]
async fn test_validation_timeout_rolls_back() {
    let store = store_with(
        EngineConfig::default().with_validation_timeout(Duration::from_millis(20)),
    );
    let id = device_id(DEVICE_1);
    store
        .register_device(id.clone(), baseline_configuration())
        .unwrap();
    let manager = TransactionManager::with_validator(Arc::clone(&store), Arc::new(Stalled));

    let outcome = manager
        .apply_with_rollback(&id, upgraded_configuration(), "Slow", "ops")
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        ApplyOutcome::RolledBack {
            reason: RollbackReason::Timeout { after_ms: 20 },
            ..
        }
    ));
    assert_eq!(
        store.current_configuration(&id).await.unwrap(),
        baseline_configuration()
    );
}

#[tokio::test]
async fn test_cancelled_apply_restores_previous_configuration() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = TransactionManager::with_validator(Arc::clone(&store), Arc::new(Stalled));
    let id = device_id(DEVICE_1);

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        manager.apply_with_rollback(&id, upgraded_configuration(), "Upgrade", "ops"),
    )
    .await;
    assert!(cancelled.is_err());

    assert_eq!(
        store.current_configuration(&id).await.unwrap(),
        baseline_configuration()
    );
    assert_eq!(store.status(&id).await.unwrap(), DeviceStatus::Online);
    let descriptions: Vec<String> = store
        .history(&id)
        .iter()
        .map(|m| m.description().to_string())
        .collect();
    assert_eq!(descriptions, vec!["Initial configuration", "Before: Upgrade"]);
}

#[tokio::test]
async fn test_aborted_apply_task_releases_device() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = TransactionManager::with_validator(Arc::clone(&store), Arc::new(Stalled));
    let id = device_id(DEVICE_1);

    let task = tokio::spawn({
        let manager = manager.clone();
        let id = id.clone();
        async move {
            manager
                .apply_with_rollback(&id, upgraded_configuration(), "Upgrade", "ops")
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    // The lock is free again and the next apply sees the original configuration
    let outcome = manager_for(&store)
        .apply_change(&id, "Retry", "ops", |config| {
            config.operating_mode = OperatingMode::Maintenance;
        })
        .await
        .unwrap();
    assert!(outcome.is_committed());
    let live = store.current_configuration(&id).await.unwrap();
    assert_eq!(live.interfaces, baseline_configuration().interfaces);
    assert_eq!(live.operating_mode, OperatingMode::Maintenance);
}

#[tokio::test]
async fn test_apply_script_commits() {
    let store = store_with(EngineConfig::default());
    let id = device_id(DEVICE_1);
    store
        .register_device(id.clone(), DeviceConfiguration::new())
        .unwrap();
    let manager = manager_for(&store);

    let outcome = manager
        .apply_script(&id, FULL_SCRIPT, "Baseline", "ops")
        .await
        .unwrap();
    assert!(outcome.is_committed(), "unexpected outcome: {outcome:?}");

    let live = store.current_configuration(&id).await.unwrap();
    assert_eq!(live.interfaces.len(), 2);
    assert_eq!(live.routing_rules.len(), 2);
    assert_eq!(live.security_policies.len(), 3);
    assert_eq!(live.interfaces["eth0"].status, InterfaceStatus::Up);
}

#[tokio::test]
async fn test_apply_script_builds_on_live_configuration() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = manager_for(&store);
    let id = device_id(DEVICE_1);

    let outcome = manager
        .apply_script(&id, "qos bandwidth eth0 2Gbps priority 9", "Boost", "ops")
        .await
        .unwrap();
    assert!(outcome.is_committed());

    let live = store.current_configuration(&id).await.unwrap();
    assert_eq!(live.interfaces["eth0"].bandwidth.mbps(), 2000);
    assert_eq!(live.routing_rules, baseline_configuration().routing_rules);
    assert_eq!(live.monitoring, baseline_configuration().monitoring);
}

#[tokio::test]
async fn test_apply_script_validation_failure_rolls_back() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = manager_for(&store);
    let id = device_id(DEVICE_1);

    let outcome = manager
        .apply_script(
            &id,
            "interface eth1 ip 10.0.1.1 subnet 255.255.255.0\nqos bandwidth eth5 500Mbps",
            "Broken",
            "ops",
        )
        .await
        .unwrap();

    let ApplyOutcome::RolledBack {
        reason: RollbackReason::Validation(errors),
        ..
    } = outcome
    else {
        panic!("expected validation rollback, got {outcome:?}");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "Line 2: Interface not found: eth5");
    assert_eq!(
        store.current_configuration(&id).await.unwrap(),
        baseline_configuration()
    );
}

#[tokio::test]
async fn test_apply_script_parse_error_touches_nothing() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = manager_for(&store);
    let id = device_id(DEVICE_1);

    let result = manager
        .apply_script(&id, "interface eth1\nfoo bar", "Typo", "ops")
        .await;

    assert!(matches!(result, Err(NetConfigError::Parse(ref e)) if e.line == 1));
    assert_eq!(store.history(&id).len(), 1);
}

#[tokio::test]
async fn test_session_lazy_backup_and_commit() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = manager_for(&store);
    let id = device_id(DEVICE_1);

    let mut session = manager.begin_session(&id, "bob").await.unwrap();
    assert!(!session.has_uncommitted_changes());

    session.set_qos_setting("priority_queues", "4");
    let backup_version = session.backup().unwrap().version();
    assert_eq!(session.backup().unwrap().operator(), SYSTEM_AUTO_OPERATOR);
    assert_eq!(
        session.backup().unwrap().description(),
        "Auto-backup before QoS update"
    );

    session.set_operating_mode(OperatingMode::Maintenance);
    assert_eq!(session.backup().unwrap().version(), backup_version);
    assert_eq!(
        session.backup().unwrap().configuration(),
        &baseline_configuration()
    );

    session.commit();

    let live = store.current_configuration(&id).await.unwrap();
    assert_eq!(live.qos_settings["priority_queues"], "4");
    assert_eq!(live.operating_mode, OperatingMode::Maintenance);
    // Session backups are not part of the recorded history
    assert_eq!(store.history(&id).len(), 1);
}

#[tokio::test]
async fn test_session_rollback() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = manager_for(&store);
    let id = device_id(DEVICE_1);

    let mut session = manager.begin_session(&id, "bob").await.unwrap();
    session.update_interface(interface("eth0", "192.168.1.2", "255.255.255.0"));
    session.set_monitoring("netflow", "on");
    assert!(session.rollback());

    assert_eq!(
        store.current_configuration(&id).await.unwrap(),
        baseline_configuration()
    );

    let untouched = manager.begin_session(&id, "bob").await.unwrap();
    assert!(!untouched.rollback());
}

#[tokio::test]
async fn test_dropped_session_rolls_back() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = manager_for(&store);
    let id = device_id(DEVICE_1);

    {
        let mut session = manager.begin_session(&id, "bob").await.unwrap();
        session.add_routing_rule(route("10.20.0.0/16", "192.168.1.254", Some("eth0")));
    }

    assert_eq!(
        store.current_configuration(&id).await.unwrap(),
        baseline_configuration()
    );
}

#[tokio::test]
async fn test_session_snapshot_and_exclusive_access() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = manager_for(&store);
    let id = device_id(DEVICE_1);

    let mut session = manager.begin_session(&id, "carol").await.unwrap();
    session.set_qos_setting("shaping", "on");
    let version = session.save_snapshot("Checkpoint");

    // A second writer waits until the session ends
    let blocked = tokio::time::timeout(
        Duration::from_millis(20),
        manager.begin_session(&id, "dave"),
    )
    .await;
    assert!(blocked.is_err());

    session.commit();

    let checkpoint = store.by_version(&id, version).unwrap();
    assert_eq!(checkpoint.operator(), "carol");
    assert_eq!(checkpoint.configuration().qos_settings["shaping"], "on");
}

#[tokio::test]
async fn test_maintenance_window_across_devices() {
    let store = store_with_devices(&[DEVICE_1, DEVICE_2, DEVICE_3]);
    let manager = manager_for(&store);

    // Break one device so the shared change fails business rules there
    {
        let mut session = manager
            .begin_session(&device_id(DEVICE_3), "ops")
            .await
            .unwrap();
        session.update("drop eth0", |config| {
            config.interfaces.clear();
        });
        session.commit();
    }

    let ids = [
        device_id(DEVICE_1),
        device_id(DEVICE_2),
        device_id(DEVICE_3),
        device_id("unknown-01"),
    ];
    let report: MaintenanceReport = manager
        .apply_to_devices(&ids, "Security hardening", "noc", |config| {
            config.monitoring.insert("syslog".into(), "10.0.0.5".into());
        })
        .await;

    let committed: Vec<&str> = report.committed.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(committed, vec![DEVICE_1, DEVICE_2]);
    assert_eq!(report.rolled_back.len(), 1);
    assert_eq!(report.rolled_back[0].0.as_str(), DEVICE_3);
    assert_eq!(report.failed.len(), 1);
    assert!(!report.is_clean());

    let d3 = store
        .current_configuration(&device_id(DEVICE_3))
        .await
        .unwrap();
    assert!(!d3.monitoring.contains_key("syslog"));
    let d1 = store
        .current_configuration(&device_id(DEVICE_1))
        .await
        .unwrap();
    assert_eq!(d1.monitoring["syslog"], "10.0.0.5");
}

#[tokio::test]
async fn test_outcome_serializes_for_operators() {
    let store = store_with_devices(&[DEVICE_1]);
    let manager = manager_for(&store);

    let outcome = manager
        .apply_with_rollback(&device_id(DEVICE_1), broken_configuration(), "Bad", "ops")
        .await
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "rolled_back");
    assert_eq!(json["reason"]["kind"], "business_rules");
    assert_eq!(json["reason"]["details"][0]["rule"], "dangling_route_interface");
}
