// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Configuration History

use std::sync::Arc;

use cim_network_config::domain::{
    DeviceConfiguration, DeviceId, Ipv4Cidr, Metric, OperatingMode, RoutingRule, RuleViolation,
};
use cim_network_config::store::{ConfigurationHistory, DeviceStatus};
use cim_network_config::{
    ApplyOutcome, ConfigurationStore, EngineConfig, RollbackReason, TransactionManager,
};
use proptest::prelude::*;

use super::strategies::interpreted_configuration;

fn device(n: u8) -> DeviceId {
    DeviceId::new(format!("device-{n}")).unwrap()
}

/// Configuration distinguishable by its QoS settings
fn tagged_configuration(tag: usize) -> DeviceConfiguration {
    DeviceConfiguration::new().with_qos_setting("tag", tag.to_string())
}

fn store_with(id: &DeviceId, initial: DeviceConfiguration) -> Arc<ConfigurationStore> {
    let store = Arc::new(ConfigurationStore::new(EngineConfig::default()).unwrap());
    store.register_device(id.clone(), initial).unwrap();
    store
}

proptest! {
    /// Property: History never exceeds its bound and keeps the newest entries
    #[test]
    fn prop_history_is_bounded(max in 1usize..10, snapshots in 0usize..40) {
        let history = ConfigurationHistory::new(max);
        let id = device(0);

        for n in 0..snapshots {
            history.record(&id, &tagged_configuration(n), format!("s{n}"), "ops");
        }

        let kept = history.history(&id);
        prop_assert_eq!(kept.len(), snapshots.min(max));
        let expected: Vec<String> = (snapshots.saturating_sub(max)..snapshots)
            .map(|n| format!("s{n}"))
            .collect();
        let actual: Vec<String> = kept.iter().map(|m| m.description().to_string()).collect();
        prop_assert_eq!(actual, expected);
    }

    /// Property: Versions strictly increase in assignment order across devices
    #[test]
    fn prop_versions_strictly_increase(devices in prop::collection::vec(0u8..5, 1..60)) {
        let history = ConfigurationHistory::new(100);

        let versions: Vec<_> = devices
            .iter()
            .map(|n| history.record(&device(*n), &DeviceConfiguration::new(), "snap", "ops").version())
            .collect();

        prop_assert!(versions.windows(2).all(|w| w[0] < w[1]));
        for n in 0u8..5 {
            let per_device = history.history(&device(n));
            prop_assert!(per_device.windows(2).all(|w| w[0].version() < w[1].version()));
        }
    }

    /// Property: Restoring a snapshot reproduces the snapshotted configuration
    ///
    /// Interfaces, routes and policies come from an interpreted script, so the
    /// snapshot must carry every category, not just device-level settings.
    #[test]
    fn prop_restore_round_trip(original in interpreted_configuration()) {
        tokio_test::block_on(async {
            let id = device(1);
            let store = store_with(&id, original.clone());
            let version = store.save_snapshot(&id, "Known good", "ops").await.unwrap();

            let cleared = TransactionManager::new(Arc::clone(&store))
                .apply_change(&id, "Clear everything", "ops", |config| {
                    *config = DeviceConfiguration::new();
                })
                .await
                .unwrap();
            prop_assert!(cleared.is_committed());
            prop_assert_eq!(store.current_configuration(&id).await.unwrap(), DeviceConfiguration::new());

            store.restore_version(&id, version).await.unwrap();

            prop_assert_eq!(store.current_configuration(&id).await.unwrap(), original);
            prop_assert_eq!(store.status(&id).await.unwrap(), DeviceStatus::Online);
            Ok(())
        })?;
    }

    /// Property: A rolled-back apply leaves the configuration exactly as it was
    ///
    /// The change rewrites every category before adding a route through a
    /// missing interface, so business validation always rejects it.
    #[test]
    fn prop_rollback_restores_exact_configuration(
        original in interpreted_configuration(),
        tag in 1000usize..2000,
    ) {
        tokio_test::block_on(async {
            let id = device(2);
            let store = store_with(&id, original.clone());

            let outcome = TransactionManager::new(Arc::clone(&store))
                .apply_change(&id, "Doomed", "ops", move |config| {
                    config.interfaces.clear();
                    config.security_policies.clear();
                    config.qos_settings.insert("tag".to_string(), tag.to_string());
                    config.monitoring.clear();
                    config.operating_mode = OperatingMode::Maintenance;
                    config.routing_rules.push(RoutingRule {
                        destination: Ipv4Cidr::new("192.0.2.0/24").unwrap(),
                        gateway: "192.0.2.1".parse().unwrap(),
                        interface: Some("eth9".to_string()),
                        metric: Metric::default(),
                    });
                })
                .await
                .unwrap();

            let rolled_back_on_dangling_route = matches!(
                &outcome,
                ApplyOutcome::RolledBack { reason: RollbackReason::BusinessRules(violations), .. }
                    if violations.iter().any(|v| matches!(
                        v,
                        RuleViolation::DanglingRouteInterface { interface, .. } if interface == "eth9"
                    ))
            );
            prop_assert!(rolled_back_on_dangling_route, "Unexpected outcome: {:?}", outcome);
            prop_assert_eq!(store.current_configuration(&id).await.unwrap(), original);
            prop_assert_eq!(store.status(&id).await.unwrap(), DeviceStatus::Online);
            Ok(())
        })?;
    }
}
