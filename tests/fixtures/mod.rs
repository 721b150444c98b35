// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-network-config
//!
//! Deterministic scripts, devices and configurations shared by the
//! integration tests.
//!
//! # Design Principles
//! - Fixtures build every device and configuration the tests use
//! - Scripts are constants so failing lines are easy to find
//! - Stores are created fresh per test; nothing is shared between tests

#![allow(dead_code)]

use std::sync::Arc;

use cim_network_config::domain::{
    DeviceConfiguration, DeviceId, InterfaceStatus, Metric, NetworkInterface, OperatingMode,
    PolicyAction, RoutingRule, SecurityPolicy, SubnetMask,
};
use cim_network_config::{ConfigurationStore, EngineConfig, TransactionManager};

pub const DEVICE_1: &str = "core-router-01";
pub const DEVICE_2: &str = "edge-switch-01";
pub const DEVICE_3: &str = "firewall-01";

/// Interface plus a route over it
pub const UPLINK_SCRIPT: &str = "\
interface eth0 ip 192.168.1.1 subnet 255.255.255.0 status UP
route add 10.0.0.0/24 via 192.168.1.254 dev eth0 metric 5";

/// Every command family, with comments and blank lines
pub const FULL_SCRIPT: &str = "\
# Core router baseline
interface eth0 ip 192.168.1.1 subnet 255.255.255.0 status UP mtu 1500
interface eth1 ip 10.0.1.1 subnet 255.255.255.0 status UP mtu 9000

route add 0.0.0.0/0 via 192.168.1.254 dev eth0
route add 172.16.0.0/16 via 10.0.1.254 dev eth1 metric 10

security policy web_access ALLOW protocol TCP from any to 192.168.1.100 port 80
security policy ssh_mgmt ALLOW protocol TCP from 10.0.1.0/24 port 22 on eth1
security policy deny_rest DENY from any to any

qos bandwidth eth0 1000Mbps priority 5
qos bandwidth eth1 10Gbps priority 3";

pub fn device_id(id: &str) -> DeviceId {
    DeviceId::new(id).expect("Invalid device id in test fixture")
}

pub fn interface(name: &str, ip: &str, mask: &str) -> NetworkInterface {
    NetworkInterface::new(
        name,
        ip.parse().expect("Invalid IP in test fixture"),
        SubnetMask::new(mask).expect("Invalid mask in test fixture"),
    )
}

pub fn route(destination: &str, gateway: &str, dev: Option<&str>) -> RoutingRule {
    RoutingRule {
        destination: destination.parse().expect("Invalid destination in test fixture"),
        gateway: gateway.parse().expect("Invalid gateway in test fixture"),
        interface: dev.map(str::to_string),
        metric: Metric::default(),
    }
}

/// A configuration that passes every business rule
pub fn baseline_configuration() -> DeviceConfiguration {
    DeviceConfiguration::new()
        .with_interface(
            interface("eth0", "192.168.1.1", "255.255.255.0").with_status(InterfaceStatus::Up),
        )
        .with_route(route("10.0.0.0/24", "192.168.1.254", Some("eth0")))
        .with_security_policy(SecurityPolicy::new("allow_mgmt", PolicyAction::Allow))
        .with_qos_setting("priority_queues", "8")
        .with_monitoring("snmp", "enabled")
}

/// A valid change to the baseline
pub fn upgraded_configuration() -> DeviceConfiguration {
    baseline_configuration()
        .with_interface(interface("eth1", "10.0.1.1", "255.255.255.0"))
        .with_route(route("172.16.0.0/16", "10.0.1.254", Some("eth1")))
        .with_qos_setting("priority_queues", "16")
        .with_operating_mode(OperatingMode::HighPerformance)
}

/// A change that breaks the route-interface and gateway rules
pub fn broken_configuration() -> DeviceConfiguration {
    baseline_configuration()
        .with_route(route("10.9.0.0/16", "192.168.1.254", Some("eth9")))
        .with_route(route("10.8.0.0/16", "172.31.0.1", Some("eth0")))
}

pub fn store_with(config: EngineConfig) -> Arc<ConfigurationStore> {
    Arc::new(ConfigurationStore::new(config).expect("Invalid engine config in test fixture"))
}

/// Store with the given devices registered on the baseline configuration
pub fn store_with_devices(ids: &[&str]) -> Arc<ConfigurationStore> {
    let store = store_with(EngineConfig::default());
    for id in ids {
        store
            .register_device(device_id(id), baseline_configuration())
            .expect("Duplicate device in test fixture");
    }
    store
}

pub fn manager_for(store: &Arc<ConfigurationStore>) -> TransactionManager {
    TransactionManager::new(Arc::clone(store))
}
