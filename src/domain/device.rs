// Copyright (c) 2025 - Cowboy AI, Inc.
//! Device Configuration Model
//!
//! The five configuration categories a device carries (interfaces, routing
//! rules, security policies, QoS settings, monitoring settings) plus its
//! operating mode. `DeviceConfiguration` is plain owned data: cloning it is a
//! deep copy, which is what snapshots and restores rely on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use super::network::{
    Bandwidth, Endpoint, InterfaceStatus, Ipv4Cidr, Metric, Mtu, Port, PolicyAction, Priority,
    Protocol, SubnetMask,
};
use crate::errors::NetConfigError;

/// Device identifier
///
/// Invariants:
/// - Non-empty after trimming
/// - No whitespace (device ids appear in log lines and CLI arguments)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Result<Self, NetConfigError> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(NetConfigError::InvalidDeviceId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = NetConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A configured network interface, keyed by name within a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub name: String,
    pub ip_address: Ipv4Addr,
    pub subnet: SubnetMask,
    pub status: InterfaceStatus,
    pub mtu: Mtu,
    pub bandwidth: Bandwidth,
    pub priority: Priority,
}

impl NetworkInterface {
    /// Interface with default status, MTU, bandwidth and priority
    pub fn new(name: impl Into<String>, ip_address: Ipv4Addr, subnet: SubnetMask) -> Self {
        Self {
            name: name.into(),
            ip_address,
            subnet,
            status: InterfaceStatus::default(),
            mtu: Mtu::default(),
            bandwidth: Bandwidth::default(),
            priority: Priority::default(),
        }
    }

    pub fn with_status(mut self, status: InterfaceStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_mtu(mut self, mtu: Mtu) -> Self {
        self.mtu = mtu;
        self
    }
}

impl fmt::Display for NetworkInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}/{} [{}] MTU:{} BW:{} P:{}",
            self.name, self.ip_address, self.subnet, self.status, self.mtu, self.bandwidth, self.priority
        )
    }
}

/// Static route. Appended by route commands, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub destination: Ipv4Cidr,
    pub gateway: Ipv4Addr,
    pub interface: Option<String>,
    pub metric: Metric,
}

impl fmt::Display for RoutingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Route: {} -> {} via {} (metric: {})",
            self.destination,
            self.gateway,
            self.interface.as_deref().unwrap_or("default"),
            self.metric
        )
    }
}

/// Firewall-style policy. Appended by security commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityPolicy {
    pub name: String,
    pub action: PolicyAction,
    pub protocol: Option<Protocol>,
    pub source: Option<Endpoint>,
    pub destination: Option<Endpoint>,
    pub port: Option<Port>,
    pub interface: Option<String>,
}

impl SecurityPolicy {
    pub fn new(name: impl Into<String>, action: PolicyAction) -> Self {
        Self {
            name: name.into(),
            action,
            protocol: None,
            source: None,
            destination: None,
            port: None,
            interface: None,
        }
    }
}

/// Device-wide operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingMode {
    #[default]
    Normal,
    HighPerformance,
    Maintenance,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::HighPerformance => write!(f, "HIGH_PERFORMANCE"),
            Self::Maintenance => write!(f, "MAINTENANCE"),
        }
    }
}

/// Full configuration of one device
///
/// `BTreeMap` keeps iteration order stable, so two equal configurations
/// also serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfiguration {
    pub interfaces: BTreeMap<String, NetworkInterface>,
    pub routing_rules: Vec<RoutingRule>,
    pub security_policies: Vec<SecurityPolicy>,
    pub qos_settings: BTreeMap<String, String>,
    pub monitoring: BTreeMap<String, String>,
    pub operating_mode: OperatingMode,
}

impl DeviceConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interface(&self, name: &str) -> Option<&NetworkInterface> {
        self.interfaces.get(name)
    }

    pub fn has_interface(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    /// Insert or replace an interface by name, returning the replaced one
    pub fn upsert_interface(&mut self, interface: NetworkInterface) -> Option<NetworkInterface> {
        self.interfaces.insert(interface.name.clone(), interface)
    }

    pub fn with_interface(mut self, interface: NetworkInterface) -> Self {
        self.upsert_interface(interface);
        self
    }

    pub fn with_route(mut self, rule: RoutingRule) -> Self {
        self.routing_rules.push(rule);
        self
    }

    pub fn with_security_policy(mut self, policy: SecurityPolicy) -> Self {
        self.security_policies.push(policy);
        self
    }

    pub fn with_qos_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.qos_settings.insert(key.into(), value.into());
        self
    }

    pub fn with_monitoring(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.monitoring.insert(key.into(), value.into());
        self
    }

    pub fn with_operating_mode(mut self, mode: OperatingMode) -> Self {
        self.operating_mode = mode;
        self
    }
}
