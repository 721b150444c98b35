// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Configuration Business Rules
//!
//! Rules checked against a complete, post-mutation `DeviceConfiguration`
//! before a transactional apply is committed. All functions are pure and
//! deterministic; each returns every violation it finds rather than the first.
//!
//! # Rule Categories
//!
//! 1. **Referential**: routes point at interfaces that exist
//! 2. **Reachability**: a route's gateway sits on the interface it leaves by
//! 3. **Uniqueness**: security policy names do not repeat
//! 4. **Addressing**: interfaces do not claim a network or broadcast address
//! 5. **Structural**: setting keys are non-empty

use serde::Serialize;
use std::collections::BTreeSet;

use super::device::DeviceConfiguration;

/// Business rule violation with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleViolation {
    /// Route references an interface that is not configured
    #[error("Route to {destination} references missing interface {interface}")]
    DanglingRouteInterface {
        destination: String,
        interface: String,
    },

    /// Route gateway is outside the subnet of its outgoing interface
    #[error("Gateway {gateway} for {destination} is not reachable from interface {interface}")]
    UnreachableGateway {
        destination: String,
        gateway: String,
        interface: String,
    },

    /// Two security policies share a name
    #[error("Duplicate security policy name: {name}")]
    DuplicatePolicyName { name: String },

    /// Interface address is the network or broadcast address of its subnet
    #[error("Interface {interface} uses reserved address {address} of its subnet")]
    ReservedInterfaceAddress { interface: String, address: String },

    /// Setting with an empty key
    #[error("Empty {category} setting key")]
    EmptySettingKey { category: &'static str },
}

/// Validate every route's interface reference
pub fn validate_route_interfaces(config: &DeviceConfiguration) -> Vec<RuleViolation> {
    config
        .routing_rules
        .iter()
        .filter_map(|rule| {
            let interface = rule.interface.as_ref()?;
            (!config.has_interface(interface)).then(|| RuleViolation::DanglingRouteInterface {
                destination: rule.destination.to_string(),
                interface: interface.clone(),
            })
        })
        .collect()
}

/// Validate gateway reachability
///
/// # Rules
/// - A route bound to an interface must use a gateway inside that interface's subnet
/// - Routes without an interface are not checked
/// - Dangling interface references are reported by [`validate_route_interfaces`]
pub fn validate_gateway_reachability(config: &DeviceConfiguration) -> Vec<RuleViolation> {
    config
        .routing_rules
        .iter()
        .filter_map(|rule| {
            let iface = config.interface(rule.interface.as_deref()?)?;
            (!iface.subnet.same_network(iface.ip_address, rule.gateway)).then(|| {
                RuleViolation::UnreachableGateway {
                    destination: rule.destination.to_string(),
                    gateway: rule.gateway.to_string(),
                    interface: iface.name.clone(),
                }
            })
        })
        .collect()
}

/// Validate security policy names are unique
pub fn validate_unique_policy_names(config: &DeviceConfiguration) -> Vec<RuleViolation> {
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    let mut violations = Vec::new();

    for policy in &config.security_policies {
        if !seen.insert(policy.name.as_str()) && reported.insert(policy.name.as_str()) {
            violations.push(RuleViolation::DuplicatePolicyName {
                name: policy.name.clone(),
            });
        }
    }

    violations
}

/// Validate interface addresses
///
/// # Rules
/// - With a contiguous mask of /30 or shorter, the address must be neither
///   the network address nor the broadcast address
/// - /31, /32 and non-contiguous masks are not checked
pub fn validate_interface_addresses(config: &DeviceConfiguration) -> Vec<RuleViolation> {
    config
        .interfaces
        .values()
        .filter(|iface| matches!(iface.subnet.prefix_length(), Some(prefix) if prefix <= 30))
        .filter_map(|iface| {
            let mask = iface.subnet.bits();
            let ip = u32::from(iface.ip_address);
            let is_network = ip & !mask == 0;
            let is_broadcast = ip | mask == u32::MAX;
            (is_network || is_broadcast).then(|| RuleViolation::ReservedInterfaceAddress {
                interface: iface.name.clone(),
                address: iface.ip_address.to_string(),
            })
        })
        .collect()
}

/// Validate QoS and monitoring setting keys are non-empty
pub fn validate_setting_keys(config: &DeviceConfiguration) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    if config.qos_settings.keys().any(|k| k.trim().is_empty()) {
        violations.push(RuleViolation::EmptySettingKey { category: "QoS" });
    }
    if config.monitoring.keys().any(|k| k.trim().is_empty()) {
        violations.push(RuleViolation::EmptySettingKey {
            category: "monitoring",
        });
    }
    violations
}

/// Composite validation of a complete device configuration
pub fn validate_configuration(config: &DeviceConfiguration) -> Result<(), Vec<RuleViolation>> {
    let violations: Vec<RuleViolation> = [
        validate_route_interfaces(config),
        validate_gateway_reachability(config),
        validate_unique_policy_names(config),
        validate_interface_addresses(config),
        validate_setting_keys(config),
    ]
    .into_iter()
    .flatten()
    .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
