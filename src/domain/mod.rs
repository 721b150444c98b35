// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Configuration Domain Models
//!
//! # Value Objects with Invariants
//!
//! - [`Ipv4Cidr`] - IPv4 address with optional CIDR prefix (0-32)
//! - [`SubnetMask`] - dotted-quad mask
//! - [`Endpoint`] - `any` or an address/network
//! - [`Mtu`] - Maximum Transmission Unit (68-9000 bytes)
//! - [`Metric`] - route metric (1-999)
//! - [`Port`] - TCP/UDP port (1-65535)
//! - [`Priority`] - traffic priority (1-10)
//! - [`Bandwidth`] - positive Mbps
//!
//! # Entities
//!
//! - [`NetworkInterface`], [`RoutingRule`], [`SecurityPolicy`]
//! - [`DeviceConfiguration`] - the five configuration categories plus operating mode
//!
//! # Business Rules
//!
//! - [`invariants`] - deterministic checks run before a transactional apply commits

pub mod device;
pub mod invariants;
pub mod network;

pub use device::{
    DeviceConfiguration, DeviceId, NetworkInterface, OperatingMode, RoutingRule, SecurityPolicy,
};
pub use invariants::{validate_configuration, RuleViolation};
pub use network::{
    parse_ipv4, Bandwidth, Endpoint, InterfaceStatus, Ipv4Cidr, Metric, Mtu, NetworkError,
    PolicyAction, Port, Priority, Protocol, SubnetMask,
};
