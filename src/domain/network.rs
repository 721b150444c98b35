// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants
//!
//! Every value object here can only be constructed through a validating
//! constructor, so a `NetworkInterface` or `RoutingRule` holding one is valid
//! by construction. Ranges match what the configuration language accepts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(i64),

    #[error("MTU must be between 68 and 9000 bytes: {0}")]
    InvalidMtu(i64),

    #[error("Metric must be between 1 and 999: {0}")]
    InvalidMetric(i64),

    #[error("Port must be between 1 and 65535: {0}")]
    InvalidPort(i64),

    #[error("Invalid port number: {0}")]
    MalformedPort(String),

    #[error("Priority must be between 1 and 10: {0}")]
    InvalidPriority(i64),

    #[error("Bandwidth must be positive: {0}")]
    InvalidBandwidth(i64),

    #[error("Invalid interface status: {0} (must be UP or DOWN)")]
    InvalidStatus(String),

    #[error("Invalid action: {0} (must be ALLOW, DENY, or LOG)")]
    InvalidAction(String),

    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),
}

/// Parse dotted-quad IPv4 text.
///
/// Exactly four decimal octets, each in 0-255. Leading zeros are accepted
/// (`010.0.0.1`), which `Ipv4Addr::from_str` would reject.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr, NetworkError> {
    let invalid = || NetworkError::InvalidIpAddress(text.to_string());

    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in &mut octets {
        let part = parts.next().ok_or_else(invalid)?;
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let value: u32 = part.parse().map_err(|_| invalid())?;
        *octet = u8::try_from(value).map_err(|_| invalid())?;
    }
    if parts.next().is_some() {
        return Err(invalid());
    }

    Ok(Ipv4Addr::from(octets))
}

/// IPv4 address with optional CIDR prefix
///
/// Invariants:
/// - Valid dotted-quad address
/// - Prefix length within 0-32
///
/// # Examples
///
/// ```rust
/// use cim_network_config::domain::Ipv4Cidr;
///
/// let net: Ipv4Cidr = "10.0.0.0/24".parse().unwrap();
/// assert_eq!(net.address().to_string(), "10.0.0.0");
/// assert_eq!(net.prefix_length(), Some(24));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    address: Ipv4Addr,
    prefix_length: Option<u8>,
}

impl Ipv4Cidr {
    /// Create a new IPv4 address with optional CIDR notation
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();

        match cidr.split_once('/') {
            Some((addr, prefix)) => {
                let address = parse_ipv4(addr)?;
                let prefix: i64 = prefix
                    .parse()
                    .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;
                Self::from_parts(address, Some(prefix))
            }
            None => Ok(Self {
                address: parse_ipv4(cidr)?,
                prefix_length: None,
            }),
        }
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: Ipv4Addr, prefix_length: Option<i64>) -> Result<Self, NetworkError> {
        let prefix_length = match prefix_length {
            Some(prefix) if (0..=32).contains(&prefix) => Some(prefix as u8),
            Some(prefix) => return Err(NetworkError::InvalidPrefixLength(prefix)),
            None => None,
        };

        Ok(Self {
            address,
            prefix_length,
        })
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn prefix_length(&self) -> Option<u8> {
        self.prefix_length
    }

    /// Whether `ip` falls inside this network. A bare address matches only itself.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = prefix_to_mask(self.prefix_length.unwrap_or(32));
        u32::from(self.address) & mask == u32::from(ip) & mask
    }

    /// Get as CIDR notation string
    pub fn as_cidr(&self) -> String {
        match self.prefix_length {
            Some(prefix) => format!("{}/{}", self.address, prefix),
            None => self.address.to_string(),
        }
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cidr())
    }
}

impl FromStr for Ipv4Cidr {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Ipv4Cidr> for String {
    fn from(cidr: Ipv4Cidr) -> Self {
        cidr.as_cidr()
    }
}

/// Route a bounded integer value object's serde through its constructor
macro_rules! checked_integer_serde {
    ($name:ident, $inner:ty, $ctor:path) => {
        impl TryFrom<i64> for $name {
            type Error = NetworkError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                $ctor(value)
            }
        }

        impl From<$name> for $inner {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

fn prefix_to_mask(prefix: u8) -> u32 {
    match prefix {
        0 => 0,
        p => u32::MAX << (32 - u32::from(p.min(32))),
    }
}

/// Subnet mask in dotted-quad form (`255.255.255.0`)
///
/// Any four valid octets are accepted, matching what interface commands allow;
/// [`SubnetMask::prefix_length`] reports whether the mask is contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubnetMask(Ipv4Addr);

impl SubnetMask {
    pub fn new(mask: impl AsRef<str>) -> Result<Self, NetworkError> {
        Ok(Self(parse_ipv4(mask.as_ref())?))
    }

    pub fn bits(&self) -> u32 {
        u32::from(self.0)
    }

    /// Prefix length for a contiguous mask, `None` otherwise
    pub fn prefix_length(&self) -> Option<u8> {
        let bits = self.bits();
        let ones = bits.leading_ones();
        (bits.checked_shl(ones).unwrap_or(0) == 0).then_some(ones as u8)
    }

    /// Whether two addresses share the network this mask selects
    pub fn same_network(&self, a: Ipv4Addr, b: Ipv4Addr) -> bool {
        u32::from(a) & self.bits() == u32::from(b) & self.bits()
    }
}

impl fmt::Display for SubnetMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubnetMask {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Source or destination of a security policy: `any` or an address/network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Any,
    Network(Ipv4Cidr),
}

impl FromStr for Endpoint {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("any") {
            Ok(Self::Any)
        } else {
            Ok(Self::Network(s.parse()?))
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Network(net) => write!(f, "{}", net),
        }
    }
}

/// MTU (Maximum Transmission Unit) value object
///
/// Invariants:
/// - Valid MTU range (68-9000 bytes)
/// - 68 = minimum IPv4 MTU
/// - 9000 = jumbo frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Mtu(u32);

impl Mtu {
    /// Minimum MTU (IPv4 minimum)
    pub const MIN: u32 = 68;

    /// Maximum MTU (jumbo frames)
    pub const MAX: u32 = 9000;

    /// Standard Ethernet MTU
    pub const STANDARD_ETHERNET: u32 = 1500;

    pub fn new(size: i64) -> Result<Self, NetworkError> {
        u32::try_from(size)
            .ok()
            .filter(|s| (Self::MIN..=Self::MAX).contains(s))
            .map(Self)
            .ok_or(NetworkError::InvalidMtu(size))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// Check if this is a jumbo frame MTU (>1500)
    pub fn is_jumbo(&self) -> bool {
        self.0 > Self::STANDARD_ETHERNET
    }
}

checked_integer_serde!(Mtu, u32, Mtu::new);

impl Default for Mtu {
    fn default() -> Self {
        Self(Self::STANDARD_ETHERNET)
    }
}

impl fmt::Display for Mtu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Route metric (1-999, lower is preferred)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct Metric(u16);

impl Metric {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 999;

    pub fn new(metric: i64) -> Result<Self, NetworkError> {
        u16::try_from(metric)
            .ok()
            .filter(|m| (Self::MIN..=Self::MAX).contains(m))
            .map(Self)
            .ok_or(NetworkError::InvalidMetric(metric))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

checked_integer_serde!(Metric, u16, Metric::new);

impl Default for Metric {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// TCP/UDP port (1-65535)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct Port(u16);

impl Port {
    pub fn new(port: i64) -> Result<Self, NetworkError> {
        u16::try_from(port)
            .ok()
            .filter(|p| *p >= 1)
            .map(Self)
            .ok_or(NetworkError::InvalidPort(port))
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

checked_integer_serde!(Port, u16, Port::new);

impl FromStr for Port {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port: i64 = s
            .parse()
            .map_err(|_| NetworkError::MalformedPort(s.to_string()))?;
        Self::new(port)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Traffic priority (1-10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    pub fn new(priority: i64) -> Result<Self, NetworkError> {
        u8::try_from(priority)
            .ok()
            .filter(|p| (Self::MIN..=Self::MAX).contains(p))
            .map(Self)
            .ok_or(NetworkError::InvalidPriority(priority))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

checked_integer_serde!(Priority, u8, Priority::new);

impl Default for Priority {
    fn default() -> Self {
        Self(5)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interface bandwidth in Mbps (strictly positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct Bandwidth(u64);

impl Bandwidth {
    pub fn from_mbps(mbps: i64) -> Result<Self, NetworkError> {
        u64::try_from(mbps)
            .ok()
            .filter(|m| *m > 0)
            .map(Self)
            .ok_or(NetworkError::InvalidBandwidth(mbps))
    }

    pub fn mbps(&self) -> u64 {
        self.0
    }
}

checked_integer_serde!(Bandwidth, u64, Bandwidth::from_mbps);

impl Default for Bandwidth {
    fn default() -> Self {
        Self(1000)
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Mbps", self.0)
    }
}

/// Administrative status of an interface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InterfaceStatus {
    Up,
    #[default]
    Down,
}

impl FromStr for InterfaceStatus {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UP" => Ok(Self::Up),
            "DOWN" => Ok(Self::Down),
            _ => Err(NetworkError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for InterfaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// What a security policy does with matching traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PolicyAction {
    Allow,
    Deny,
    Log,
}

impl FromStr for PolicyAction {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALLOW" => Ok(Self::Allow),
            "DENY" => Ok(Self::Deny),
            "LOG" => Ok(Self::Log),
            _ => Err(NetworkError::InvalidAction(s.to_string())),
        }
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "ALLOW"),
            Self::Deny => write!(f, "DENY"),
            Self::Log => write!(f, "LOG"),
        }
    }
}

/// Transport protocol matched by a security policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Ip,
}

impl FromStr for Protocol {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            "ICMP" => Ok(Self::Icmp),
            "IP" => Ok(Self::Ip),
            _ => Err(NetworkError::UnsupportedProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
            Self::Icmp => write!(f, "ICMP"),
            Self::Ip => write!(f, "IP"),
        }
    }
}
