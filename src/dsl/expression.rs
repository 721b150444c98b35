// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration Expressions
//!
//! A closed set of commands, one variant per script command family. Fields
//! hold the text (or number) the parser read; turning them into domain value
//! objects happens in `validate`, which reports every problem on the line,
//! and again in `interpret`, which only runs once validation found none.
//!
//! # Invariants
//!
//! - `validate` never touches interfaces, routes or policies
//! - `interpret` assumes the script validated cleanly

use std::fmt;

use super::context::InterpretationContext;
use crate::domain::{
    parse_ipv4, Bandwidth, Endpoint, InterfaceStatus, Ipv4Cidr, Metric, Mtu, NetworkInterface,
    PolicyAction, Port, Priority, Protocol, RoutingRule, SecurityPolicy, SubnetMask,
};

/// `interface <name> ip <ipv4> subnet <mask> [status UP|DOWN] [mtu <n>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceCommand {
    pub name: String,
    pub ip_address: String,
    pub subnet: String,
    pub status: Option<String>,
    pub mtu: Option<i64>,
}

impl InterfaceCommand {
    fn build(&self) -> Result<NetworkInterface, Vec<String>> {
        let mut errors = Vec::new();

        let ip = parse_ipv4(&self.ip_address)
            .map_err(|_| errors.push(format!("Invalid IP address format: {}", self.ip_address)))
            .ok();
        let subnet = SubnetMask::new(&self.subnet)
            .map_err(|_| errors.push(format!("Invalid subnet format: {}", self.subnet)))
            .ok();
        let status = match &self.status {
            Some(status) => status
                .parse::<InterfaceStatus>()
                .map_err(|e| errors.push(e.to_string()))
                .ok(),
            None => Some(InterfaceStatus::default()),
        };
        let mtu = match self.mtu {
            Some(mtu) => Mtu::new(mtu).map_err(|e| errors.push(e.to_string())).ok(),
            None => Some(Mtu::default()),
        };

        match (ip, subnet, status, mtu) {
            (Some(ip), Some(subnet), Some(status), Some(mtu)) if errors.is_empty() => {
                Ok(NetworkInterface::new(&self.name, ip, subnet)
                    .with_status(status)
                    .with_mtu(mtu))
            }
            _ => Err(errors),
        }
    }

    fn validate(&self, ctx: &mut InterpretationContext, line: usize) {
        if self.name.trim().is_empty() {
            ctx.add_error(line, "Interface name cannot be empty");
            return;
        }
        if ctx.has_interface(&self.name) {
            ctx.add_warning(
                line,
                format!("Interface {} already exists - will be overwritten", self.name),
            );
        }
        if let Err(errors) = self.build() {
            errors.into_iter().for_each(|e| ctx.add_error(line, e));
        }
    }

    fn interpret(&self, ctx: &mut InterpretationContext) {
        if let Ok(interface) = self.build() {
            ctx.add_interface(interface);
        }
    }
}

/// `route add <dest>[/<prefix>] via <gateway> [dev <iface>] [metric <n>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCommand {
    pub destination: String,
    pub gateway: String,
    pub interface: Option<String>,
    pub metric: Option<i64>,
}

impl RouteCommand {
    fn build(&self) -> Result<RoutingRule, Vec<String>> {
        let mut errors = Vec::new();

        let destination = Ipv4Cidr::new(&self.destination)
            .map_err(|_| errors.push(format!("Invalid destination format: {}", self.destination)))
            .ok();
        let gateway = parse_ipv4(&self.gateway)
            .map_err(|_| errors.push(format!("Invalid gateway format: {}", self.gateway)))
            .ok();
        let metric = match self.metric {
            Some(metric) => Metric::new(metric).map_err(|e| errors.push(e.to_string())).ok(),
            None => Some(Metric::default()),
        };

        match (destination, gateway, metric) {
            (Some(destination), Some(gateway), Some(metric)) if errors.is_empty() => {
                Ok(RoutingRule {
                    destination,
                    gateway,
                    interface: self.interface.clone(),
                    metric,
                })
            }
            _ => Err(errors),
        }
    }

    fn validate(&self, ctx: &mut InterpretationContext, line: usize) {
        if let Err(errors) = self.build() {
            errors.into_iter().for_each(|e| ctx.add_error(line, e));
        }
        if let Some(interface) = &self.interface {
            if !ctx.has_interface(interface) {
                ctx.add_error(line, format!("Interface not found: {interface}"));
            }
        }
    }

    fn interpret(&self, ctx: &mut InterpretationContext) {
        if let Ok(rule) = self.build() {
            ctx.add_routing_rule(rule);
        }
    }
}

/// `security policy <name> <action> [protocol p] [from s] [to d] [port n] [on iface]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityPolicyCommand {
    pub name: String,
    pub action: String,
    pub protocol: Option<String>,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub port: Option<String>,
    pub interface: Option<String>,
}

impl SecurityPolicyCommand {
    fn build(&self) -> Result<SecurityPolicy, Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Policy name cannot be empty".to_string());
        }
        let action = self
            .action
            .parse::<PolicyAction>()
            .map_err(|e| errors.push(e.to_string()))
            .ok();
        let protocol = self
            .protocol
            .as_deref()
            .and_then(|p| p.parse::<Protocol>().map_err(|e| errors.push(e.to_string())).ok());
        let source = self
            .source
            .as_deref()
            .and_then(|s| {
                s.parse::<Endpoint>()
                    .map_err(|_| errors.push(format!("Invalid source IP format: {s}")))
                    .ok()
            });
        let destination = self
            .destination
            .as_deref()
            .and_then(|d| {
                d.parse::<Endpoint>()
                    .map_err(|_| errors.push(format!("Invalid destination IP format: {d}")))
                    .ok()
            });
        let port = self
            .port
            .as_deref()
            .and_then(|p| p.parse::<Port>().map_err(|e| errors.push(e.to_string())).ok());

        match action {
            Some(action) if errors.is_empty() => Ok(SecurityPolicy {
                name: self.name.clone(),
                action,
                protocol,
                source,
                destination,
                port,
                interface: self.interface.clone(),
            }),
            _ => Err(errors),
        }
    }

    fn validate(&self, ctx: &mut InterpretationContext, line: usize) {
        if let Err(errors) = self.build() {
            errors.into_iter().for_each(|e| ctx.add_error(line, e));
        }
        if let Some(interface) = &self.interface {
            if !ctx.has_interface(interface) {
                ctx.add_warning(line, format!("Interface {interface} not yet defined"));
            }
        }
    }

    fn interpret(&self, ctx: &mut InterpretationContext) {
        if let Ok(policy) = self.build() {
            ctx.add_security_policy(policy);
        }
    }
}

/// `qos bandwidth <iface> <n>Mbps|<n>Gbps [priority <n>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QosCommand {
    pub interface: String,
    pub bandwidth_mbps: i64,
    pub priority: Option<i64>,
}

impl QosCommand {
    fn build(&self) -> Result<(Bandwidth, Option<Priority>), Vec<String>> {
        let mut errors = Vec::new();

        let bandwidth = Bandwidth::from_mbps(self.bandwidth_mbps)
            .map_err(|e| errors.push(e.to_string()))
            .ok();
        let priority = self
            .priority
            .map(|p| Priority::new(p).map_err(|e| errors.push(e.to_string())).ok());

        match (bandwidth, priority) {
            (Some(bandwidth), None) => Ok((bandwidth, None)),
            (Some(bandwidth), Some(Some(priority))) => Ok((bandwidth, Some(priority))),
            _ => Err(errors),
        }
    }

    fn validate(&self, ctx: &mut InterpretationContext, line: usize) {
        if !ctx.has_interface(&self.interface) {
            ctx.add_error(line, format!("Interface not found: {}", self.interface));
        }
        if let Err(errors) = self.build() {
            errors.into_iter().for_each(|e| ctx.add_error(line, e));
        }
    }

    fn interpret(&self, ctx: &mut InterpretationContext) {
        let Ok((bandwidth, priority)) = self.build() else {
            return;
        };
        if let Some(interface) = ctx.interface_mut(&self.interface) {
            interface.bandwidth = bandwidth;
            if let Some(priority) = priority {
                interface.priority = priority;
            }
        }
    }
}

/// One parsed configuration command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Interface(InterfaceCommand),
    Route(RouteCommand),
    SecurityPolicy(SecurityPolicyCommand),
    Qos(QosCommand),
}

impl Expression {
    /// Append this command's errors and warnings to the context
    pub fn validate(&self, ctx: &mut InterpretationContext, line: usize) {
        match self {
            Self::Interface(cmd) => cmd.validate(ctx, line),
            Self::Route(cmd) => cmd.validate(ctx, line),
            Self::SecurityPolicy(cmd) => cmd.validate(ctx, line),
            Self::Qos(cmd) => cmd.validate(ctx, line),
        }
    }

    /// Apply this command's effect to the context
    pub fn interpret(&self, ctx: &mut InterpretationContext) {
        match self {
            Self::Interface(cmd) => cmd.interpret(ctx),
            Self::Route(cmd) => cmd.interpret(ctx),
            Self::SecurityPolicy(cmd) => cmd.interpret(ctx),
            Self::Qos(cmd) => cmd.interpret(ctx),
        }
    }

    /// Interface name this command defines, if any
    pub fn declared_interface(&self) -> Option<&str> {
        match self {
            Self::Interface(cmd) => Some(&cmd.name),
            _ => None,
        }
    }

    pub fn description(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interface(cmd) => write!(f, "Interface configuration: {}", cmd.name),
            Self::Route(cmd) => write!(
                f,
                "Route configuration: {} -> {}",
                cmd.destination, cmd.gateway
            ),
            Self::SecurityPolicy(cmd) => {
                write!(f, "Security policy: {} ({})", cmd.name, cmd.action)
            }
            Self::Qos(cmd) => write!(
                f,
                "QoS configuration: {} ({}Mbps)",
                cmd.interface, cmd.bandwidth_mbps
            ),
        }
    }
}
