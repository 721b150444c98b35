// Copyright (c) 2025 - Cowboy AI, Inc.
//! Script Parser
//!
//! Line-oriented: blank lines and `#` comment lines are skipped, every other
//! line is split on whitespace and dispatched on its first token. Mandatory
//! fields are positional, optional fields follow as `key value` pairs.
//!
//! Parsing is all-or-nothing. The first malformed line aborts the whole
//! script with a [`ParseError`] carrying the 1-based line number and the
//! trimmed line text; no statements are returned for earlier lines.
//!
//! Numeric fields (`mtu`, `metric`, bandwidth, `priority`) must be integers
//! at parse time. Range checks happen during validation.
//!
//! # Examples
//!
//! ```rust
//! use cim_network_config::dsl::{parse, Expression};
//!
//! let statements = parse("# uplink\ninterface eth0 ip 10.0.0.1 subnet 255.255.255.0").unwrap();
//! assert_eq!(statements.len(), 1);
//! assert_eq!(statements[0].line, 2);
//! assert!(matches!(statements[0].expression, Expression::Interface(_)));
//! ```

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::expression::{
    Expression, InterfaceCommand, QosCommand, RouteCommand, SecurityPolicyCommand,
};

const SUPPORTED_COMMANDS: &str = "interface, route, security, qos";

/// Malformed script line
///
/// `text` is the offending source line with leading and trailing whitespace
/// removed, the same form the line is tokenized in. Indentation is not part
/// of a command, so it is not reported back.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Parse error at line {line} [{text}]: {message}")]
pub struct ParseError {
    /// 1-based source line
    pub line: usize,
    /// Source line text, surrounding whitespace removed
    pub text: String,
    pub message: String,
}

impl ParseError {
    /// Usage text and example for the command family of the failing line
    pub fn hint(&self) -> &'static str {
        let command = self
            .text
            .split_whitespace()
            .next()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match command.as_str() {
            "interface" => {
                "Interface syntax: interface <name> ip <address> subnet <mask> [status UP|DOWN] [mtu <bytes>]\n\
                 Example: interface eth0 ip 192.168.1.1 subnet 255.255.255.0 status UP"
            }
            "route" => {
                "Route syntax: route add <destination> via <gateway> [dev <interface>] [metric <value>]\n\
                 Example: route add 10.0.0.0/24 via 192.168.1.254 dev eth0 metric 1"
            }
            "security" => {
                "Security syntax: security policy <name> <ALLOW|DENY|LOG> [protocol <TCP|UDP|ICMP|IP>] [from <source>] [to <dest>] [port <port>] [on <interface>]\n\
                 Example: security policy web_access ALLOW protocol TCP from any to 192.168.1.100 port 80"
            }
            "qos" => {
                "QoS syntax: qos bandwidth <interface> <bandwidth>Mbps|Gbps [priority <1-10>]\n\
                 Example: qos bandwidth eth0 1000Mbps priority 5"
            }
            _ => "Supported commands: interface, route, security, qos\nUse # for comments",
        }
    }
}

/// A parsed command and the line it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// 1-based source line
    pub line: usize,
    pub expression: Expression,
}

/// Parse a whole script
pub fn parse(script: &str) -> Result<Vec<Statement>, ParseError> {
    let statements = script
        .lines()
        .enumerate()
        .map(|(idx, raw)| (idx + 1, raw.trim()))
        .filter(|(_, text)| !text.is_empty() && !text.starts_with('#'))
        .map(|(line, text)| {
            parse_line(text)
                .map(|expression| Statement { line, expression })
                .map_err(|message| ParseError {
                    line,
                    text: text.to_string(),
                    message,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(statements = statements.len(), "Parsed configuration script");
    Ok(statements)
}

fn parse_line(text: &str) -> Result<Expression, String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let command = tokens
        .first()
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_default();

    match command.as_str() {
        "interface" => parse_interface(&tokens),
        "route" => parse_route(&tokens),
        "security" => parse_security(&tokens),
        "qos" => parse_qos(&tokens),
        _ => Err(format!(
            "Unknown command: {command}. Supported commands: {SUPPORTED_COMMANDS}"
        )),
    }
}

/// Split trailing tokens into lowercased `key value` pairs
fn options<'a>(tokens: &[&'a str], command: &str) -> Result<Vec<(String, &'a str)>, String> {
    tokens
        .chunks(2)
        .map(|pair| match pair {
            [key, value] => Ok((key.to_ascii_lowercase(), *value)),
            other => Err(format!(
                "Missing value for {command} parameter: {}",
                other.concat()
            )),
        })
        .collect()
}

fn parse_number(key: &str, value: &str) -> Result<i64, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid number for {key}: {value}"))
}

fn keyword(token: Option<&&str>, expected: &str) -> bool {
    token.is_some_and(|t| t.eq_ignore_ascii_case(expected))
}

fn parse_interface(tokens: &[&str]) -> Result<Expression, String> {
    if tokens.len() < 6 {
        return Err(
            "Interface command requires at least: interface <name> ip <address> subnet <mask>"
                .to_string(),
        );
    }

    let mut ip_address = None;
    let mut subnet = None;
    let mut status = None;
    let mut mtu = None;

    for (key, value) in options(&tokens[2..], "interface")? {
        match key.as_str() {
            "ip" => ip_address = Some(value.to_string()),
            "subnet" => subnet = Some(value.to_string()),
            "status" => status = Some(value.to_string()),
            "mtu" => mtu = Some(parse_number(&key, value)?),
            _ => return Err(format!("Unknown interface parameter: {key}")),
        }
    }

    let (Some(ip_address), Some(subnet)) = (ip_address, subnet) else {
        return Err("Interface command must specify both ip and subnet".to_string());
    };

    Ok(Expression::Interface(InterfaceCommand {
        name: tokens[1].to_string(),
        ip_address,
        subnet,
        status,
        mtu,
    }))
}

fn parse_route(tokens: &[&str]) -> Result<Expression, String> {
    if tokens.len() < 5 || !keyword(tokens.get(1), "add") {
        return Err(
            "Route command format: route add <destination> via <gateway> [dev <interface>] [metric <value>]"
                .to_string(),
        );
    }
    if !keyword(tokens.get(3), "via") {
        return Err("Route command must use 'via' keyword".to_string());
    }

    let mut cmd = RouteCommand {
        destination: tokens[2].to_string(),
        gateway: tokens[4].to_string(),
        interface: None,
        metric: None,
    };

    for (key, value) in options(&tokens[5..], "route")? {
        match key.as_str() {
            "dev" => cmd.interface = Some(value.to_string()),
            "metric" => cmd.metric = Some(parse_number(&key, value)?),
            _ => return Err(format!("Unknown route parameter: {key}")),
        }
    }

    Ok(Expression::Route(cmd))
}

fn parse_security(tokens: &[&str]) -> Result<Expression, String> {
    if tokens.len() < 4 || !keyword(tokens.get(1), "policy") {
        return Err("Security command format: security policy <name> <action> [protocol <proto>] [from <source>] [to <dest>] [port <port>] [on <interface>]".to_string());
    }

    let mut cmd = SecurityPolicyCommand {
        name: tokens[2].to_string(),
        action: tokens[3].to_ascii_uppercase(),
        protocol: None,
        source: None,
        destination: None,
        port: None,
        interface: None,
    };

    for (key, value) in options(&tokens[4..], "security")? {
        match key.as_str() {
            "protocol" => cmd.protocol = Some(value.to_ascii_uppercase()),
            "from" => cmd.source = Some(value.to_string()),
            "to" => cmd.destination = Some(value.to_string()),
            "port" => cmd.port = Some(value.to_string()),
            "on" => cmd.interface = Some(value.to_string()),
            _ => return Err(format!("Unknown security parameter: {key}")),
        }
    }

    Ok(Expression::SecurityPolicy(cmd))
}

fn parse_qos(tokens: &[&str]) -> Result<Expression, String> {
    if tokens.len() < 4 || !keyword(tokens.get(1), "bandwidth") {
        return Err(
            "QoS command format: qos bandwidth <interface> <bandwidth>[Mbps|Gbps] [priority <value>]"
                .to_string(),
        );
    }

    let mut cmd = QosCommand {
        interface: tokens[2].to_string(),
        bandwidth_mbps: parse_bandwidth(tokens[3])?,
        priority: None,
    };

    for (key, value) in options(&tokens[4..], "QoS")? {
        match key.as_str() {
            "priority" => cmd.priority = Some(parse_number(&key, value)?),
            _ => return Err(format!("Unknown QoS parameter: {key}")),
        }
    }

    Ok(Expression::Qos(cmd))
}

/// `<n>Gbps` (scaled to Mbps), `<n>Mbps`, or a bare Mbps number
fn parse_bandwidth(text: &str) -> Result<i64, String> {
    let invalid = || format!("Invalid bandwidth: {text}");

    if let Some(gbps) = text.strip_suffix("Gbps") {
        gbps.parse::<i64>()
            .ok()
            .and_then(|n| n.checked_mul(1000))
            .ok_or_else(invalid)
    } else {
        text.strip_suffix("Mbps")
            .unwrap_or(text)
            .parse()
            .map_err(|_| invalid())
    }
}
