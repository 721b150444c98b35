// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Configuration Language
//!
//! ```text
//! interface <name> ip <ipv4> subnet <mask> [status UP|DOWN] [mtu <68-9000>]
//! route add <dest>[/<0-32>] via <gateway> [dev <iface>] [metric <1-999>]
//! security policy <name> ALLOW|DENY|LOG [protocol TCP|UDP|ICMP|IP] [from <ip|cidr|any>] [to <ip|cidr|any>] [port <1-65535>] [on <iface>]
//! qos bandwidth <iface> <n>Mbps|<n>Gbps [priority <1-10>]
//! ```
//!
//! Script text goes through [`parse`] into [`Statement`]s, then through
//! [`validate_and_interpret`] into an [`InterpretationContext`].

pub mod context;
pub mod expression;
pub mod interpreter;
pub mod parser;

pub use context::{Diagnostic, InterpretationContext, Severity};
pub use expression::{
    Expression, InterfaceCommand, QosCommand, RouteCommand, SecurityPolicyCommand,
};
pub use interpreter::{run_script, validate_and_interpret, ScriptError, ValidationFailure};
pub use parser::{parse, ParseError, Statement};
