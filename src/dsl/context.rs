// Copyright (c) 2025 - Cowboy AI, Inc.
//! Interpretation Context
//!
//! The mutable working set one script is interpreted into: interfaces,
//! routing rules and security policies, plus the diagnostics of the current
//! pass. A context can be seeded from a live [`DeviceConfiguration`] and
//! written back to one with [`InterpretationContext::apply_to`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::{DeviceConfiguration, NetworkInterface, RoutingRule, SecurityPolicy};

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks interpretation of the whole script
    Error,
    /// Advisory only
    Warning,
}

/// A validation error or warning tied to a script line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 1-based source line
    pub line: usize,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

/// Working set for one script execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpretationContext {
    interfaces: BTreeMap<String, NetworkInterface>,
    routing_rules: Vec<RoutingRule>,
    security_policies: Vec<SecurityPolicy>,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    /// Interfaces declared by earlier lines of the script under validation
    declared: BTreeSet<String>,
}

impl InterpretationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a context with the interfaces, routes and policies of a live configuration
    pub fn from_configuration(config: &DeviceConfiguration) -> Self {
        Self {
            interfaces: config.interfaces.clone(),
            routing_rules: config.routing_rules.clone(),
            security_policies: config.security_policies.clone(),
            ..Self::default()
        }
    }

    /// Whether `name` is known, either interpreted already or declared
    /// earlier in the script currently being validated
    pub fn has_interface(&self, name: &str) -> bool {
        self.interfaces.contains_key(name) || self.declared.contains(name)
    }

    pub fn interface(&self, name: &str) -> Option<&NetworkInterface> {
        self.interfaces.get(name)
    }

    pub fn interface_mut(&mut self, name: &str) -> Option<&mut NetworkInterface> {
        self.interfaces.get_mut(name)
    }

    pub fn add_interface(&mut self, interface: NetworkInterface) {
        self.interfaces.insert(interface.name.clone(), interface);
    }

    pub fn add_routing_rule(&mut self, rule: RoutingRule) {
        self.routing_rules.push(rule);
    }

    pub fn add_security_policy(&mut self, policy: SecurityPolicy) {
        self.security_policies.push(policy);
    }

    pub fn add_error(&mut self, line: usize, message: impl Into<String>) {
        self.errors.push(Diagnostic::error(line, message));
    }

    pub fn add_warning(&mut self, line: usize, message: impl Into<String>) {
        self.warnings.push(Diagnostic::warning(line, message));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn interfaces(&self) -> &BTreeMap<String, NetworkInterface> {
        &self.interfaces
    }

    pub fn routing_rules(&self) -> &[RoutingRule] {
        &self.routing_rules
    }

    pub fn security_policies(&self) -> &[SecurityPolicy] {
        &self.security_policies
    }

    /// Replace interfaces, routing rules and security policies of `config`
    /// with this context's. QoS, monitoring and operating mode are untouched.
    pub fn apply_to(&self, config: &mut DeviceConfiguration) {
        config.interfaces = self.interfaces.clone();
        config.routing_rules = self.routing_rules.clone();
        config.security_policies = self.security_policies.clone();
    }

    /// Clear diagnostics and declarations before a new validation pass
    pub(crate) fn begin_pass(&mut self) {
        self.errors.clear();
        self.warnings.clear();
        self.declared.clear();
    }

    pub(crate) fn declare_interface(&mut self, name: &str) {
        self.declared.insert(name.to_string());
    }

    pub(crate) fn clear_declarations(&mut self) {
        self.declared.clear();
    }
}
