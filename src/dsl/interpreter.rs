// Copyright (c) 2025 - Cowboy AI, Inc.
//! Two-Pass Interpretation Driver
//!
//! Pass one validates every statement in script order and collects all
//! errors and warnings. Pass two runs only when pass one found no errors and
//! interprets every statement in the same order.
//!
//! # Invariants
//!
//! - A script with any validation error leaves the context's interfaces,
//!   routes and policies exactly as they were
//! - A script that validates is interpreted completely
//! - Lines may reference interfaces declared by earlier lines of the same script

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::context::{Diagnostic, InterpretationContext};
use super::parser::{parse, ParseError, Statement};

/// Validation failed; nothing was interpreted
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Validation failed with {} error(s)", errors.len())]
pub struct ValidationFailure {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

/// Failure to run a script end to end
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationFailure),
}

/// Validate all statements, then interpret them if and only if no errors were found
///
/// On success the context holds the interpreted state and this pass's
/// warnings. On failure the context still carries the diagnostics, which are
/// also returned.
pub fn validate_and_interpret(
    statements: &[Statement],
    ctx: &mut InterpretationContext,
) -> Result<(), ValidationFailure> {
    ctx.begin_pass();

    for statement in statements {
        statement.expression.validate(ctx, statement.line);
        if let Some(name) = statement.expression.declared_interface() {
            ctx.declare_interface(name);
        }
    }
    ctx.clear_declarations();

    for warning in ctx.warnings() {
        warn!(line = warning.line, "{}", warning.message);
    }

    if ctx.has_errors() {
        debug!(errors = ctx.errors().len(), "Validation failed, nothing interpreted");
        return Err(ValidationFailure {
            errors: ctx.errors().to_vec(),
            warnings: ctx.warnings().to_vec(),
        });
    }

    for statement in statements {
        debug!(line = statement.line, "{}", statement.expression.description());
        statement.expression.interpret(ctx);
    }

    Ok(())
}

/// Parse and interpret a script into `ctx`
pub fn run_script(script: &str, ctx: &mut InterpretationContext) -> Result<(), ScriptError> {
    let statements = parse(script)?;
    validate_and_interpret(&statements, ctx)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InterfaceStatus;

    #[test]
    fn test_forward_reference_within_script() {
        let mut ctx = InterpretationContext::new();
        run_script(
            "interface eth0 ip 192.168.1.1 subnet 255.255.255.0 status UP\n\
             qos bandwidth eth0 2Gbps priority 9",
            &mut ctx,
        )
        .unwrap();

        let eth0 = ctx.interface("eth0").unwrap();
        assert_eq!(eth0.status, InterfaceStatus::Up);
        assert_eq!(eth0.bandwidth.mbps(), 2000);
        assert_eq!(eth0.priority.value(), 9);
    }

    #[test]
    fn test_reference_before_declaration_fails() {
        let mut ctx = InterpretationContext::new();
        let err = run_script(
            "qos bandwidth eth0 100Mbps\n\
             interface eth0 ip 192.168.1.1 subnet 255.255.255.0",
            &mut ctx,
        )
        .unwrap_err();

        let ScriptError::Validation(failure) = err else {
            panic!("expected validation failure");
        };
        assert_eq!(failure.errors.len(), 1);
        assert_eq!(failure.errors[0].to_string(), "Line 1: Interface not found: eth0");
        assert!(ctx.interfaces().is_empty());
    }

    #[test]
    fn test_all_errors_reported() {
        let mut ctx = InterpretationContext::new();
        let err = run_script(
            "interface eth0 ip 300.1.1.1 subnet 255.255.255.0\n\
             route add 10.0.0.0/24 via 10.0.0.1 metric 0\n\
             security policy p BLOCK",
            &mut ctx,
        )
        .unwrap_err();

        let ScriptError::Validation(failure) = err else {
            panic!("expected validation failure");
        };
        let lines: Vec<usize> = failure.errors.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert!(ctx.interfaces().is_empty());
        assert!(ctx.routing_rules().is_empty());
        assert!(ctx.security_policies().is_empty());
    }

    #[test]
    fn test_second_pass_starts_clean() {
        let mut ctx = InterpretationContext::new();
        assert!(run_script("qos bandwidth eth1 1Mbps", &mut ctx).is_err());

        run_script("interface eth1 ip 10.1.1.1 subnet 255.255.255.0", &mut ctx).unwrap();
        assert!(!ctx.has_errors());
        assert!(ctx.has_interface("eth1"));
    }
}
