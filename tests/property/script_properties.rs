// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Configuration Language
//!
//! Any script containing a single bad line must leave the interpretation
//! context untouched, and the failure must point at the bad line.

use cim_network_config::dsl::{
    parse, run_script, validate_and_interpret, InterpretationContext, ScriptError,
};
use proptest::prelude::*;

use super::strategies::{script_with_insert, valid_script};

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Valid scripts interpret without errors
    #[test]
    fn prop_valid_scripts_interpret(lines in valid_script()) {
        let mut ctx = InterpretationContext::new();
        let result = run_script(&lines.join("\n"), &mut ctx);

        prop_assert!(result.is_ok(), "Valid script rejected: {:?}", result);
        prop_assert!(!ctx.interfaces().is_empty());
        prop_assert_eq!(ctx.routing_rules().len(), lines.iter().filter(|l| l.starts_with("route")).count());
        prop_assert_eq!(ctx.security_policies().len(), 1);
    }

    /// Property: Parsing is atomic
    ///
    /// One unknown command anywhere fails the whole parse at that line.
    #[test]
    fn prop_parse_is_atomic((lines, at) in script_with_insert("reboot now")) {
        let err = parse(&lines.join("\n")).unwrap_err();

        prop_assert_eq!(err.line, at + 1);
        prop_assert_eq!(err.text.as_str(), "reboot now");
    }

    /// Property: Validation is all-or-nothing
    ///
    /// One semantically invalid line means nothing is interpreted.
    #[test]
    fn prop_validation_is_all_or_nothing((lines, at) in script_with_insert("qos bandwidth eth9 100Mbps")) {
        let statements = parse(&lines.join("\n")).unwrap();
        let mut ctx = InterpretationContext::new();

        let failure = validate_and_interpret(&statements, &mut ctx).unwrap_err();

        prop_assert_eq!(failure.errors.len(), 1);
        prop_assert_eq!(failure.errors[0].line, at + 1);
        prop_assert!(ctx.interfaces().is_empty());
        prop_assert!(ctx.routing_rules().is_empty());
        prop_assert!(ctx.security_policies().is_empty());
    }

    /// Property: Out-of-range MTU is always rejected
    #[test]
    fn prop_mtu_out_of_range_rejected(mtu in prop_oneof![-1000i64..68, 9001i64..100_000]) {
        let mut ctx = InterpretationContext::new();
        let script = format!("interface eth0 ip 10.0.0.1 subnet 255.255.255.0 mtu {mtu}");

        let err = run_script(&script, &mut ctx).unwrap_err();

        prop_assert!(matches!(err, ScriptError::Validation(_)));
        prop_assert!(ctx.interfaces().is_empty());
    }
}
