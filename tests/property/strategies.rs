// Copyright (c) 2025 - Cowboy AI, Inc.
//! Shared Property Test Strategies

use cim_network_config::domain::{DeviceConfiguration, OperatingMode};
use cim_network_config::dsl::{run_script, InterpretationContext};
use proptest::prelude::*;

/// A well-formed interface line on one of a few names
pub fn interface_line() -> impl Strategy<Value = String> {
    (0u8..4, 1u8..250, 68i64..=9000).prop_map(|(n, host, mtu)| {
        format!("interface eth{n} ip 10.{n}.0.{host} subnet 255.255.255.0 status UP mtu {mtu}")
    })
}

/// A script of valid interfaces followed by a route and QoS per interface
pub fn valid_script() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(interface_line(), 1..12).prop_map(|mut lines| {
        let names: Vec<String> = lines
            .iter()
            .filter_map(|l| l.split_whitespace().nth(1).map(str::to_string))
            .collect();
        for name in names {
            let n = name.trim_start_matches("eth");
            lines.push(format!(
                "route add 172.{}.0.0/16 via 10.{n}.0.254 dev {name} metric 10",
                n.parse::<u8>().unwrap_or(0) + 16
            ));
            lines.push(format!("qos bandwidth {name} 100Mbps priority 5"));
        }
        lines.push("security policy catch_all DENY from any to any".to_string());
        lines
    })
}

/// A valid script with one line inserted at an arbitrary position
pub fn script_with_insert(bad_line: &'static str) -> impl Strategy<Value = (Vec<String>, usize)> {
    valid_script().prop_flat_map(move |lines| {
        let len = lines.len();
        (Just(lines), 0..=len).prop_map(move |(mut lines, at)| {
            lines.insert(at, bad_line.to_string());
            (lines, at)
        })
    })
}

pub fn operating_mode() -> impl Strategy<Value = OperatingMode> {
    prop_oneof![
        Just(OperatingMode::Normal),
        Just(OperatingMode::Maintenance),
        Just(OperatingMode::HighPerformance),
    ]
}

/// A device configuration built by interpreting a valid script, with
/// device-level settings layered on top
pub fn interpreted_configuration() -> impl Strategy<Value = DeviceConfiguration> {
    (valid_script(), operating_mode(), 0usize..1000).prop_map(|(lines, mode, tag)| {
        let mut ctx = InterpretationContext::new();
        run_script(&lines.join("\n"), &mut ctx).expect("Generated script must interpret");
        let mut config = DeviceConfiguration::new()
            .with_qos_setting("tag", tag.to_string())
            .with_monitoring("snmp", "enabled")
            .with_operating_mode(mode);
        ctx.apply_to(&mut config);
        config
    })
}
