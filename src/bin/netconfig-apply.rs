// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Configuration Apply Tool
//!
//! Applies a configuration script to a fresh device transactionally and
//! prints the outcome plus the device's snapshot history as JSON.
//!
//! Run with: cargo run --bin netconfig-apply -- <device-id> <script-file> [description] [operator]
//!
//! Environment:
//! - `NETCONFIG_MAX_HISTORY`: snapshots kept per device (default 50)
//! - `NETCONFIG_VALIDATION_TIMEOUT_MS`: business validation deadline (default 5000)
//! - `NETCONFIG_INITIAL_SNAPSHOT`: snapshot on registration (default true)
//! - `RUST_LOG`: log filter
//!
//! Exit status is 0 when the change committed, 1 when it was rolled back and
//! 2 when the script did not parse.

use anyhow::{bail, Context, Result};
use cim_network_config::{
    ApplyOutcome, ConfigurationStore, DeviceConfiguration, DeviceId, EngineConfig,
    NetConfigError, TransactionManager,
};
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

const USAGE: &str = "usage: netconfig-apply <device-id> <script-file> [description] [operator]";

/// Command line arguments
#[derive(Debug)]
struct ApplyArgs {
    device_id: DeviceId,
    script_path: String,
    description: String,
    operator: String,
}

impl ApplyArgs {
    fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let (Some(device), Some(script_path)) = (args.next(), args.next()) else {
            bail!(USAGE);
        };
        let device_id = DeviceId::new(device).context("Invalid device id")?;

        Ok(Self {
            device_id,
            description: args.next().unwrap_or_else(|| format!("Apply {script_path}")),
            operator: args.next().unwrap_or_else(|| "cli".to_string()),
            script_path,
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = ApplyArgs::from_args(std::env::args().skip(1))?;
    let config = EngineConfig::from_env().context("Failed to load engine configuration")?;
    let script = tokio::fs::read_to_string(&args.script_path)
        .await
        .with_context(|| format!("Failed to read script {}", args.script_path))?;

    info!(
        device = %args.device_id,
        script = %args.script_path,
        max_history = config.max_history,
        "Applying configuration script"
    );

    let store = Arc::new(ConfigurationStore::new(config)?);
    store.register_device(args.device_id.clone(), DeviceConfiguration::new())?;
    let manager = TransactionManager::new(Arc::clone(&store));

    let outcome = match manager
        .apply_script(&args.device_id, &script, &args.description, &args.operator)
        .await
    {
        Ok(outcome) => outcome,
        Err(NetConfigError::Parse(err)) => {
            error!(line = err.line, "Script did not parse");
            eprintln!("{err}\n\n{}", err.hint());
            return Ok(ExitCode::from(2));
        }
        Err(err) => return Err(err).context("Apply failed"),
    };

    let report = json!({
        "device": args.device_id,
        "result": outcome,
        "configuration": store.current_configuration(&args.device_id).await?,
        "history": store.history(&args.device_id),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(match outcome {
        ApplyOutcome::Committed { .. } => ExitCode::SUCCESS,
        ApplyOutcome::RolledBack { .. } => ExitCode::from(1),
    })
}
