// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `script_properties`: parsing and validation are all-or-nothing
//! - `history_properties`: history bounds, version ordering, restore and
//!   rollback fidelity on interpreted configurations
//! - `strategies`: generators shared by both

mod history_properties;
mod script_properties;
mod strategies;
