// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scenarios for the `rethrow-bench` binary.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod scenarios;

pub use scenarios::{Scenario, manual_switch, rethrow_chain, run_scenario, switch_on_kind};
