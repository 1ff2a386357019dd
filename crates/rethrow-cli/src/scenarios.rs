// SPDX-License-Identifier: MIT OR Apache-2.0
//! The two error-remapping styles under comparison.

use std::future::ready;
use std::str::FromStr;

use rethrow_core::{Failure, PlainError, RethrowFuture};
use rethrow_harness::{BenchReport, run_bench};

use crate::errors::*;

/// A benchmark scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Fourteen chained `rethrow_as` declarations.
    Rethrow,
    /// A hand-written `is::<…>()` chain after catching the failure.
    Switch,
}

impl Scenario {
    /// Name used in config files and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rethrow => "rethrow",
            Self::Switch => "switch",
        }
    }
}

impl FromStr for Scenario {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rethrow" => Ok(Self::Rethrow),
            "switch" => Ok(Self::Switch),
            other => anyhow::bail!("unknown scenario '{other}'"),
        }
    }
}

/// Fail with `OtherError6` and remap it through a fourteen-rule chain.
pub async fn rethrow_chain() -> Result<(), Failure> {
    RethrowFuture::<()>::rejected(OtherError6::default())
        .rethrow_as::<OtherError, PlainError>()
        .rethrow_as::<OtherError2, PlainError>()
        .rethrow_as::<OtherError3, PlainError>()
        .rethrow_as::<OtherError4, PlainError>()
        .rethrow_as::<OtherError5, PlainError>()
        .rethrow_as::<OtherError6, PlainError>()
        .rethrow_as::<OtherError7, PlainError>()
        .rethrow_as::<OtherError8, PlainError>()
        .rethrow_as::<OtherError9, PlainError>()
        .rethrow_as::<OtherError10, PlainError>()
        .rethrow_as::<OtherError11, PlainError>()
        .rethrow_as::<OtherError12, PlainError>()
        .rethrow_as::<OtherError13, PlainError>()
        .rethrow_as::<CustomError, PlainError>()
        .await
}

/// Fail with `OtherError6`, catch it, and classify it by hand.
pub async fn manual_switch() -> Result<(), Failure> {
    let outcome: Result<(), Failure> = ready(Err(Failure::new(OtherError6::default()))).await;
    outcome.map_err(switch_on_kind)
}

/// Replace any of the fourteen known kinds with a [`PlainError`]; rethrow
/// anything else unchanged.
#[allow(clippy::if_same_then_else)]
pub fn switch_on_kind(e: Failure) -> Failure {
    let replacement = if e.is::<OtherError>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError2>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError3>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError4>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError5>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError6>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError7>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError8>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError9>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError10>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError11>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError12>() {
        PlainError::new(e.message())
    } else if e.is::<OtherError13>() {
        PlainError::new(e.message())
    } else if e.is::<CustomError>() {
        PlainError::new(e.message())
    } else {
        return e;
    };
    Failure::new(replacement)
}

/// Time `scenario` over `iterations` runs.
pub async fn run_scenario(scenario: Scenario, iterations: u64) -> BenchReport {
    match scenario {
        Scenario::Rethrow => {
            run_bench(scenario.name(), iterations, |sw| async move {
                sw.start();
                // The failure is the expected outcome.
                let _ = rethrow_chain().await;
                sw.end();
            })
            .await
        }
        Scenario::Switch => {
            run_bench(scenario.name(), iterations, |sw| async move {
                sw.start();
                let _ = manual_switch().await;
                sw.end();
            })
            .await
        }
    }
}
