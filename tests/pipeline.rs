// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end tests wiring rethrow chains, continuations and shape transforms
//! together across crates.

use rethrow_cli::errors::{CustomError, OtherError6};
use rethrow_cli::{manual_switch, rethrow_chain};
use rethrow_core::{Failure, PlainError, RethrowFuture, ShapeError, TransformOptions, error_kinds};
use rethrow_harness::{DEFAULT_ITERATIONS, parse_iterations};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

error_kinds! {
    /// Raised by the fake store.
    struct StoreError;
    /// What callers of the fake service see.
    struct ServiceError;
}

#[derive(Debug, Serialize)]
struct Record {
    id: u32,
    name: String,
    secret: String,
}

#[derive(Debug, Deserialize, JsonSchema, PartialEq)]
struct PublicRecord {
    id: u32,
    name: String,
}

fn fetch(ok: bool) -> RethrowFuture<Record> {
    RethrowFuture::with_producer(move |settler| {
        if ok {
            settler.resolve(Record {
                id: 7,
                name: "seven".into(),
                secret: "hunter2".into(),
            });
        } else {
            settler.reject(StoreError::new("row locked"));
        }
    })
}

// ── Scenario parity ─────────────────────────────────────────────────────

#[tokio::test]
async fn both_scenarios_produce_the_same_failure() {
    let declared = rethrow_chain().await.unwrap_err();
    let manual = manual_switch().await.unwrap_err();
    assert!(declared.is::<PlainError>());
    assert!(manual.is::<PlainError>());
    assert_eq!(declared.message(), manual.message());
}

#[test]
fn iteration_fallback_matches_default() {
    assert_eq!(parse_iterations(None), DEFAULT_ITERATIONS);
    assert_eq!(parse_iterations(Some("12")), 12);
}

// ── Rethrow + transform ─────────────────────────────────────────────────

#[tokio::test]
async fn transform_strips_undeclared_fields_on_success() {
    let out = fetch(true)
        .rethrow_as::<StoreError, ServiceError>()
        .transform::<PublicRecord>(TransformOptions::new())
        .await
        .unwrap();
    assert_eq!(
        out,
        PublicRecord {
            id: 7,
            name: "seven".into()
        }
    );
}

#[tokio::test]
async fn transform_passes_remapped_failure_through() {
    let err = fetch(false)
        .rethrow_as::<StoreError, ServiceError>()
        .transform::<PublicRecord>(TransformOptions::new())
        .await
        .unwrap_err();
    assert!(err.is::<ServiceError>());
    assert!(!err.is::<ShapeError>());
    assert_eq!(err.message(), "row locked");
}

#[tokio::test]
async fn rules_registered_on_derived_future_apply_to_continuation_failures() {
    let err = fetch(true)
        .settle(
            |_| async { Err::<(), _>(Failure::new(CustomError::new("late"))) },
            |f| async move { Err(f) },
        )
        .rethrow_as::<CustomError, ServiceError>()
        .await
        .unwrap_err();
    assert!(err.is::<ServiceError>());
    assert_eq!(err.message(), "late");
}

#[tokio::test]
async fn derived_future_inherits_parent_rules() {
    let derived = fetch(false)
        .rethrow_as::<OtherError6, PlainError>()
        .map_ok(|r| r.id);
    assert!(!derived.is_intercepting());
    assert_eq!(derived.table().len(), 1);

    let err = derived.await.unwrap_err();
    assert!(err.is::<StoreError>());
}

#[tokio::test]
async fn catch_recovers_after_remap() {
    let id = fetch(false)
        .rethrow_as::<StoreError, ServiceError>()
        .map_ok(|r| r.id)
        .catch(|f| async move {
            if f.is::<ServiceError>() {
                Ok(0)
            } else {
                Err(f)
            }
        })
        .await
        .unwrap();
    assert_eq!(id, 0);
}
