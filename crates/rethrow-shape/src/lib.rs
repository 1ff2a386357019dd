// SPDX-License-Identifier: MIT OR Apache-2.0
//! Map plain values onto declared shapes.
//!
//! A *shape* is any type that is both [`DeserializeOwned`] and
//! [`JsonSchema`]: its declared fields are the top-level properties of its
//! JSON schema.  [`map_shape`] serialises an arbitrary value, optionally
//! drops every field the shape does not declare, and deserialises the rest
//! into the shape.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while mapping a value onto a shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// The raw value could not be serialised.
    #[error("failed to serialize source value: {reason}")]
    Serialize {
        /// Serializer error detail.
        reason: String,
    },

    /// The filtered value does not fit the target shape.
    #[error("value does not fit shape `{shape}`: {reason}")]
    Deserialize {
        /// Type name of the target shape.
        shape: String,
        /// Deserializer error detail.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// TransformOptions
// ---------------------------------------------------------------------------

/// Options controlling [`map_shape`].
///
/// Every field is optional so that caller overrides can be layered over
/// [`TransformOptions::defaults`] with [`TransformOptions::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOptions {
    /// Drop every top-level field the shape does not declare.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_extraneous_values: Option<bool>,

    /// Drop top-level fields whose name starts with any of these prefixes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_prefixes: Option<Vec<String>>,
}

impl TransformOptions {
    /// Options with nothing set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The baseline used by result transforms: undeclared fields are dropped.
    pub fn defaults() -> Self {
        Self {
            exclude_extraneous_values: Some(true),
            exclude_prefixes: None,
        }
    }

    /// Set whether undeclared fields are dropped.
    #[must_use]
    pub fn exclude_extraneous_values(mut self, exclude: bool) -> Self {
        self.exclude_extraneous_values = Some(exclude);
        self
    }

    /// Add a field-name prefix to drop.
    #[must_use]
    pub fn exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.exclude_prefixes
            .get_or_insert_with(Vec::new)
            .push(prefix.into());
        self
    }

    /// Layer `overlay` over `self`; values set in `overlay` win.
    #[must_use]
    pub fn merge(self, overlay: TransformOptions) -> TransformOptions {
        TransformOptions {
            exclude_extraneous_values: overlay
                .exclude_extraneous_values
                .or(self.exclude_extraneous_values),
            exclude_prefixes: overlay.exclude_prefixes.or(self.exclude_prefixes),
        }
    }

    /// Whether undeclared fields are dropped (unset means keep them).
    pub fn excludes_extraneous(&self) -> bool {
        self.exclude_extraneous_values.unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// Top-level field names declared by the shape `S`.
///
/// Returns `None` when the schema of `S` is not an object with declared
/// properties (maps, sequences, scalars).
pub fn declared_fields<S: JsonSchema>() -> Option<BTreeSet<String>> {
    let schema = serde_json::to_value(schemars::schema_for!(S)).ok()?;
    let properties = schema.get("properties")?.as_object()?;
    Some(properties.keys().cloned().collect())
}

/// Map `value` onto the shape `S`.
///
/// Only top-level fields are filtered; nested values are left to `S`'s own
/// deserializer.  Shapes without declared properties receive the value
/// unfiltered.
pub fn map_shape<S, V>(value: &V, options: &TransformOptions) -> Result<S, ShapeError>
where
    S: DeserializeOwned + JsonSchema,
    V: Serialize + ?Sized,
{
    let mut raw = serde_json::to_value(value).map_err(|e| ShapeError::Serialize {
        reason: e.to_string(),
    })?;

    if let Value::Object(map) = &mut raw {
        if options.excludes_extraneous()
            && let Some(declared) = declared_fields::<S>()
        {
            map.retain(|key, _| declared.contains(key));
        }
        if let Some(prefixes) = &options.exclude_prefixes {
            map.retain(|key, _| !prefixes.iter().any(|p| key.starts_with(p.as_str())));
        }
    }

    serde_json::from_value(raw).map_err(|e| ShapeError::Deserialize {
        shape: std::any::type_name::<S>().to_string(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
