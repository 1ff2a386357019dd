// SPDX-License-Identifier: MIT OR Apache-2.0
//! Futures with declarative, type-keyed error remapping.
//!
//! [`RethrowFuture`] wraps an asynchronous computation and lets the caller
//! declare, ahead of awaiting it, which error types should be replaced by
//! which others:
//!
//! ```ignore
//! let user = fetch_user(id)
//!     .rethrow_as::<RowNotFound, UserMissing>()
//!     .rethrow_as::<PoolTimeout, Unavailable>()
//!     .await?;
//! ```
//!
//! Matching is by exact concrete type.  A matched failure is replaced by a
//! new error built from the original message alone; anything else passes
//! through untouched.
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod future;
mod settler;
mod table;

pub use future::RethrowFuture;
pub use settler::{SettleError, Settler};
pub use table::{RethrowRule, RethrowTable};

pub use rethrow_error::{ErrorKind, Failure, FromMessage, PlainError, error_kinds};
pub use rethrow_shape::{ShapeError, TransformOptions};
