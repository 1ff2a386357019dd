// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type-erased failures keyed by their exact concrete error type.
//!
//! Every future in the rethrow workspace fails with a [`Failure`]: a boxed
//! error together with the [`ErrorKind`] captured when it was wrapped.  The
//! kind is the identity used by remap tables, so two kinds are equal only
//! when they name the very same Rust type.
//!
//! Replacement errors are built from a message alone through
//! [`FromMessage`]; the [`error_kinds!`] macro declares message-only error
//! types that satisfy it.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::any::TypeId;
use std::error::Error;
use std::fmt;
use std::hash::{Hash, Hasher};

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Exact type tag of an error.
///
/// Equality and hashing only look at the [`TypeId`]; the type name is kept
/// for diagnostics.
#[derive(Clone, Copy)]
pub struct ErrorKind {
    id: TypeId,
    name: &'static str,
}

impl ErrorKind {
    /// Kind of the error type `E`.
    pub fn of<E: Error + 'static>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Fully qualified type name (e.g. `"my_crate::errors::NotFound"`).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name (e.g. `"NotFound"`).
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    /// Returns `true` if this is the kind of `E`.
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.id == TypeId::of::<E>()
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ErrorKind {}

impl Hash for ErrorKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorKind({})", self.name)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

// ---------------------------------------------------------------------------
// FromMessage
// ---------------------------------------------------------------------------

/// Error types that can be constructed from a single message.
///
/// Only these types may appear as the destination of a remap rule.
pub trait FromMessage: Error + Send + Sync + Sized + 'static {
    /// Build the error from `message`.
    fn from_message(message: String) -> Self;
}

impl FromMessage for std::io::Error {
    fn from_message(message: String) -> Self {
        std::io::Error::other(message)
    }
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// A failed computation's error, tagged with its exact concrete type.
///
/// A failure produced by a remap rule remembers the kind it replaced in
/// [`Failure::origin`].  The mark is diagnostic only: another future's
/// rules may still replace such a failure.
pub struct Failure {
    kind: ErrorKind,
    error: Box<dyn Error + Send + Sync + 'static>,
    origin: Option<ErrorKind>,
}

impl Failure {
    /// Wrap `error`, recording `E` as its kind.
    ///
    /// Wrapping a [`Failure`] returns it unchanged instead of nesting it.
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        let boxed: Box<dyn Error + Send + Sync + 'static> = Box::new(error);
        match boxed.downcast::<Failure>() {
            Ok(failure) => *failure,
            Err(error) => Self {
                kind: ErrorKind::of::<E>(),
                error,
                origin: None,
            },
        }
    }

    /// Build a fresh `D` from `message` and wrap it.
    ///
    /// Coerces to `fn(String) -> Failure`, which is how remap rules store
    /// their destination constructor.
    pub fn from_message<D: FromMessage>(message: String) -> Self {
        Self::new(D::from_message(message))
    }

    /// Mark this failure as the replacement of an error of kind `origin`.
    pub fn with_origin(mut self, origin: ErrorKind) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Exact kind of the wrapped error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Kind of the error this failure replaced, if it came from a remap rule.
    pub fn origin(&self) -> Option<ErrorKind> {
        self.origin
    }

    /// Returns `true` if this failure was produced by a remap rule.
    pub fn is_remapped(&self) -> bool {
        self.origin.is_some()
    }

    /// The wrapped error's display text.
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Returns `true` if the wrapped error is exactly an `E`.
    pub fn is<E: Error + 'static>(&self) -> bool {
        self.kind.is::<E>()
    }

    /// Borrow the wrapped error as `E`.
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref::<E>()
    }

    /// Take the wrapped error out as `E`, or give the failure back.
    pub fn downcast<E: Error + 'static>(self) -> Result<E, Self> {
        let Self {
            kind,
            error,
            origin,
        } = self;
        match error.downcast::<E>() {
            Ok(e) => Ok(*e),
            Err(error) => Err(Self {
                kind,
                error,
                origin,
            }),
        }
    }

    /// Unwrap into the boxed error.
    pub fn into_inner(self) -> Box<dyn Error + Send + Sync + 'static> {
        self.error
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("Failure");
        d.field("kind", &self.kind.name());
        d.field("error", &self.error);
        if let Some(origin) = self.origin {
            d.field("origin", &origin.name());
        }
        d.finish()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.error.source()
    }
}

// ---------------------------------------------------------------------------
// PlainError
// ---------------------------------------------------------------------------

/// Message-only error with no further structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PlainError {
    message: String,
}

impl PlainError {
    /// Create an error carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The carried message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl FromMessage for PlainError {
    fn from_message(message: String) -> Self {
        Self { message }
    }
}

// ---------------------------------------------------------------------------
// error_kinds!
// ---------------------------------------------------------------------------

/// Declare message-only error types usable as remap sources and
/// destinations.
///
/// ```
/// rethrow_error::error_kinds! {
///     /// Lookup missed.
///     pub struct NotFound;
///     pub struct Conflict;
/// }
///
/// let err = NotFound::new("no such user");
/// assert_eq!(err.to_string(), "no such user");
/// ```
#[macro_export]
macro_rules! error_kinds {
    ($($(#[$meta:meta])* $vis:vis struct $name:ident;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Default, PartialEq, Eq)]
            $vis struct $name {
                message: ::std::string::String,
            }

            impl $name {
                /// Create an error carrying `message`.
                #[allow(dead_code)]
                pub fn new(message: impl ::std::convert::Into<::std::string::String>) -> Self {
                    Self {
                        message: message.into(),
                    }
                }

                /// The carried message.
                #[allow(dead_code)]
                pub fn message(&self) -> &str {
                    &self.message
                }
            }

            impl ::std::fmt::Display for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    f.write_str(&self.message)
                }
            }

            impl ::std::error::Error for $name {}

            impl $crate::FromMessage for $name {
                fn from_message(message: ::std::string::String) -> Self {
                    Self { message }
                }
            }

            impl ::std::convert::From<&str> for $name {
                fn from(message: &str) -> Self {
                    Self {
                        message: message.to_owned(),
                    }
                }
            }

            impl ::std::convert::From<::std::string::String> for $name {
                fn from(message: ::std::string::String) -> Self {
                    Self { message }
                }
            }
        )+
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
