// SPDX-License-Identifier: MIT OR Apache-2.0
//! Remap rules and the table that classifies failures against them.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use rethrow_error::{ErrorKind, Failure, FromMessage};
use tracing::trace;

// ── RethrowRule ─────────────────────────────────────────────────────────

/// "Fail with `dest` instead of `source`".
///
/// The destination constructor only ever sees the original message.
#[derive(Clone, Copy)]
pub struct RethrowRule {
    source: ErrorKind,
    dest: ErrorKind,
    construct: fn(String) -> Failure,
}

impl RethrowRule {
    /// Rule replacing failures of type `S` with a fresh `D`.
    pub fn new<S, D>() -> Self
    where
        S: Error + 'static,
        D: FromMessage,
    {
        Self {
            source: ErrorKind::of::<S>(),
            dest: ErrorKind::of::<D>(),
            construct: Failure::from_message::<D>,
        }
    }

    /// Kind this rule matches.
    pub fn source(&self) -> ErrorKind {
        self.source
    }

    /// Kind this rule produces.
    pub fn dest(&self) -> ErrorKind {
        self.dest
    }

    /// Build the replacement for `failure`.
    ///
    /// Does not check that `failure` is of the source kind.
    pub fn apply(&self, failure: &Failure) -> Failure {
        (self.construct)(failure.message()).with_origin(self.source)
    }
}

impl PartialEq for RethrowRule {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.dest == other.dest
    }
}

impl Eq for RethrowRule {}

impl fmt::Debug for RethrowRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RethrowRule")
            .field("source", &self.source)
            .field("dest", &self.dest)
            .finish_non_exhaustive()
    }
}

// ── RethrowTable ────────────────────────────────────────────────────────

/// Remap rules keyed by exact source kind.
#[derive(Debug, Clone, Default)]
pub struct RethrowTable {
    rules: HashMap<ErrorKind, RethrowRule>,
}

impl RethrowTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a rule, replacing and returning any rule for the same source.
    pub fn insert(&mut self, rule: RethrowRule) -> Option<RethrowRule> {
        self.rules.insert(rule.source, rule)
    }

    /// Looks up the rule for `source`.
    #[must_use]
    pub fn lookup(&self, source: ErrorKind) -> Option<&RethrowRule> {
        self.rules.get(&source)
    }

    /// Returns `true` if a rule for `source` exists.
    #[must_use]
    pub fn contains(&self, source: ErrorKind) -> bool {
        self.rules.contains_key(&source)
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the table holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns an iterator over all rules, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &RethrowRule> {
        self.rules.values()
    }

    /// Returns the registered source kinds, in no particular order.
    pub fn sources(&self) -> impl Iterator<Item = ErrorKind> + '_ {
        self.rules.keys().copied()
    }

    /// Classify `failure` in a single lookup.
    ///
    /// A hit yields a new failure of the destination kind carrying the
    /// original message; a miss is returned untouched.  Running the result
    /// through the same table again is the caller's business: a future only
    /// classifies its own outcome once.
    pub fn classify(&self, failure: Failure) -> Failure {
        match self.rules.get(&failure.kind()) {
            Some(rule) => {
                trace!(
                    target: "rethrow.table",
                    source = %rule.source,
                    dest = %rule.dest,
                    "rethrowing failure"
                );
                rule.apply(&failure)
            }
            None => {
                trace!(target: "rethrow.table", kind = %failure.kind(), "failure passes through");
                failure
            }
        }
    }
}

impl FromIterator<RethrowRule> for RethrowTable {
    fn from_iter<I: IntoIterator<Item = RethrowRule>>(iter: I) -> Self {
        let mut table = Self::new();
        for rule in iter {
            table.insert(rule);
        }
        table
    }
}

impl Extend<RethrowRule> for RethrowTable {
    fn extend<I: IntoIterator<Item = RethrowRule>>(&mut self, iter: I) {
        for rule in iter {
            self.insert(rule);
        }
    }
}
