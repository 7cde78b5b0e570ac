// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Incremental gating: fail-fast chains of dependent tests.
//!
//! Tests in an incremental chain share a [`DependencyKey`]. Once one of them fails, every later
//! test under the same key is converted to an expected failure instead of being run. The first
//! failure under a key wins and is never overwritten.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use smol_str::SmolStr;
use std::{collections::HashMap, fmt};
use tracing::debug;

/// The ordered parameter-slot indices of a parametrized test.
///
/// Empty for tests that aren't parametrized.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamCoordinate(SmallVec<[usize; 4]>);

impl ParamCoordinate {
    /// Returns the parameter-slot indices.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Returns true if this is the coordinate of an unparametrized test.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<usize> for ParamCoordinate {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<&[usize]> for ParamCoordinate {
    fn from(indices: &[usize]) -> Self {
        Self(SmallVec::from_slice(indices))
    }
}

impl fmt::Display for ParamCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        // A one-element coordinate is displayed as `(0,)`, so it can't be mistaken for a number.
        if self.0.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

/// Groups tests into a fail-fast chain: a class identity plus a parametrization coordinate.
///
/// Equality is structural. Two tests of the same class with different coordinates form
/// independent chains.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencyKey {
    class_identity: SmolStr,
    #[serde(default)]
    coordinate: ParamCoordinate,
}

impl DependencyKey {
    /// Creates a new dependency key.
    pub fn new(class_identity: impl AsRef<str>, coordinate: ParamCoordinate) -> Self {
        Self {
            class_identity: SmolStr::new(class_identity),
            coordinate,
        }
    }

    /// Builds the key for a test, if the test can be gated at all.
    ///
    /// Returns `None` if the class identity is missing or blank: such tests are never gated.
    pub fn for_test(class_identity: Option<&str>, param_indices: Option<&[usize]>) -> Option<Self> {
        let class_identity = class_identity.map(str::trim).filter(|c| !c.is_empty())?;
        let coordinate = param_indices.map(ParamCoordinate::from).unwrap_or_default();
        Some(Self::new(class_identity, coordinate))
    }

    /// Returns the class identity.
    pub fn class_identity(&self) -> &str {
        &self.class_identity
    }

    /// Returns the parametrization coordinate.
    pub fn coordinate(&self) -> &ParamCoordinate {
        &self.coordinate
    }

    /// Returns true if this key is usable for gating.
    ///
    /// Keys deserialized from outside sources may carry a blank class identity.
    pub fn is_well_formed(&self) -> bool {
        !self.class_identity.trim().is_empty()
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.class_identity, self.coordinate)
    }
}

/// Maps each dependency key to the name of the first test that failed under it.
#[derive(Clone, Debug, Default)]
pub struct FailureLedger {
    first_failures: HashMap<DependencyKey, SmolStr>,
}

impl FailureLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure under `key`, unless one is already recorded.
    ///
    /// Returns true if this call inserted the entry.
    pub fn insert_if_absent(&mut self, key: &DependencyKey, test_name: &str) -> bool {
        if self.first_failures.contains_key(key) {
            return false;
        }
        self.first_failures
            .insert(key.clone(), SmolStr::new(test_name));
        true
    }

    /// Returns the first failing test recorded under `key`.
    pub fn get(&self, key: &DependencyKey) -> Option<&str> {
        self.first_failures.get(key).map(SmolStr::as_str)
    }

    /// Returns the number of chains that have failed.
    pub fn len(&self) -> usize {
        self.first_failures.len()
    }

    /// Returns true if no chain has failed.
    pub fn is_empty(&self) -> bool {
        self.first_failures.is_empty()
    }

    /// Forgets every recorded failure.
    pub fn clear(&mut self) {
        self.first_failures.clear();
    }
}

/// Decides whether tests in an incremental chain should run.
///
/// The guard only answers questions; converting a gated test into an expected failure is up to
/// the caller (see [`TestSession::before_setup`](crate::session::TestSession::before_setup)).
#[derive(Clone, Debug)]
pub struct IncrementalGuard {
    ledger: FailureLedger,
    enabled: bool,
}

impl Default for IncrementalGuard {
    fn default() -> Self {
        Self::new(true)
    }
}

impl IncrementalGuard {
    /// Creates a new guard with an empty ledger.
    ///
    /// If `enabled` is false, failures are still recorded but [`Self::should_skip`] never gates.
    pub fn new(enabled: bool) -> Self {
        Self {
            ledger: FailureLedger::new(),
            enabled,
        }
    }

    /// Records the outcome of a test's call phase.
    ///
    /// If `failed` is true and no failure is recorded under `key` yet, `test_name` becomes the
    /// failure that gates the rest of the chain. Returns true if an entry was inserted.
    pub fn record_if_failed(&mut self, test_name: &str, key: &DependencyKey, failed: bool) -> bool {
        if !failed || !key.is_well_formed() {
            return false;
        }
        let inserted = self.ledger.insert_if_absent(key, test_name);
        if inserted {
            debug!(%key, test_name, "recorded first failure in incremental chain");
        }
        inserted
    }

    /// Returns the first failing test under `key`, if the test about to run should be gated.
    pub fn should_skip(&self, key: &DependencyKey) -> Option<&str> {
        if !self.enabled || !key.is_well_formed() {
            return None;
        }
        let first_failure = self.ledger.get(key)?;
        debug!(%key, first_failure, "gating test after earlier failure in chain");
        Some(first_failure)
    }

    /// Forgets every recorded failure, keeping the enabled flag.
    ///
    /// Called at session start: chains never carry over from one session to the next.
    pub fn reset(&mut self) {
        self.ledger.clear();
    }

    /// Returns the ledger of recorded failures.
    pub fn ledger(&self) -> &FailureLedger {
        &self.ledger
    }
}

/// Returns the reason attached to a test gated by `first_failure`.
pub fn gated_reason(first_failure: &str) -> String {
    format!("previous test failed ({first_failure})")
}
