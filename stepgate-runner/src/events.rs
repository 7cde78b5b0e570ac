// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw outcome events, as produced by a test runner.
//!
//! The types here mirror what the runner knows about a test phase: a three-valued outcome flag
//! plus an unstructured failure representation. Turning that into something meaningful is the
//! job of [`classify`](crate::classify).

use crate::{
    errors::{OutcomeParseError, PhaseParseError},
    incremental::DependencyKey,
};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{fmt, str::FromStr};

/// The text some runners use to signal that a test marked as expected-to-fail actually passed.
pub const UNEXPECTED_SUCCESS_MARKER: &str = "Unexpected success";

/// An opaque test identifier, stable across the phases of a single test.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(SmolStr);

impl TestId {
    /// Creates a new test identifier.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id))
    }

    /// Returns the identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TestId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the three sub-steps of executing a test.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Phase {
    /// Fixture and resource setup, before the test body.
    Setup,

    /// The test body itself.
    Call,

    /// Fixture and resource teardown, after the test body.
    Teardown,
}

impl Phase {
    /// String representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["setup", "call", "teardown"]
    }

    /// Returns true if this is the call phase.
    pub fn is_call(self) -> bool {
        matches!(self, Phase::Call)
    }
}

impl FromStr for Phase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "setup" => Phase::Setup,
            "call" => Phase::Call,
            "teardown" => Phase::Teardown,
            other => return Err(PhaseParseError::new(other)),
        };
        Ok(val)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Call => write!(f, "call"),
            Phase::Teardown => write!(f, "teardown"),
        }
    }
}

/// The raw outcome flag reported by the runner.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Outcome {
    /// The phase passed.
    Passed,

    /// The phase failed.
    Failed,

    /// The phase was skipped.
    Skipped,
}

impl Outcome {
    /// String representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["passed", "failed", "skipped"]
    }
}

impl FromStr for Outcome {
    type Err = OutcomeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "passed" => Outcome::Passed,
            "failed" => Outcome::Failed,
            "skipped" => Outcome::Skipped,
            other => return Err(OutcomeParseError::new(other)),
        };
        Ok(val)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::Failed => write!(f, "failed"),
            Outcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// The failure representation attached to an outcome event.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FailureRepr {
    /// No representation was attached.
    #[default]
    None,

    /// A free-form rendered representation, possibly spanning several lines.
    Text {
        /// The full rendered text.
        text: String,

        /// The short crash description, if the runner supplied one separately.
        #[serde(default, rename = "crash-message")]
        crash_message: Option<String>,
    },

    /// A structured skip marker: where the skip was raised and why.
    SkipLocation {
        /// The file the skip was raised from.
        path: Utf8PathBuf,

        /// The line number within `path`.
        line: u32,

        /// The skip reason.
        reason: String,
    },
}

impl FailureRepr {
    /// Creates a free-text representation without a separate crash message.
    pub fn text(text: impl Into<String>) -> Self {
        FailureRepr::Text {
            text: text.into(),
            crash_message: None,
        }
    }

    /// Returns the free-form text, if this is a text representation.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FailureRepr::Text { text, .. } => Some(text),
            FailureRepr::None | FailureRepr::SkipLocation { .. } => None,
        }
    }

    /// Returns true if this is a structured skip marker.
    pub fn is_skip_location(&self) -> bool {
        matches!(self, FailureRepr::SkipLocation { .. })
    }

    /// Returns true if the text is exactly the unexpected-success marker.
    pub fn is_unexpected_success_marker(&self) -> bool {
        self.as_text() == Some(UNEXPECTED_SUCCESS_MARKER)
    }

    /// Returns the short description of the failure.
    ///
    /// This is the runner-supplied crash message if there is one, otherwise the last non-empty
    /// line of the text. For skip markers, this is the skip reason.
    pub fn crash_message(&self) -> Option<&str> {
        match self {
            FailureRepr::None => None,
            FailureRepr::Text {
                crash_message: Some(message),
                ..
            } => Some(message),
            FailureRepr::Text {
                text,
                crash_message: None,
            } => text.lines().rev().map(str::trim).find(|line| !line.is_empty()),
            FailureRepr::SkipLocation { reason, .. } => Some(reason),
        }
    }
}

/// One runner-reported result for one phase of one test.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawOutcomeEvent {
    /// The test this event belongs to.
    pub test_id: TestId,

    /// The phase this event reports on.
    pub phase: Phase,

    /// The raw outcome flag.
    pub outcome: Outcome,

    /// The failure representation, if any.
    #[serde(default)]
    pub failure: FailureRepr,

    /// A short human description of the test's intent.
    #[serde(default)]
    pub summary: Option<String>,

    /// The incremental chain this test belongs to, if any.
    #[serde(default)]
    pub dependency: Option<DependencyKey>,
}

impl RawOutcomeEvent {
    /// Creates a new event with no failure representation, summary or dependency.
    pub fn new(test_id: impl Into<TestId>, phase: Phase, outcome: Outcome) -> Self {
        Self {
            test_id: test_id.into(),
            phase,
            outcome,
            failure: FailureRepr::None,
            summary: None,
            dependency: None,
        }
    }

    /// Sets the failure representation.
    pub fn with_failure(mut self, failure: FailureRepr) -> Self {
        self.failure = failure;
        self
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the dependency key.
    pub fn with_dependency(mut self, dependency: DependencyKey) -> Self {
        self.dependency = Some(dependency);
        self
    }

    /// Returns true if this event stands for the test's result in its phase.
    ///
    /// Call-phase events are always terminal. Setup and teardown events only are if something
    /// went differently from plan: a passing fixture isn't worth reporting.
    pub fn is_terminal(&self) -> bool {
        self.phase.is_call() || self.outcome != Outcome::Passed
    }

    /// Returns the name to display for this test: the summary if present, otherwise the test ID.
    pub fn display_name(&self) -> &str {
        self.summary.as_deref().unwrap_or(self.test_id.as_str())
    }
}

/// The exit status reported by the runner at session finish.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionExitStatus {
    /// All tests passed.
    Ok,

    /// Some tests failed.
    TestsFailed,

    /// The runner hit an internal error.
    InternalError,

    /// Any other status, such as an interrupted or aborted run.
    Other,
}

impl SessionExitStatus {
    /// Returns true if the session completed normally and a summary should be printed.
    pub fn is_completed(self) -> bool {
        matches!(self, SessionExitStatus::Ok | SessionExitStatus::TestsFailed)
    }
}
