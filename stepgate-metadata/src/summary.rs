// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::StepgateExitCode;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A machine-readable summary of one reporting session.
///
/// Produced once at the end of every session, regardless of whether the textual summary line was
/// printed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionSummary {
    /// The time at which the session started.
    pub started_at: DateTime<FixedOffset>,

    /// Wall-clock time between session start and finish, in milliseconds.
    pub elapsed_ms: u64,

    /// The worker this session belongs to, if the run was distributed across workers.
    ///
    /// If set, the counts below only cover this worker's view of the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,

    /// The number of call-phase events observed.
    pub total: usize,

    /// Counts per category, including setup and teardown events.
    pub counts: CategoryCounts,
}

impl SessionSummary {
    /// Returns true if any test failed, errored, or unexpectedly passed.
    pub fn has_failures(&self) -> bool {
        self.counts.problem_count() > 0
    }

    /// Returns the process exit code corresponding to this summary.
    pub fn exit_code(&self) -> i32 {
        if self.has_failures() {
            StepgateExitCode::TESTS_FAILED
        } else if self.total == 0 {
            StepgateExitCode::NO_TESTS_RUN
        } else {
            StepgateExitCode::OK
        }
    }
}

/// Per-category counts within a [`SessionSummary`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CategoryCounts {
    /// Tests that passed.
    pub passed: usize,

    /// Assertion-style failures.
    pub failures: usize,

    /// Non-assertion failures: crashes, fixture errors and unrecognized exceptions.
    pub errors: usize,

    /// Tests skipped with a structured skip marker.
    pub skipped: usize,

    /// Tests that failed as expected.
    pub expected_failures: usize,

    /// Tests expected to fail that passed.
    pub unexpected_successes: usize,
}

impl CategoryCounts {
    /// The number of failures, errors and unexpected successes.
    pub fn problem_count(&self) -> usize {
        self.failures + self.errors + self.unexpected_successes
    }

    /// The sum of all counts.
    pub fn sum(&self) -> usize {
        self.passed
            + self.failures
            + self.errors
            + self.skipped
            + self.expected_failures
            + self.unexpected_successes
    }
}
