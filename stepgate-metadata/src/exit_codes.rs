// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `stepgate` runs.
///
/// A run may fail for a variety of reasons. This structure documents the exit codes that may
/// occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum StepgateExitCode {}

impl StepgateExitCode {
    /// No errors occurred and all observed tests passed, skipped or failed as expected.
    pub const OK: i32 = 0;

    /// The runner reported an internal fault, as opposed to a test-level failure.
    pub const INTERNAL_ERROR: i32 = 3;

    /// The session finished without observing any call-phase events.
    pub const NO_TESTS_RUN: i32 = 4;

    /// One or more tests failed, errored, or unexpectedly passed.
    pub const TESTS_FAILED: i32 = 100;

    /// A user issue happened while setting up a stepgate invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// A recorded event log could not be parsed.
    pub const EVENT_LOG_PARSE_FAILED: i32 = 97;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
