// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use stepgate_metadata::StepgateExitCode;
use stepgate_runner::{
    classify::{Category, classify},
    config::StepgateConfig,
    events::{FailureRepr, Outcome, Phase, RawOutcomeEvent},
};
use test_case::test_case;

#[test]
fn test_selfcheck_run() -> Result<()> {
    let run = simulate(
        &StepgateConfig::default(),
        &[SimTest::new("tests/test_self.py::test_import", "Selfcheck: import works", Body::Pass)],
    )?;
    assert_eq!(
        run.output,
        indoc! {"
            [PASS] Selfcheck: import works

            /** TEST PASSED: 1 **/
        "}
    );
    assert_eq!(run.summary.exit_code(), StepgateExitCode::OK);
    Ok(())
}

#[test]
fn test_assertion_failure_run() -> Result<()> {
    let run = simulate(
        &StepgateConfig::default(),
        &[SimTest::new(
            "tests/test_mkdir.py::test_mode",
            "Check directory mode",
            Body::Fail(
                "def test_mode():\n>       assert mode == 0o755\nAssertionError: expected 1 got 2",
            ),
        )],
    )?;
    assert_eq!(
        run.output,
        indoc! {"
            [FAIL] Check directory mode, expected 1 got 2

            /** TEST FAILED: 1 (failures=1), total 1 **/
        "}
    );
    assert_eq!(run.summary.exit_code(), StepgateExitCode::TESTS_FAILED);
    Ok(())
}

#[test]
fn test_mixed_run() -> Result<()> {
    let run = simulate(
        &StepgateConfig::default(),
        &[
            SimTest::new("t::test_a", "Create a directory", Body::Pass),
            SimTest::new("t::test_b", "Create nested directories", Body::Skip("needs root")),
            SimTest::new(
                "t::test_c",
                "Create with bad mode",
                Body::Fail("ValueError: invalid mode"),
            ),
        ],
    )?;
    assert_eq!(
        run.output,
        indoc! {"
            [PASS] Create a directory
            [SKIP] Create nested directories
            [ERROR] Create with bad mode, ValueError: invalid mode

            /** TEST FAILED: 1 (errors=1, skipped=1), total 3 **/
        "}
    );
    assert_eq!(run.summary.counts.passed, 1);
    Ok(())
}

#[test_case(
    FailureRepr::SkipLocation { path: "t.py".into(), line: 3, reason: "skipped".to_owned() },
    Category::Skip
    ; "structured skip"
)]
#[test_case(FailureRepr::text("reason: known bug"), Category::Xfail ; "free-text skip")]
fn test_skip_representations(failure: FailureRepr, expected: Category) {
    for phase in [Phase::Setup, Phase::Call] {
        let event =
            RawOutcomeEvent::new("t::a", phase, Outcome::Skipped).with_failure(failure.clone());
        assert_eq!(classify(&event), expected, "phase {phase}");
    }
}

#[test]
fn test_unexpected_success_marker() {
    let event = RawOutcomeEvent::new("t::a", Phase::Call, Outcome::Failed)
        .with_failure(FailureRepr::text("Unexpected success"));
    assert_eq!(classify(&event), Category::Upass);
}
