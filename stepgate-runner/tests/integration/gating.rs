// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::Result;
use indoc::indoc;
use pretty_assertions::assert_eq;
use stepgate_runner::config::StepgateConfig;

fn prereq_steps() -> Vec<SimTest> {
    vec![
        SimTest::new(
            "t::TestPrereq::test_a",
            "Is mkdir installed",
            Body::Fail("AssertionError: not found"),
        )
        .step_of("tests.test_prereq.TestPrereq", None),
        SimTest::new(
            "t::TestPrereq::test_b",
            "Is mkdir executable",
            Body::Fail("AssertionError: denied"),
        )
        .step_of("tests.test_prereq.TestPrereq", None),
        SimTest::new("t::TestPrereq::test_c", "Does mkdir print help", Body::Pass)
            .step_of("tests.test_prereq.TestPrereq", None),
    ]
}

#[test]
fn test_first_failure_gates_later_steps() -> Result<()> {
    let run = simulate(&StepgateConfig::default(), &prereq_steps())?;
    assert_eq!(run.executed, vec!["t::TestPrereq::test_a"]);
    assert_eq!(
        run.output,
        indoc! {"
            [FAIL] Is mkdir installed, not found
            [XFAIL] Is mkdir executable
            [XFAIL] Does mkdir print help

            /** TEST FAILED: 1 (failures=1, expected failures=2), total 1 **/
        "}
    );
    Ok(())
}

#[test]
fn test_gating_disabled() -> Result<()> {
    let mut config = StepgateConfig::default();
    config.incremental.enabled = false;
    let run = simulate(&config, &prereq_steps())?;
    assert_eq!(run.executed.len(), 3);
    assert_eq!(run.summary.counts.failures, 2);
    assert_eq!(run.summary.counts.passed, 1);
    Ok(())
}

#[test]
fn test_parametrized_chains_are_independent() -> Result<()> {
    let class = "tests.test_mkdir.TestModes";
    let run = simulate(
        &StepgateConfig::default(),
        &[
            SimTest::new("t::TestModes::test_create[0]", "Create", Body::Fail("AssertionError: 0"))
                .step_of(class, Some(vec![0])),
            SimTest::new("t::TestModes::test_create[1]", "Create", Body::Pass)
                .step_of(class, Some(vec![1])),
            SimTest::new("t::TestModes::test_check[0]", "Check", Body::Pass)
                .step_of(class, Some(vec![0])),
            SimTest::new("t::TestModes::test_check[1]", "Check", Body::Pass)
                .step_of(class, Some(vec![1])),
        ],
    )?;
    assert_eq!(
        run.executed,
        vec![
            "t::TestModes::test_create[0]",
            "t::TestModes::test_create[1]",
            "t::TestModes::test_check[1]",
        ]
    );
    assert_eq!(run.summary.counts.expected_failures, 1);
    Ok(())
}

#[test]
fn test_other_classes_are_unaffected() -> Result<()> {
    let mut tests = prereq_steps();
    tests.insert(
        1,
        SimTest::new("t::TestOther::test_x", "Unrelated step", Body::Pass)
            .step_of("tests.TestOther", None),
    );
    tests.push(SimTest::new("t::test_loose", "Not part of a chain", Body::Pass));
    let run = simulate(&StepgateConfig::default(), &tests)?;
    assert_eq!(
        run.executed,
        vec!["t::TestPrereq::test_a", "t::TestOther::test_x", "t::test_loose"]
    );
    Ok(())
}
