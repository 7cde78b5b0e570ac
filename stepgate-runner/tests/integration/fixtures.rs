// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use color_eyre::eyre::Result;
use stepgate_metadata::SessionSummary;
use stepgate_runner::{
    config::StepgateConfig,
    events::{FailureRepr, Outcome, Phase, RawOutcomeEvent, SessionExitStatus},
    reporter::{ReporterBuilder, ReporterOutput},
    session::{SetupDecision, TestItem, TestSession},
};

/// What a simulated test does when its body runs.
#[derive(Clone, Debug)]
pub(crate) enum Body {
    Pass,
    Fail(&'static str),
    Skip(&'static str),
}

/// A test in a simulated run.
#[derive(Clone, Debug)]
pub(crate) struct SimTest {
    pub(crate) item: TestItem,
    pub(crate) body: Body,
}

impl SimTest {
    pub(crate) fn new(id: &str, summary: &str, body: Body) -> Self {
        let name = id.rsplit("::").next().unwrap_or(id);
        Self {
            item: TestItem {
                summary: Some(summary.to_owned()),
                ..TestItem::new(id, name)
            },
            body,
        }
    }

    pub(crate) fn step_of(
        mut self,
        class_identity: &str,
        param_indices: Option<Vec<usize>>,
    ) -> Self {
        self.item.class_identity = Some(class_identity.to_owned());
        self.item.param_indices = param_indices;
        self.item.incremental = true;
        self
    }
}

/// The result of a simulated run.
pub(crate) struct SimRun {
    pub(crate) output: String,
    pub(crate) summary: SessionSummary,
    /// The IDs of tests whose bodies actually ran, in order.
    pub(crate) executed: Vec<String>,
}

/// Runs `tests` in order the way a test runner would: consult the session before setup, then
/// report setup, call and teardown.
pub(crate) fn simulate(config: &StepgateConfig, tests: &[SimTest]) -> Result<SimRun> {
    let mut out = Vec::new();
    let mut executed = Vec::new();
    let summary = {
        let mut session = TestSession::new(
            config,
            ReporterBuilder::default(),
            ReporterOutput::Buffer(&mut out),
        );

        let mut any_failed = false;
        for test in tests {
            let item = &test.item;
            if let SetupDecision::Skip { event } = session.before_setup(item) {
                session.report(item, event)?;
                continue;
            }

            session.report(
                item,
                RawOutcomeEvent::new(item.id.clone(), Phase::Setup, Outcome::Passed),
            )?;
            executed.push(item.id.to_string());
            let call = match test.body {
                Body::Pass => RawOutcomeEvent::new(item.id.clone(), Phase::Call, Outcome::Passed),
                Body::Fail(text) => {
                    any_failed = true;
                    RawOutcomeEvent::new(item.id.clone(), Phase::Call, Outcome::Failed)
                        .with_failure(FailureRepr::text(text))
                }
                Body::Skip(reason) => {
                    RawOutcomeEvent::new(item.id.clone(), Phase::Call, Outcome::Skipped)
                        .with_failure(FailureRepr::SkipLocation {
                            path: "tests/test_mkdir.py".into(),
                            line: 12,
                            reason: reason.to_owned(),
                        })
                }
            };
            session.report(item, call)?;
            session.report(
                item,
                RawOutcomeEvent::new(item.id.clone(), Phase::Teardown, Outcome::Passed),
            )?;
        }

        let exit_status = if any_failed {
            SessionExitStatus::TestsFailed
        } else {
            SessionExitStatus::Ok
        };
        session.finish(exit_status)?
    };

    Ok(SimRun {
        output: String::from_utf8(out)?,
        summary,
        executed,
    })
}
