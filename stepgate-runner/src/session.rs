// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The runner-facing entry point: one object per session, driven through lifecycle callbacks.
//!
//! A runner constructs a [`TestSession`] at session start, calls
//! [`before_setup`](TestSession::before_setup) before each test's setup phase,
//! [`report`](TestSession::report) once per phase, and [`finish`](TestSession::finish) at the end.

use crate::{
    classify::{self, Category},
    config::StepgateConfig,
    errors::WriteEventError,
    events::{FailureRepr, Outcome, Phase, RawOutcomeEvent, SessionExitStatus, TestId},
    incremental::{DependencyKey, IncrementalGuard, gated_reason},
    reporter::{ReporterBuilder, ReporterOutput, SessionReporter},
};
use serde::{Deserialize, Serialize};
use stepgate_metadata::SessionSummary;

/// A test, as the runner sees it just before running it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestItem {
    /// The test's opaque identifier.
    pub id: TestId,

    /// The test function's original name, without parametrization suffixes.
    ///
    /// This is what gated tests refer to in their reason.
    pub name: String,

    /// The first line of the test's description, if any.
    #[serde(default)]
    pub summary: Option<String>,

    /// The identity of the class the test belongs to, if any.
    #[serde(default)]
    pub class_identity: Option<String>,

    /// The parameter-slot indices, if the test is parametrized.
    #[serde(default)]
    pub param_indices: Option<Vec<usize>>,

    /// Whether the test is a member of an incremental chain.
    #[serde(default)]
    pub incremental: bool,
}

impl TestItem {
    /// Creates a new, non-incremental test item.
    pub fn new(id: impl Into<TestId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            summary: None,
            class_identity: None,
            param_indices: None,
            incremental: false,
        }
    }

    /// Sets the summary from the test's full description, such as its docstring.
    pub fn with_description(mut self, description: &str) -> Self {
        self.summary = summary_from_description(description);
        self
    }

    /// Returns the key of the incremental chain this test belongs to.
    ///
    /// Returns `None` if the test isn't incremental or has no class identity.
    pub fn dependency_key(&self) -> Option<DependencyKey> {
        if !self.incremental {
            return None;
        }
        DependencyKey::for_test(self.class_identity.as_deref(), self.param_indices.as_deref())
    }
}

/// Returns the summary line of a test description: its first non-blank line, trimmed.
///
/// Returns `None` if the description has no visible text.
pub fn summary_from_description(description: &str) -> Option<String> {
    let first_line = description.trim_start().lines().next()?.trim();
    (!first_line.is_empty()).then(|| first_line.to_owned())
}

/// What the runner should do with a test about to be set up.
#[derive(Clone, Debug, Eq, PartialEq)]
#[must_use]
pub enum SetupDecision {
    /// Run the test normally.
    Run,

    /// Don't run the test. Report `event` in place of its phases instead.
    Skip {
        /// The expected-failure event standing in for the test.
        event: RawOutcomeEvent,
    },
}

/// One test-run session: a reporter plus the incremental-gating state.
pub struct TestSession<'a> {
    reporter: SessionReporter<'a>,
    guard: IncrementalGuard,
}

impl<'a> TestSession<'a> {
    /// Starts a new session.
    ///
    /// The reporter section of `config` overrides any config already set on `builder`.
    pub fn new(
        config: &StepgateConfig,
        mut builder: ReporterBuilder,
        output: ReporterOutput<'a>,
    ) -> Self {
        builder.set_config(config.reporter.clone());
        Self {
            reporter: builder.build(output),
            guard: IncrementalGuard::new(config.incremental.enabled),
        }
    }

    /// Starts (or restarts) the session: resets the tallies and forgets every recorded failure.
    pub fn on_session_start(&mut self) {
        self.reporter.on_session_start();
        self.guard.reset();
    }

    /// Decides whether `item` should run, given earlier failures in its chain.
    pub fn before_setup(&self, item: &TestItem) -> SetupDecision {
        let Some(key) = item.dependency_key() else {
            return SetupDecision::Run;
        };
        let Some(first_failure) = self.guard.should_skip(&key) else {
            return SetupDecision::Run;
        };

        let mut event = RawOutcomeEvent::new(item.id.clone(), Phase::Setup, Outcome::Skipped)
            .with_failure(FailureRepr::text(gated_reason(first_failure)))
            .with_dependency(key);
        event.summary = item.summary.clone();
        SetupDecision::Skip { event }
    }

    /// Classifies and reports one phase of `item`, returning the category it was assigned.
    ///
    /// Call-phase failures are recorded against the item's chain before the line is printed.
    pub fn report(
        &mut self,
        item: &TestItem,
        mut event: RawOutcomeEvent,
    ) -> Result<Category, WriteEventError> {
        if event.summary.is_none() {
            event.summary.clone_from(&item.summary);
        }
        if event.dependency.is_none() {
            event.dependency = item.dependency_key();
        }

        let category = classify::classify(&event);
        if let Some(key) = &event.dependency {
            let failed = event.phase.is_call() && event.outcome == Outcome::Failed;
            self.guard.record_if_failed(&item.name, key, failed);
        }
        self.reporter.on_test_report(&event, category)?;
        Ok(category)
    }

    /// Reports an internal error of the runner, returning the exit code to use.
    pub fn internal_error(&mut self, text: &str) -> Result<i32, WriteEventError> {
        self.reporter.on_internal_error(text)
    }

    /// Finishes the session.
    pub fn finish(
        &mut self,
        exit_status: SessionExitStatus,
    ) -> Result<SessionSummary, WriteEventError> {
        self.reporter.on_session_finish(exit_status)
    }

    /// Returns the reporter.
    pub fn reporter(&self) -> &SessionReporter<'a> {
        &self.reporter
    }

    /// Returns the reporter mutably, for use with
    /// [`TerminalWriter`](crate::reporter::TerminalWriter).
    pub fn reporter_mut(&mut self) -> &mut SessionReporter<'a> {
        &mut self.reporter
    }

    /// Returns the incremental guard.
    pub fn guard(&self) -> &IncrementalGuard {
        &self.guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incremental::ParamCoordinate;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn step(id: &str, name: &str) -> TestItem {
        TestItem {
            class_identity: Some("tests.test_prereq.TestPrereq".to_owned()),
            incremental: true,
            ..TestItem::new(id, name)
        }
    }

    fn assert_send<T: Send>() {}

    #[test]
    fn test_session_is_send() {
        assert_send::<TestSession<'static>>();
    }

    #[test_case("Is mkdir installed", Some("Is mkdir installed") ; "single line")]
    #[test_case(
        "\n\n    Create a directory.\n\n    More detail here.\n    ",
        Some("Create a directory.")
        ; "indented docstring"
    )]
    #[test_case("  Trailing space  \r\nsecond", Some("Trailing space") ; "crlf")]
    #[test_case("", None ; "empty")]
    #[test_case(" \n\t\n ", None ; "whitespace only")]
    fn test_summary_from_description(description: &str, expected: Option<&str>) {
        assert_eq!(summary_from_description(description).as_deref(), expected);
        let item = TestItem::new("t", "t").with_description(description);
        assert_eq!(item.summary.as_deref(), expected);
    }

    #[test_case(TestItem::new("t", "t"), None ; "not incremental")]
    #[test_case(
        TestItem { incremental: true, ..TestItem::new("t", "t") },
        None
        ; "incremental without class"
    )]
    #[test_case(
        TestItem { class_identity: Some("C".to_owned()), ..TestItem::new("t", "t") },
        None
        ; "class without incremental"
    )]
    #[test_case(
        TestItem {
            class_identity: Some("C".to_owned()),
            param_indices: Some(vec![1, 0]),
            incremental: true,
            ..TestItem::new("t", "t")
        },
        Some(DependencyKey::new("C", ParamCoordinate::from(&[1, 0][..])))
        ; "parametrized step"
    )]
    fn test_dependency_key(item: TestItem, expected: Option<DependencyKey>) {
        assert_eq!(item.dependency_key(), expected);
    }

    #[test]
    fn test_failed_step_gates_the_rest_of_the_chain() {
        let mut out = Vec::new();
        let mut session = TestSession::new(
            &StepgateConfig::default(),
            ReporterBuilder::default(),
            ReporterOutput::Buffer(&mut out),
        );

        let a = step("t::TestPrereq::test_a", "test_a");
        assert_eq!(session.before_setup(&a), SetupDecision::Run);
        let category = session
            .report(
                &a,
                RawOutcomeEvent::new(a.id.clone(), Phase::Call, Outcome::Failed)
                    .with_failure(FailureRepr::text("AssertionError: mkdir missing")),
            )
            .unwrap();
        assert_eq!(category, Category::Fail);
        assert_eq!(session.guard().ledger().len(), 1);

        let b = TestItem {
            summary: Some("Is mkdir executable".to_owned()),
            ..step("t::TestPrereq::test_b", "test_b")
        };
        let SetupDecision::Skip { event } = session.before_setup(&b) else {
            panic!("test_b should be gated");
        };
        assert_eq!(event.phase, Phase::Setup);
        assert_eq!(event.failure.as_text(), Some("previous test failed (test_a)"));
        assert_eq!(session.report(&b, event).unwrap(), Category::Xfail);

        session.finish(SessionExitStatus::TestsFailed).unwrap();
        drop(session);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "[FAIL] t::TestPrereq::test_a, mkdir missing\n\
             [XFAIL] Is mkdir executable\n\
             \n\
             /** TEST FAILED: 1 (failures=1, expected failures=1), total 1 **/\n"
        );
    }

    #[test]
    fn test_session_start_forgets_earlier_failures() {
        let mut out = Vec::new();
        let mut session = TestSession::new(
            &StepgateConfig::default(),
            ReporterBuilder::default(),
            ReporterOutput::Buffer(&mut out),
        );
        let a = step("t::TestPrereq::test_a", "test_a");
        session
            .report(
                &a,
                RawOutcomeEvent::new(a.id.clone(), Phase::Call, Outcome::Failed),
            )
            .unwrap();
        let b = step("t::TestPrereq::test_b", "test_b");
        assert!(matches!(session.before_setup(&b), SetupDecision::Skip { .. }));

        session.on_session_start();
        assert!(session.guard().ledger().is_empty());
        assert_eq!(session.reporter().tally().recorded_total(), 0);
        assert_eq!(session.before_setup(&b), SetupDecision::Run);
    }

    #[test]
    fn test_setup_errors_do_not_gate() {
        let mut out = Vec::new();
        let mut session = TestSession::new(
            &StepgateConfig::default(),
            ReporterBuilder::default(),
            ReporterOutput::Buffer(&mut out),
        );
        let a = step("t::a", "test_a");
        session
            .report(
                &a,
                RawOutcomeEvent::new(a.id.clone(), Phase::Setup, Outcome::Failed)
                    .with_failure(FailureRepr::text("OSError: no fixture")),
            )
            .unwrap();
        assert!(session.guard().ledger().is_empty());
        assert_eq!(session.before_setup(&step("t::b", "test_b")), SetupDecision::Run);
    }

    #[test]
    fn test_disabled_gating_still_runs_everything() {
        let mut config = StepgateConfig::default();
        config.incremental.enabled = false;
        let mut out = Vec::new();
        let mut session = TestSession::new(
            &config,
            ReporterBuilder::default(),
            ReporterOutput::Buffer(&mut out),
        );
        let a = step("t::a", "test_a");
        session
            .report(
                &a,
                RawOutcomeEvent::new(a.id.clone(), Phase::Call, Outcome::Failed),
            )
            .unwrap();
        assert_eq!(session.guard().ledger().len(), 1);
        assert_eq!(session.before_setup(&step("t::b", "test_b")), SetupDecision::Run);
    }

    #[test]
    fn test_report_fills_summary_from_item() {
        let mut out = Vec::new();
        let mut session = TestSession::new(
            &StepgateConfig::default(),
            ReporterBuilder::default(),
            ReporterOutput::Buffer(&mut out),
        );
        let item = TestItem {
            summary: Some("Create a directory".to_owned()),
            ..TestItem::new("t::mkdir", "test_mkdir")
        };
        session
            .report(
                &item,
                RawOutcomeEvent::new(item.id.clone(), Phase::Call, Outcome::Passed),
            )
            .unwrap();
        drop(session);
        assert_eq!(String::from_utf8(out).unwrap(), "[PASS] Create a directory\n");
    }
}
