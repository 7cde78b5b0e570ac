// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classify raw outcome events into one of six categories.
//!
//! Runners encode six different situations using only a three-valued outcome flag plus
//! unstructured text. [`classify`] recovers the situation by walking an ordered decision table,
//! [`RULES`], and returning the category of the first rule that matches.
//!
//! The table is append-only: inserting or reordering rules would silently reclassify events that
//! earlier versions classified differently.

use crate::events::{FailureRepr, Outcome, RawOutcomeEvent};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::LazyLock};
use tracing::debug;

/// Line prefixes that introduce an assertion-style failure.
pub const ASSERTION_INTRODUCERS: &[&str] = &["AssertionError:", "Failed:"];

/// The prefix used for an expected failure that passed under strict mode.
pub const STRICT_XPASS_PREFIX: &str = "[XPASS(";

static ASSERTION_MESSAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:AssertionError|Failed): ?(.*)$").unwrap());

/// The category assigned to a terminal outcome event.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Category {
    /// The test passed.
    Pass,

    /// An assertion-style failure inside the test body.
    Fail,

    /// A non-assertion failure: a crash, a fixture error or an unrecognized exception.
    Error,

    /// The test was skipped.
    Skip,

    /// The test failed, and was expected to.
    Xfail,

    /// The test was expected to fail, but passed.
    Upass,
}

impl Category {
    /// All categories, in tag order.
    pub const ALL: [Category; 6] = [
        Category::Pass,
        Category::Fail,
        Category::Error,
        Category::Skip,
        Category::Xfail,
        Category::Upass,
    ];

    /// Returns the bracketed tag printed for this category, without the brackets.
    pub fn tag(self) -> &'static str {
        match self {
            Category::Pass => "PASS",
            Category::Fail => "FAIL",
            Category::Error => "ERROR",
            Category::Skip => "SKIP",
            Category::Xfail => "XFAIL",
            Category::Upass => "UPASS",
        }
    }

    /// Returns true if this category makes the session fail.
    pub fn is_problem(self) -> bool {
        match self {
            Category::Fail | Category::Error | Category::Upass => true,
            Category::Pass | Category::Skip | Category::Xfail => false,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One entry in the classification decision table.
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    /// A short name for this rule, used in logs.
    pub name: &'static str,

    /// The category assigned if this rule matches.
    pub category: Category,

    matches: fn(&RawOutcomeEvent) -> bool,
}

impl Rule {
    /// Returns true if this rule applies to the event.
    pub fn matches(&self, event: &RawOutcomeEvent) -> bool {
        (self.matches)(event)
    }
}

/// The ordered classification table. The first matching rule wins.
pub static RULES: &[Rule] = &[
    // Setup and teardown failures never count as assertion failures: the test body didn't run.
    Rule {
        name: "fixture-failure",
        category: Category::Error,
        matches: |e| e.outcome == Outcome::Failed && !e.phase.is_call(),
    },
    Rule {
        name: "unexpected-success-marker",
        category: Category::Upass,
        matches: |e| e.outcome == Outcome::Failed && e.failure.is_unexpected_success_marker(),
    },
    Rule {
        name: "assertion",
        category: Category::Fail,
        matches: |e| e.outcome == Outcome::Failed && has_assertion_marker(&e.failure),
    },
    Rule {
        name: "strict-xpass",
        category: Category::Upass,
        matches: |e| {
            e.outcome == Outcome::Failed
                && e
                    .failure
                    .as_text()
                    .is_some_and(|text| text.starts_with(STRICT_XPASS_PREFIX))
        },
    },
    Rule {
        name: "unrecognized-failure",
        category: Category::Error,
        matches: |e| e.outcome == Outcome::Failed,
    },
    Rule {
        name: "structured-skip",
        category: Category::Skip,
        matches: |e| e.outcome == Outcome::Skipped && e.failure.is_skip_location(),
    },
    // A skip rendered as free text is how runners report allowed-to-fail tests.
    Rule {
        name: "free-text-skip",
        category: Category::Xfail,
        matches: |e| e.outcome == Outcome::Skipped,
    },
    Rule {
        name: "passed-unexpected-success-marker",
        category: Category::Upass,
        matches: |e| e.outcome == Outcome::Passed && e.failure.is_unexpected_success_marker(),
    },
    Rule {
        name: "passed",
        category: Category::Pass,
        matches: |e| e.outcome == Outcome::Passed,
    },
];

/// The result of classifying an event, along with the rule responsible.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Classification {
    /// The assigned category.
    pub category: Category,

    /// The name of the rule that matched.
    pub rule: &'static str,
}

/// Classifies an event into exactly one [`Category`].
///
/// This is a pure function of the event's outcome, phase and failure representation.
pub fn classify(event: &RawOutcomeEvent) -> Category {
    classify_explained(event).category
}

/// Classifies an event, also returning the rule that matched.
pub fn classify_explained(event: &RawOutcomeEvent) -> Classification {
    for rule in RULES {
        if rule.matches(event) {
            return Classification {
                category: rule.category,
                rule: rule.name,
            };
        }
    }

    // Every outcome is covered by a catch-all above, but stay total regardless.
    debug!(
        test_id = %event.test_id,
        "no classification rule matched, falling back to error"
    );
    Classification {
        category: Category::Error,
        rule: "fallback",
    }
}

/// Returns the detail appended to a rendered line for this category, if any.
///
/// Only [`Category::Fail`] (the assertion message) and [`Category::Error`] (the short crash
/// description) carry a detail.
pub fn detail(event: &RawOutcomeEvent, category: Category) -> Option<&str> {
    match category {
        Category::Fail => Some(assertion_message(&event.failure)),
        Category::Error => Some(event.failure.crash_message().unwrap_or_default()),
        Category::Pass | Category::Skip | Category::Xfail | Category::Upass => None,
    }
}

/// Extracts the assertion message from a failure representation.
///
/// Returns the text following the first assertion introducer on a line of its own. If there is
/// no such line, the message is empty.
pub fn assertion_message(failure: &FailureRepr) -> &str {
    let Some(text) = failure.as_text() else {
        return "";
    };
    match ASSERTION_MESSAGE_RE.captures(text) {
        Some(captures) => captures
            .get(1)
            .map_or("", |m| m.as_str().trim_end_matches('\r')),
        None => {
            debug!("no assertion message found in failure text, using an empty message");
            ""
        }
    }
}

fn has_assertion_marker(failure: &FailureRepr) -> bool {
    failure.as_text().is_some_and(|text| {
        text.lines().any(|line| {
            ASSERTION_INTRODUCERS
                .iter()
                .any(|introducer| line.starts_with(introducer))
        })
    })
}
