// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering of per-test lines and the final summary.

use super::tally::SessionTally;
use crate::{classify::Category, errors::StatusLevelParseError};
use itertools::Itertools;
use owo_colors::{OwoColorize, Style};
use serde::Deserialize;
use std::{fmt, io, str::FromStr};

/// Status level to show in the reporter output.
///
/// Status levels are incremental: each level causes all the statuses listed above it to be
/// output. For example, [`Pass`](Self::Pass) implies [`Fail`](Self::Fail).
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum StatusLevel {
    /// No per-test output.
    None,

    /// Only output failures, errors and unexpected successes.
    Fail,

    /// Output passing tests in addition to all variants above.
    Pass,

    /// Output skipped tests and expected failures in addition to all variants above.
    Skip,

    /// Currently has the same meaning as [`Skip`](Self::Skip).
    All,
}

impl StatusLevel {
    /// Returns string representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["none", "fail", "pass", "skip", "all"]
    }

    /// Returns true if a line for a test in this category is displayed at this level.
    pub fn displays(self, category: Category) -> bool {
        let required = match category {
            Category::Fail | Category::Error | Category::Upass => StatusLevel::Fail,
            Category::Pass => StatusLevel::Pass,
            Category::Skip | Category::Xfail => StatusLevel::Skip,
        };
        self >= required
    }
}

impl FromStr for StatusLevel {
    type Err = StatusLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "none" => StatusLevel::None,
            "fail" => StatusLevel::Fail,
            "pass" => StatusLevel::Pass,
            "skip" => StatusLevel::Skip,
            "all" => StatusLevel::All,
            other => return Err(StatusLevelParseError::new(other)),
        };
        Ok(val)
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLevel::None => write!(f, "none"),
            StatusLevel::Fail => write!(f, "fail"),
            StatusLevel::Pass => write!(f, "pass"),
            StatusLevel::Skip => write!(f, "skip"),
            StatusLevel::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub(super) struct Styles {
    pub(super) count: Style,
    pub(super) pass: Style,
    pub(super) fail: Style,
    pub(super) skip: Style,
}

impl Styles {
    pub(super) fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
    }

    fn for_category(&self, category: Category) -> Style {
        match category {
            Category::Pass => self.pass,
            Category::Fail | Category::Error | Category::Upass => self.fail,
            Category::Skip | Category::Xfail => self.skip,
        }
    }
}

/// Writes `[<TAG>] <name>[, <detail>]` followed by a newline.
pub(super) fn write_test_line(
    category: Category,
    name: &str,
    detail: Option<&str>,
    styles: &Styles,
    writer: &mut dyn io::Write,
) -> io::Result<()> {
    write!(
        writer,
        "{} {name}",
        format!("[{}]", category.tag()).style(styles.for_category(category)),
    )?;
    if let Some(detail) = detail {
        write!(writer, ", {detail}")?;
    }
    writeln!(writer)
}

/// Writes the `/** TEST ... **/` summary line, followed by a newline.
pub(super) fn write_final_summary(
    tally: &SessionTally,
    styles: &Styles,
    writer: &mut dyn io::Write,
) -> io::Result<()> {
    let total = tally.call_phase_total();
    let breakdown = DisplayBreakdown { tally, styles };

    if tally.problem_count() > 0 {
        writeln!(
            writer,
            "/** {}: {} ({breakdown}), total {} **/",
            "TEST FAILED".style(styles.fail),
            tally.problem_count().style(styles.count),
            total.style(styles.count),
        )
    } else if tally.count(Category::Skip) > 0 || tally.count(Category::Xfail) > 0 {
        writeln!(
            writer,
            "/** {}: {} ({breakdown}) **/",
            "TEST PASSED".style(styles.pass),
            total.style(styles.count),
        )
    } else {
        writeln!(
            writer,
            "/** {}: {} **/",
            "TEST PASSED".style(styles.pass),
            total.style(styles.count),
        )
    }
}

struct DisplayBreakdown<'a> {
    tally: &'a SessionTally,
    styles: &'a Styles,
}

impl fmt::Display for DisplayBreakdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .tally
            .breakdown()
            .map(|(name, count)| format!("{name}={}", count.style(self.styles.count)));
        write!(f, "{}", parts.format(", "))
    }
}
