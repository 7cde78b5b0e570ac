// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    classify::Category,
    events::{RawOutcomeEvent, TestId},
};
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use stepgate_metadata::CategoryCounts;

/// Per-category buckets and counters for one session.
#[derive(Clone, Debug)]
pub struct SessionTally {
    started_at: DateTime<FixedOffset>,
    call_phase_total: usize,
    buckets: BTreeMap<Category, Vec<TestId>>,
}

impl SessionTally {
    /// The summary names of categories shown in the breakdown, in display order.
    const BREAKDOWN: [(Category, &'static str); 5] = [
        (Category::Error, "errors"),
        (Category::Fail, "failures"),
        (Category::Skip, "skipped"),
        (Category::Xfail, "expected failures"),
        (Category::Upass, "unexpected successes"),
    ];

    pub(crate) fn new(started_at: DateTime<FixedOffset>) -> Self {
        Self {
            started_at,
            call_phase_total: 0,
            buckets: BTreeMap::new(),
        }
    }

    pub(crate) fn record(&mut self, event: &RawOutcomeEvent, category: Category) {
        if event.phase.is_call() {
            self.call_phase_total += 1;
        }
        self.buckets
            .entry(category)
            .or_default()
            .push(event.test_id.clone());
    }

    /// Returns the time at which the session started.
    pub fn started_at(&self) -> DateTime<FixedOffset> {
        self.started_at
    }

    /// Returns the number of call-phase events seen.
    pub fn call_phase_total(&self) -> usize {
        self.call_phase_total
    }

    /// Returns the number of events recorded under `category`, across all phases.
    pub fn count(&self, category: Category) -> usize {
        self.buckets.get(&category).map_or(0, Vec::len)
    }

    /// Returns the tests recorded under `category`, in the order they were reported.
    pub fn tests_in(&self, category: Category) -> &[TestId] {
        self.buckets
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The number of failures, errors and unexpected successes.
    pub fn problem_count(&self) -> usize {
        Category::ALL
            .into_iter()
            .filter(|category| category.is_problem())
            .map(|category| self.count(category))
            .sum()
    }

    /// Returns the total number of events recorded, across all categories and phases.
    pub fn recorded_total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Returns the non-zero breakdown entries as `(name, count)`, in display order.
    pub fn breakdown(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        Self::BREAKDOWN
            .into_iter()
            .map(|(category, name)| (name, self.count(category)))
            .filter(|(_, count)| *count > 0)
    }

    /// Returns the counts in their machine-readable form.
    pub fn to_counts(&self) -> CategoryCounts {
        CategoryCounts {
            passed: self.count(Category::Pass),
            failures: self.count(Category::Fail),
            errors: self.count(Category::Error),
            skipped: self.count(Category::Skip),
            expected_failures: self.count(Category::Xfail),
            unexpected_successes: self.count(Category::Upass),
        }
    }
}
