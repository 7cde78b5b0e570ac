// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replaying recorded sessions.
//!
//! A recorded session is a sequence of JSON objects, one per line, each tagged by a `type` field:
//!
//! ```text
//! {"type":"session-start"}
//! {"type":"test-started","item":{"id":"t::a","name":"test_a","incremental":true,"class-identity":"C"}}
//! {"type":"test-report","event":{"test-id":"t::a","phase":"call","outcome":"passed"}}
//! {"type":"internal-error","text":"..."}
//! {"type":"session-finish","exit-status":"ok"}
//! ```
//!
//! Replaying drives a [`TestSession`] exactly as a live runner would. A test gated on
//! `test-started` never runs, so the recorded reports for it are dropped.

use crate::{
    errors::{EventLogParseError, WriteEventError},
    events::{RawOutcomeEvent, SessionExitStatus, TestId},
    session::{SetupDecision, TestItem, TestSession},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    io::BufRead,
};
use stepgate_metadata::{SessionSummary, StepgateExitCode};
use tracing::{debug, warn};

/// One record of an event log.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum LogRecord {
    /// The session started.
    SessionStart,

    /// A test is about to be set up.
    TestStarted {
        /// The test.
        item: TestItem,
    },

    /// One phase of a test was reported.
    TestReport {
        /// The reported event.
        event: RawOutcomeEvent,
    },

    /// The runner hit an internal error.
    InternalError {
        /// The rendered error.
        text: String,
    },

    /// The session finished.
    SessionFinish {
        /// The runner's exit status.
        exit_status: SessionExitStatus,
    },
}

/// Parses an event log, skipping blank lines.
pub fn parse_event_log(reader: impl BufRead) -> Result<Vec<LogRecord>, EventLogParseError> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(EventLogParseError::Read)?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|error| EventLogParseError::Parse {
            line_number: idx + 1,
            error,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// The result of replaying an event log.
#[derive(Clone, Debug)]
pub struct ReplayOutcome {
    /// The summary produced at session finish.
    pub summary: SessionSummary,

    /// The exit status the session finished with.
    ///
    /// [`SessionExitStatus::Other`] if the log ended without a `session-finish` record.
    pub exit_status: SessionExitStatus,

    /// The number of internal errors reported.
    pub internal_errors: usize,
}

impl ReplayOutcome {
    /// Returns the process exit code for the replayed session.
    pub fn exit_code(&self) -> i32 {
        if self.internal_errors > 0 || self.exit_status == SessionExitStatus::InternalError {
            StepgateExitCode::INTERNAL_ERROR
        } else {
            self.summary.exit_code()
        }
    }
}

/// Replays `records` through `session`.
///
/// Records after the first `session-finish` are ignored.
pub fn replay(
    session: &mut TestSession<'_>,
    records: impl IntoIterator<Item = LogRecord>,
) -> Result<ReplayOutcome, WriteEventError> {
    let mut items: HashMap<TestId, TestItem> = HashMap::new();
    let mut gated: HashSet<TestId> = HashSet::new();
    let mut internal_errors = 0;

    for record in records {
        match record {
            LogRecord::SessionStart => {
                gated.clear();
                session.on_session_start();
            }
            LogRecord::TestStarted { item } => {
                gated.remove(&item.id);
                if let SetupDecision::Skip { event } = session.before_setup(&item) {
                    gated.insert(item.id.clone());
                    session.report(&item, event)?;
                }
                items.insert(item.id.clone(), item);
            }
            LogRecord::TestReport { event } => {
                if gated.contains(&event.test_id) {
                    debug!(
                        test_id = %event.test_id,
                        phase = %event.phase,
                        "dropping recorded report for gated test"
                    );
                    continue;
                }
                let item = items.get(&event.test_id).cloned().unwrap_or_else(|| {
                    TestItem::new(event.test_id.clone(), event.test_id.as_str())
                });
                session.report(&item, event)?;
            }
            LogRecord::InternalError { text } => {
                internal_errors += 1;
                session.internal_error(&text)?;
            }
            LogRecord::SessionFinish { exit_status } => {
                let summary = session.finish(exit_status)?;
                return Ok(ReplayOutcome {
                    summary,
                    exit_status,
                    internal_errors,
                });
            }
        }
    }

    warn!("event log ended without a session-finish record, treating the session as aborted");
    let summary = session.finish(SessionExitStatus::Other)?;
    Ok(ReplayOutcome {
        summary,
        exit_status: SessionExitStatus::Other,
        internal_errors,
    })
}
