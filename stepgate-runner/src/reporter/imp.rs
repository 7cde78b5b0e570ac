// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints out and aggregates classified outcome events.
//!
//! The main structure in this module is [`SessionReporter`].

use super::{
    displayer::{Styles, write_final_summary, write_test_line},
    tally::SessionTally,
};
use crate::{
    classify::{self, Category},
    config::ReporterConfig,
    errors::WriteEventError,
    events::{RawOutcomeEvent, SessionExitStatus},
};
use chrono::Local;
use std::{
    io::{self, Write},
    time::Instant,
};
use stepgate_metadata::{SessionSummary, StepgateExitCode};
use tracing::warn;

/// Output destination for the reporter.
///
/// This is usually standard output, but can be an in-memory buffer for tests.
pub enum ReporterOutput<'a> {
    /// Write lines to standard output, flushing after each one.
    Stdout,

    /// Write output to a buffer.
    Buffer(&'a mut Vec<u8>),
}

/// Session reporter builder.
#[derive(Debug, Default)]
pub struct ReporterBuilder {
    should_colorize: bool,
    config: Option<ReporterConfig>,
    worker: Option<String>,
}

impl ReporterBuilder {
    /// Set to true if the reporter should colorize output.
    pub fn set_colorize(&mut self, should_colorize: bool) -> &mut Self {
        self.should_colorize = should_colorize;
        self
    }

    /// Sets the reporter configuration.
    pub fn set_config(&mut self, config: ReporterConfig) -> &mut Self {
        self.config = Some(config);
        self
    }

    /// Marks this session as one worker of a distributed run.
    pub fn set_worker(&mut self, worker: impl Into<String>) -> &mut Self {
        self.worker = Some(worker.into());
        self
    }

    /// Creates a new session reporter, starting the session.
    pub fn build<'a>(&self, output: ReporterOutput<'a>) -> SessionReporter<'a> {
        let mut styles: Box<Styles> = Box::default();
        if self.should_colorize {
            styles.colorize();
        }

        let config = self
            .config
            .clone()
            .unwrap_or_else(|| crate::config::StepgateConfig::default().reporter);

        let mut reporter = SessionReporter {
            config,
            styles,
            output: OutputSink::new(output),
            worker: self.worker.clone(),
            tally: SessionTally::new(Local::now().fixed_offset()),
            start_instant: Instant::now(),
        };
        reporter.on_session_start();
        reporter
    }
}

/// Renders classified events and accumulates the session tally.
pub struct SessionReporter<'a> {
    config: ReporterConfig,
    styles: Box<Styles>,
    pub(super) output: OutputSink<'a>,
    worker: Option<String>,
    tally: SessionTally,
    start_instant: Instant,
}

impl<'a> SessionReporter<'a> {
    /// Starts a new session, discarding anything recorded so far.
    pub fn on_session_start(&mut self) {
        self.tally = SessionTally::new(Local::now().fixed_offset());
        self.start_instant = Instant::now();

        if let Some(worker) = &self.worker {
            warn!(
                worker = %worker,
                "running as one worker of a distributed run: incremental gating and the final \
                 summary only cover tests run by this worker"
            );
        }
    }

    /// Records a terminal event and prints its line.
    ///
    /// `category` is normally the result of [`classify::classify`] on `event`. Events that aren't
    /// terminal (passing setup and teardown phases) are ignored.
    pub fn on_test_report(
        &mut self,
        event: &RawOutcomeEvent,
        category: Category,
    ) -> Result<(), WriteEventError> {
        if !event.is_terminal() {
            return Ok(());
        }
        self.tally.record(event, category);

        if !self.config.status_level.displays(category) {
            return Ok(());
        }

        let detail = if self.config.show_detail {
            classify::detail(event, category)
        } else {
            None
        };
        write_test_line(
            category,
            event.display_name(),
            detail,
            &self.styles,
            &mut self.output,
        )?;
        self.output.flush()?;
        Ok(())
    }

    /// Finishes the session, printing the summary line if anything ran.
    ///
    /// The summary is only printed if the session completed normally and at least one call-phase
    /// event was observed. Calling this again without new events prints the same summary.
    pub fn on_session_finish(
        &mut self,
        exit_status: SessionExitStatus,
    ) -> Result<SessionSummary, WriteEventError> {
        if exit_status.is_completed()
            && self.config.final_summary
            && self.tally.call_phase_total() > 0
        {
            writeln!(self.output)?;
            write_final_summary(&self.tally, &self.styles, &mut self.output)?;
            self.output.flush()?;
        }

        Ok(self.summary())
    }

    /// Prints an internal error reported by the runner, one prefixed line per line of `text`.
    ///
    /// Returns the exit code signalling an internal (not test) failure.
    pub fn on_internal_error(&mut self, text: &str) -> Result<i32, WriteEventError> {
        for line in text.split('\n') {
            self.ensure_line_start()?;
            writeln!(self.output, "INTERNALERROR> {line}")?;
        }
        self.output.flush()?;
        Ok(StepgateExitCode::INTERNAL_ERROR)
    }

    /// Returns the tally accumulated so far.
    pub fn tally(&self) -> &SessionTally {
        &self.tally
    }

    /// Returns the machine-readable summary of the session so far.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            started_at: self.tally.started_at(),
            elapsed_ms: u64::try_from(self.start_instant.elapsed().as_millis()).unwrap_or(u64::MAX),
            worker: self.worker.clone(),
            total: self.tally.call_phase_total(),
            counts: self.tally.to_counts(),
        }
    }

    pub(super) fn ensure_line_start(&mut self) -> io::Result<()> {
        if !self.output.at_line_start {
            writeln!(self.output)?;
        }
        Ok(())
    }
}

/// The underlying writer, tracking whether the cursor is at the start of a line.
pub(super) struct OutputSink<'a> {
    kind: OutputSinkKind<'a>,
    pub(super) at_line_start: bool,
}

enum OutputSinkKind<'a> {
    Stdout(io::Stdout),
    Buffer(&'a mut Vec<u8>),
}

impl<'a> OutputSink<'a> {
    fn new(output: ReporterOutput<'a>) -> Self {
        let kind = match output {
            ReporterOutput::Stdout => OutputSinkKind::Stdout(io::stdout()),
            ReporterOutput::Buffer(buf) => OutputSinkKind::Buffer(buf),
        };
        Self {
            kind,
            at_line_start: true,
        }
    }
}

impl Write for OutputSink<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = match &mut self.kind {
            OutputSinkKind::Stdout(stdout) => stdout.write(buf)?,
            OutputSinkKind::Buffer(out) => out.write(buf)?,
        };
        if let Some(last) = buf[..written].last() {
            self.at_line_start = *last == b'\n';
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.kind {
            OutputSinkKind::Stdout(stdout) => stdout.flush(),
            OutputSinkKind::Buffer(_) => Ok(()),
        }
    }
}
