// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    errors::Result,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
};
use stepgate_metadata::SessionSummary;
use stepgate_runner::{
    config::StepgateConfig,
    replay::{LogRecord, parse_event_log, replay},
    reporter::ReporterBuilder,
    session::TestSession,
};
use tracing::debug;

/// Reporting and incremental gating for step-by-step test suites.
#[derive(Debug, Parser)]
#[command(version, name = "stepgate")]
pub struct StepgateApp {
    #[clap(flatten)]
    output: OutputOpts,

    #[clap(subcommand)]
    command: Command,
}

impl StepgateApp {
    /// Initializes the output context, including logging.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        match self.command {
            Command::Replay(opts) => opts.exec(output, output_writer),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Replay a recorded session through the reporter
    ///
    /// The session is read as JSON lines, one record per line. Per-test lines and the final
    /// summary are printed to stdout, and the exit code is the one the live session would have
    /// produced.
    Replay(ReplayOpts),
}

#[derive(Debug, Args)]
struct ReplayOpts {
    /// Path to the event log, or `-` to read from standard input
    #[arg(value_name = "PATH")]
    log: Utf8PathBuf,

    /// Config file to layer on top of the defaults
    #[arg(long = "config", value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,

    /// Also write the session summary as JSON to this path
    #[arg(long, value_name = "PATH")]
    summary_json: Option<Utf8PathBuf>,

    /// Mark this session as one worker of a distributed run
    #[arg(long, value_name = "ID")]
    worker: Option<String>,
}

impl ReplayOpts {
    fn exec(self, output: OutputContext, output_writer: &mut OutputWriter) -> Result<i32> {
        let config = StepgateConfig::from_sources(self.config_file.as_deref())?;
        let records = self.read_records(io::stdin().lock())?;
        debug!(records = records.len(), "read event log");

        let mut builder = ReporterBuilder::default();
        builder.set_colorize(output.color.should_colorize(supports_color::Stream::Stdout));
        if let Some(worker) = &self.worker {
            builder.set_worker(worker.clone());
        }

        let outcome = {
            let mut session = TestSession::new(&config, builder, output_writer.reporter_output());
            replay(&mut session, records)?
        };

        if let Some(path) = &self.summary_json {
            write_summary(path, &outcome.summary)?;
        }
        Ok(outcome.exit_code())
    }

    /// Reads the event log, from `stdin` if the path is `-`.
    fn read_records(&self, stdin: impl BufRead) -> Result<Vec<LogRecord>> {
        let parsed = if self.log.as_str() == "-" {
            parse_event_log(stdin)
        } else {
            let file = File::open(&self.log).map_err(|err| ExpectedError::EventLogOpenError {
                path: self.log.clone(),
                err,
            })?;
            parse_event_log(BufReader::new(file))
        };
        parsed.map_err(|err| ExpectedError::EventLogParseError {
            path: self.log.clone(),
            err,
        })
    }
}

fn write_summary(path: &Utf8Path, summary: &SessionSummary) -> Result<()> {
    let mut json = serde_json::to_string_pretty(summary)
        .map_err(|err| ExpectedError::SummarySerializeError { err })?;
    json.push('\n');
    std::fs::write(path, json).map_err(|err| ExpectedError::SummaryWriteError {
        path: path.to_owned(),
        err,
    })
}
