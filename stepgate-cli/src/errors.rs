// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use stepgate_metadata::StepgateExitCode;
use stepgate_runner::errors::{ConfigParseError, EventLogParseError, WriteEventError};
use thiserror::Error;
use tracing::error;

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// The #[error()] strings are placeholders: errors are meant to be printed with
// display_to_stderr, which colorizes them and prints the whole source chain.

/// An error that stepgate knows how to report.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to open event log")]
    EventLogOpenError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to parse event log")]
    EventLogParseError {
        path: Utf8PathBuf,
        #[source]
        err: EventLogParseError,
    },
    #[error("failed to write reporter output")]
    WriteEventError {
        #[from]
        err: WriteEventError,
    },
    #[error("failed to serialize session summary")]
    SummarySerializeError {
        #[source]
        err: serde_json::Error,
    },
    #[error("failed to write session summary")]
    SummaryWriteError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } | Self::EventLogOpenError { .. } => {
                StepgateExitCode::SETUP_ERROR
            }
            Self::EventLogParseError { .. } => StepgateExitCode::EVENT_LOG_PARSE_FAILED,
            Self::WriteEventError { .. }
            | Self::SummarySerializeError { .. }
            | Self::SummaryWriteError { .. } => StepgateExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigParseError { err } => {
                match err.config_file() {
                    Some(path) => error!(
                        "failed to parse config file `{}`",
                        path.style(styles.bold)
                    ),
                    None => error!("failed to parse default config"),
                }
                Some(err.kind() as &dyn Error)
            }
            Self::EventLogOpenError { path, err } => {
                error!(
                    "failed to open event log `{}`",
                    path.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::EventLogParseError { path, err } => {
                error!(
                    "failed to parse event log `{}`",
                    path.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
            Self::WriteEventError { err } => {
                error!("failed to write reporter output");
                err.source()
            }
            Self::SummarySerializeError { err } => {
                error!("failed to serialize session summary");
                Some(err as &dyn Error)
            }
            Self::SummaryWriteError { path, err } => {
                error!(
                    "failed to write session summary to `{}`",
                    path.style(styles.bold)
                );
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
