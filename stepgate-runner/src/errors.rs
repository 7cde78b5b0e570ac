// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by stepgate.
//!
//! Classification and gating never fail; everything here comes from I/O, configuration or
//! parsing of values supplied by the runner.

use crate::{
    events::{Outcome, Phase},
    reporter::StatusLevel,
};
use camino::Utf8PathBuf;
use config::ConfigError;
use std::io;
use thiserror::Error;

/// An error that occurred while writing a reporter line to the output sink.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing to the output.
    #[error("error writing to output")]
    Io(#[from] io::Error),
}

/// An error that occurred while parsing the reporter config.
#[derive(Debug, Error)]
#[error(
    "failed to parse stepgate config{}",
    .config_file.as_ref().map(|f| format!(" at `{f}`")).unwrap_or_default()
)]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Option<Utf8PathBuf>,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: Option<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self { config_file, kind }
    }

    /// Returns the config file that failed to parse, or `None` if the failure was in the
    /// built-in defaults.
    pub fn config_file(&self) -> Option<&Utf8PathBuf> {
        self.config_file.as_ref()
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// Error returned while parsing a [`StatusLevel`] value from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized value for status-level: {input}\n(known values: {})",
    StatusLevel::variants().join(", "),
)]
pub struct StatusLevelParseError {
    input: String,
}

impl StatusLevelParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Error returned while parsing a [`Phase`] value from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized test phase: {input}\n(known values: {})",
    Phase::variants().join(", "),
)]
pub struct PhaseParseError {
    input: String,
}

impl PhaseParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// Error returned while parsing an [`Outcome`] value from a string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized test outcome: {input}\n(known values: {})",
    Outcome::variants().join(", "),
)]
pub struct OutcomeParseError {
    input: String,
}

impl OutcomeParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An error that occurred while reading a recorded event log.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EventLogParseError {
    /// The log could not be read.
    #[error("error reading event log")]
    Read(#[source] io::Error),

    /// A line of the log wasn't a valid record.
    #[error("invalid record on line {line_number} of event log")]
    Parse {
        /// The 1-based line number of the invalid record.
        line_number: usize,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}
