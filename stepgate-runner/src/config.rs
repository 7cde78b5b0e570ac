// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporter configuration.
//!
//! The configuration is layered: the defaults in `default-config.toml` are shipped with stepgate,
//! and an optional user config file is applied on top of them.

use crate::{
    errors::{ConfigParseError, ConfigParseErrorKind},
    reporter::StatusLevel,
};
use camino::Utf8Path;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Overall configuration for a stepgate session.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StepgateConfig {
    /// Reporter settings.
    pub reporter: ReporterConfig,

    /// Incremental gating settings.
    pub incremental: IncrementalConfig,
}

/// Settings for the line-oriented reporter.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReporterConfig {
    /// Which per-test lines to print.
    pub status_level: StatusLevel,

    /// Whether to print the final summary line.
    pub final_summary: bool,

    /// Whether to append assertion or crash messages to per-test lines.
    pub show_detail: bool,
}

/// Settings for incremental gating.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IncrementalConfig {
    /// Whether tests following a failed step are converted to expected failures.
    pub enabled: bool,
}

impl Default for StepgateConfig {
    fn default() -> Self {
        Self {
            reporter: ReporterConfig {
                status_level: StatusLevel::All,
                final_summary: true,
                show_detail: true,
            },
            incremental: IncrementalConfig { enabled: true },
        }
    }
}

impl StepgateConfig {
    /// The default configuration, shipped with stepgate.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the configuration: the defaults, with `config_file` layered on top if specified.
    pub fn from_sources(config_file: Option<&Utf8Path>) -> Result<Self, ConfigParseError> {
        let mut builder = Self::make_default_config();
        if let Some(config_file) = config_file {
            builder = builder.add_source(File::new(config_file.as_str(), FileFormat::Toml));
        }

        let (config, ignored) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file.map(Utf8Path::to_owned), kind))?;

        if !ignored.is_empty() {
            warn!(
                "ignoring unknown configuration keys{}: {}",
                config_file
                    .map(|f| format!(" in `{f}`"))
                    .unwrap_or_default(),
                ignored.iter().join(", "),
            );
        }

        Ok(config)
    }

    /// Parses a configuration from a TOML string, layered on top of the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigParseError> {
        let builder =
            Self::make_default_config().add_source(File::from_str(contents, FileFormat::Toml));
        let (config, _) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(None, kind))?;
        Ok(config)
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(Self, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: Self = serde_path_to_error::deserialize(ignored_de).map_err(|error| {
            // The config crate reports the key as well; drop it so the path is only shown once.
            let path = error.path().clone();
            let error = match error.into_inner() {
                ConfigError::At { error, .. } => *error,
                other => other,
            };
            ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                path, error,
            )))
        })?;

        Ok((config, ignored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;

    #[test]
    fn test_default_config_matches_default() {
        let config = StepgateConfig::from_sources(None).expect("default config is valid");
        assert_eq!(config, StepgateConfig::default());
    }

    #[test]
    fn test_user_config_overrides_defaults() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("stepgate.toml");
        std::fs::write(
            &path,
            indoc! {r#"
                [reporter]
                status-level = "fail"
                show-detail = false
            "#},
        )
        .unwrap();

        let config = StepgateConfig::from_sources(Some(path.as_path())).unwrap();
        assert_eq!(config.reporter.status_level, StatusLevel::Fail);
        assert!(!config.reporter.show_detail);
        // Untouched keys keep their defaults.
        assert!(config.reporter.final_summary);
        assert!(config.incremental.enabled);
    }

    #[test]
    fn test_invalid_status_level() {
        let err = StepgateConfig::from_toml_str(indoc! {r#"
            [reporter]
            status-level = "sometimes"
        "#})
        .unwrap_err();
        assert!(err.config_file().is_none());
        match err.kind() {
            ConfigParseErrorKind::DeserializeError(error) => {
                assert_eq!(error.path().to_string(), "reporter.status-level");
            }
            other => panic!("expected a deserialize error, found {other:?}"),
        }
    }

    #[test]
    fn test_missing_config_file() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("does-not-exist.toml");
        let err = StepgateConfig::from_sources(Some(path.as_path())).unwrap_err();
        assert_eq!(err.config_file(), Some(&path));
        assert!(matches!(err.kind(), ConfigParseErrorKind::BuildError(_)));
    }
}
