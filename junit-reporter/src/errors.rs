// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced while loading configuration or reading events.
//!
//! Aggregation and report generation themselves never fail.

use camino::{Utf8Path, Utf8PathBuf};
use config::ConfigError;
use std::io;
use thiserror::Error;

/// An error that occurred while parsing a report config file.
#[derive(Debug, Error)]
#[error("failed to parse report config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, err: ConfigError) -> Self {
        Self {
            config_file: config_file.into(),
            err,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8Path {
        &self.config_file
    }
}

/// An error that occurred while reading a newline-delimited event stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EventReadError {
    /// The underlying reader failed.
    #[error("error reading event stream at line {line}")]
    Io {
        /// The 1-based line number.
        line: usize,

        /// The underlying error.
        #[source]
        error: io::Error,
    },

    /// A line could not be decoded as an event.
    #[error("invalid event at line {line}")]
    Decode {
        /// The 1-based line number.
        line: usize,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },
}

impl EventReadError {
    /// Returns the 1-based line number the error occurred at.
    pub fn line(&self) -> usize {
        match self {
            Self::Io { line, .. } | Self::Decode { line, .. } => *line,
        }
    }
}
