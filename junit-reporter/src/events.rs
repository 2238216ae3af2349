// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test lifecycle events consumed by the [`Aggregator`](crate::aggregator::Aggregator).

use crate::errors::EventReadError;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{io, time::Duration};

/// A test lifecycle event.
///
/// Events are serialized as JSON objects with an `event` tag, for example
/// `{"event": "suite-start", "name": "Math"}`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum LifecycleEvent {
    /// The run started. Comes before any suite.
    RunStart,

    /// A suite started.
    SuiteStart {
        /// The name of the suite.
        name: String,
    },

    /// A test case started.
    CaseStart {
        /// The name of the test case.
        name: String,

        /// The module the test case declares itself part of.
        #[serde(default)]
        module: Option<ModuleRef>,
    },

    /// An assertion was logged within the current test case.
    AssertionLogged(AssertionLogged),

    /// The current test case finished.
    CaseEnd(Counts),

    /// The current suite finished.
    SuiteEnd(Counts),

    /// The run finished.
    RunEnd(RunSummary),
}

/// A reference to the module a test or assertion belongs to.
///
/// This is usually a plain string or an object with a `path` field. Anything else is kept as
/// [`ModuleRef::Other`] and yields no module name.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ModuleRef {
    /// A module name or path.
    Name(String),

    /// An object describing the module's path.
    Path {
        /// The path to the module.
        path: String,
    },

    /// Any other JSON value, such as a number or an object without `path`.
    Other(Value),
}

impl ModuleRef {
    /// Returns the module name derived from this reference.
    ///
    /// This is the last component of the path, with a trailing `.js` removed. Returns `None`
    /// for [`ModuleRef::Other`].
    pub fn module_name(&self) -> Option<&str> {
        let raw = match self {
            ModuleRef::Name(name) => name,
            ModuleRef::Path { path } => path,
            ModuleRef::Other(_) => return None,
        };
        let base = Utf8Path::new(raw).file_name().unwrap_or_default();
        match base.strip_suffix(".js") {
            Some(stem) if !stem.is_empty() => Some(stem),
            _ => Some(base),
        }
    }
}

/// Payload of [`LifecycleEvent::AssertionLogged`].
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AssertionLogged {
    /// Whether the assertion passed.
    pub result: bool,

    /// The assertion message.
    #[serde(default)]
    pub message: Option<String>,

    /// Source location or stack trace text.
    #[serde(default)]
    pub source: Option<String>,

    /// The actual value. JSON `null` is treated as absent.
    #[serde(default)]
    pub actual: Option<Value>,

    /// The expected value. JSON `null` is treated as absent.
    #[serde(default)]
    pub expected: Option<Value>,

    /// The module the assertion declares itself part of.
    #[serde(default)]
    pub module: Option<ModuleRef>,
}

/// Counters supplied by the source at the end of a scope.
///
/// Any counter may be missing, in which case the missing value is carried through to the report.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct Counts {
    /// The total number of assertions or tests.
    #[serde(default)]
    pub total: Option<u64>,

    /// The number that passed.
    #[serde(default)]
    pub passed: Option<u64>,

    /// The number that failed.
    #[serde(default)]
    pub failed: Option<u64>,
}

impl Counts {
    /// Creates counts with every counter set to zero.
    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    /// Creates counts with every counter present.
    pub fn new(total: u64, passed: u64, failed: u64) -> Self {
        Self {
            total: Some(total),
            passed: Some(passed),
            failed: Some(failed),
        }
    }
}

/// Payload of [`LifecycleEvent::RunEnd`].
///
/// This is also handed back unchanged to the [`ReportHook`](crate::aggregator::ReportHook).
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RunSummary {
    /// The total number of assertions.
    #[serde(default)]
    pub total: Option<u64>,

    /// The number that passed.
    #[serde(default)]
    pub passed: Option<u64>,

    /// The number that failed.
    #[serde(default)]
    pub failed: Option<u64>,

    /// The run time reported by the source, in milliseconds.
    #[serde(default)]
    pub runtime: Option<f64>,
}

impl RunSummary {
    /// Returns the counters of this summary.
    pub fn counts(&self) -> Counts {
        Counts {
            total: self.total,
            passed: self.passed,
            failed: self.failed,
        }
    }

    /// Returns the reported run time, rounded to the microsecond.
    ///
    /// A zero, negative or missing runtime is treated as not reported.
    pub fn runtime(&self) -> Option<Duration> {
        let micros = (self.runtime? * 1000.0).round();
        (micros >= 1.0).then(|| Duration::from_micros(micros as u64))
    }
}

/// Returns the text form of an `actual` or `expected` value.
///
/// Strings are returned verbatim; everything else is rendered as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads newline-delimited JSON events from a reader.
///
/// Blank lines are skipped. Iteration continues after a decoding error, so callers can choose
/// whether to stop or skip.
#[derive(Debug)]
pub struct EventReader<R> {
    lines: io::Lines<R>,
    line: usize,
}

impl<R: io::BufRead> EventReader<R> {
    /// Creates a new reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: io::BufRead> Iterator for EventReader<R> {
    type Item = Result<LifecycleEvent, EventReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line += 1;
            let line = match line {
                Ok(line) => line,
                Err(error) => {
                    return Some(Err(EventReadError::Io {
                        line: self.line,
                        error,
                    }));
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).map_err(|error| {
                EventReadError::Decode {
                    line: self.line,
                    error,
                }
            }));
        }
    }
}
