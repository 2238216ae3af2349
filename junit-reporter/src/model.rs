// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The run tree built by the [`Aggregator`](crate::aggregator::Aggregator).
//!
//! A [`Run`] holds [`Module`]s, which hold [`Test`]s, which hold the [`FailedAssertion`]s logged
//! while they ran. Passing assertions are only counted, never stored.

use crate::events::{AssertionLogged, Counts, ModuleRef};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;

/// One complete execution of a collection of test suites.
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    /// The modules in this run, in the order they started.
    pub modules: Vec<Module>,

    /// The counters reported when the run finished.
    pub counts: Counts,

    /// The time at which the run started.
    pub start: DateTime<Utc>,

    /// The time taken by the run.
    pub time: Duration,
}

impl Run {
    /// Creates an empty run with zeroed counters.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            modules: vec![],
            counts: Counts::zero(),
            start,
            time: Duration::ZERO,
        }
    }
}

/// A named group of test cases, also known as a suite.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    /// The name of this module.
    pub name: String,

    /// The tests in this module, in the order they started.
    pub tests: Vec<Test>,

    /// The counters reported when the module finished.
    pub counts: Counts,

    /// The time at which the module started.
    pub start: DateTime<Utc>,

    /// The time taken by the module.
    pub time: Duration,

    /// Lines written to the module's standard output, including failure diagnostics.
    pub stdout: Vec<String>,

    /// Lines written to the module's standard error.
    pub stderr: Vec<String>,
}

impl Module {
    /// Creates a new module with no tests.
    pub fn new(name: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            tests: vec![],
            counts: Counts::zero(),
            start,
            time: Duration::ZERO,
            stdout: vec![],
            stderr: vec![],
        }
    }
}

/// A single test case.
#[derive(Clone, Debug, PartialEq)]
pub struct Test {
    /// The name of this test.
    pub name: String,

    /// Assertions that failed, in the order they were logged.
    pub failed_assertions: Vec<FailedAssertion>,

    /// The counters reported when the test finished.
    pub counts: Counts,

    /// The time at which the test started.
    pub start: DateTime<Utc>,

    /// The time taken by the test.
    pub time: Duration,
}

impl Test {
    /// Creates a new test with no failed assertions.
    pub fn new(name: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            failed_assertions: vec![],
            counts: Counts::zero(),
            start,
            time: Duration::ZERO,
        }
    }
}

/// An assertion that did not pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FailedAssertion {
    /// The assertion message.
    pub message: Option<String>,

    /// Source location or stack trace text.
    pub source: Option<String>,

    /// The actual value.
    pub actual: Option<Value>,

    /// The expected value.
    pub expected: Option<Value>,

    /// The module the assertion declared itself part of.
    pub module: Option<ModuleRef>,
}

impl From<AssertionLogged> for FailedAssertion {
    fn from(assertion: AssertionLogged) -> Self {
        let AssertionLogged {
            result: _,
            message,
            source,
            actual,
            expected,
            module,
        } = assertion;
        Self {
            message,
            source,
            actual,
            expected,
            module,
        }
    }
}
