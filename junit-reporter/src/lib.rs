// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Turns a stream of test lifecycle events into a JUnit XML report.
//!
//! The flow is: [`LifecycleEvent`](events::LifecycleEvent)s are fed one at a time to an
//! [`Aggregator`](aggregator::Aggregator), which maintains a [`Run`](model::Run) tree. When the
//! run finishes, [`generate_report`](report::generate_report) walks the tree once and the
//! resulting XML is handed to a [`ReportHook`](aggregator::ReportHook).
//!
//! No I/O happens here apart from what a hook chooses to do.

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod errors;
pub mod events;
pub mod model;
pub mod report;
