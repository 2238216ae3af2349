// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds a [`Run`] tree from lifecycle events.

use crate::{
    clock::{Clock, SystemClock},
    config::ReportConfig,
    events::{AssertionLogged, Counts, LifecycleEvent, ModuleRef, RunSummary, display_value},
    model::{Module, Run, Test},
    report::generate_report,
};
use tracing::{debug, warn};

static DEFAULT_MODULE_NAME: &str = "default";
static NO_TEST_LABEL: &str = "<none>";

/// A finished report, handed to a [`ReportHook`] at the end of each run.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedReport {
    /// The summary supplied by the run-end event, unchanged.
    pub results: RunSummary,

    /// The JUnit XML document.
    pub xml: String,
}

/// Receives each report generated by an [`Aggregator`].
pub trait ReportHook {
    /// Called once per completed run.
    fn report_generated(&mut self, report: GeneratedReport);
}

/// A hook that discards reports.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopHook;

impl ReportHook for NoopHook {
    fn report_generated(&mut self, _report: GeneratedReport) {}
}

impl<F> ReportHook for F
where
    F: FnMut(GeneratedReport),
{
    fn report_generated(&mut self, report: GeneratedReport) {
        self(report)
    }
}

impl ReportHook for Vec<GeneratedReport> {
    fn report_generated(&mut self, report: GeneratedReport) {
        self.push(report);
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct TestCursor {
    module: usize,
    test: usize,
}

/// Aggregates lifecycle events into a [`Run`] and generates a report when the run ends.
///
/// At most one module and one test are open at a time. Events are expected in the order the
/// source produced them, but missing or unbalanced events never cause a failure:
///
/// * a test that starts with no open module gets a module synthesized for it;
/// * end events with no matching open scope are logged and ignored;
/// * missing counters are carried through to the report as absent values.
#[derive(Debug)]
pub struct Aggregator<H = NoopHook, C = SystemClock> {
    config: ReportConfig,
    hook: H,
    clock: C,
    run: Run,
    current_module: Option<usize>,
    current_test: Option<TestCursor>,
    assertion_count: usize,
}

impl Aggregator {
    /// Creates an aggregator that uses the system clock and discards reports.
    pub fn new(config: ReportConfig) -> Self {
        Self::with_parts(config, NoopHook, SystemClock)
    }
}

impl<H: ReportHook, C: Clock> Aggregator<H, C> {
    /// Creates an aggregator from its parts.
    pub fn with_parts(config: ReportConfig, hook: H, clock: C) -> Self {
        let run = Run::new(clock.now());
        Self {
            config,
            hook,
            clock,
            run,
            current_module: None,
            current_test: None,
            assertion_count: 0,
        }
    }

    /// Replaces the report hook.
    pub fn with_hook<H2: ReportHook>(self, hook: H2) -> Aggregator<H2, C> {
        Aggregator {
            config: self.config,
            hook,
            clock: self.clock,
            run: self.run,
            current_module: self.current_module,
            current_test: self.current_test,
            assertion_count: self.assertion_count,
        }
    }

    /// Replaces the clock. The run in progress keeps its start time.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> Aggregator<H, C2> {
        Aggregator {
            config: self.config,
            hook: self.hook,
            clock,
            run: self.run,
            current_module: self.current_module,
            current_test: self.current_test,
            assertion_count: self.assertion_count,
        }
    }

    /// Returns the run in progress, or the last finished run.
    pub fn run(&self) -> &Run {
        &self.run
    }

    /// Returns the report configuration.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Returns the report hook.
    pub fn hook(&self) -> &H {
        &self.hook
    }

    /// Returns the report hook mutably.
    pub fn hook_mut(&mut self) -> &mut H {
        &mut self.hook
    }

    /// Returns the number of assertions logged since the current test started.
    pub fn assertion_count(&self) -> usize {
        self.assertion_count
    }

    /// Dispatches an event to the matching handler.
    pub fn handle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::RunStart => self.on_run_start(),
            LifecycleEvent::SuiteStart { name } => self.on_module_start(name),
            LifecycleEvent::CaseStart { name, module } => {
                self.on_test_start(name, module.as_ref())
            }
            LifecycleEvent::AssertionLogged(assertion) => self.on_assertion_logged(assertion),
            LifecycleEvent::CaseEnd(counts) => self.on_test_end(counts),
            LifecycleEvent::SuiteEnd(counts) => self.on_module_end(counts),
            LifecycleEvent::RunEnd(summary) => self.on_run_end(summary),
        }
    }

    /// Starts a fresh run, discarding any previous run state.
    pub fn on_run_start(&mut self) {
        debug!("run started");
        self.run = Run::new(self.clock.now());
        self.current_module = None;
        self.current_test = None;
        self.assertion_count = 0;
    }

    /// Starts a new module and makes it current.
    pub fn on_module_start(&mut self, name: impl Into<String>) {
        let module = Module::new(name, self.clock.now());
        debug!(module = %module.name, "module started");
        self.current_module = Some(self.push_module(module));
    }

    /// Starts a new test within the current module and makes it current.
    ///
    /// If no module is open, one is created, named after `declared_module` or `"default"`.
    pub fn on_test_start(&mut self, name: impl Into<String>, declared_module: Option<&ModuleRef>) {
        let module_idx = match self.current_module {
            Some(idx) => idx,
            None => {
                let module_name = declared_module
                    .and_then(ModuleRef::module_name)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(DEFAULT_MODULE_NAME);
                debug!(module = module_name, "test started outside a module, synthesizing one");
                let idx = self.push_module(Module::new(module_name, self.clock.now()));
                self.current_module = Some(idx);
                idx
            }
        };

        self.assertion_count = 0;

        let test = Test::new(name, self.clock.now());
        debug!(test = %test.name, "test started");
        let tests = &mut self.run.modules[module_idx].tests;
        tests.push(test);
        self.current_test = Some(TestCursor {
            module: module_idx,
            test: tests.len() - 1,
        });
    }

    /// Records an assertion.
    ///
    /// Failed assertions are stored on the current test. A diagnostic block is also appended to
    /// the current module's standard output.
    pub fn on_assertion_logged(&mut self, assertion: AssertionLogged) {
        self.assertion_count += 1;
        if assertion.result {
            return;
        }

        let test_label = self
            .current_test()
            .map(|test| test.name.clone())
            .unwrap_or_else(|| NO_TEST_LABEL.to_owned());

        if let Some(module) = self.current_module.map(|idx| &mut self.run.modules[idx]) {
            let module_label = assertion
                .module
                .as_ref()
                .and_then(ModuleRef::module_name)
                .unwrap_or(module.name.as_str());
            append_failure_diagnostics(&mut module.stdout, module_label, &test_label, &assertion);
        }

        if let Some(test) = self.current_test_mut() {
            test.failed_assertions.push(assertion.into());
        }
    }

    /// Finishes the current test with the counters supplied by the source.
    pub fn on_test_end(&mut self, counts: Counts) {
        let Some(cursor) = self.current_test.take() else {
            warn!("test finished, but no test was started: ignoring");
            return;
        };
        let test = &mut self.run.modules[cursor.module].tests[cursor.test];
        test.time = self.clock.elapsed_since(test.start);
        test.counts = counts;
        debug!(test = %test.name, time = ?test.time, "test finished");
    }

    /// Finishes the current module with the counters supplied by the source.
    pub fn on_module_end(&mut self, counts: Counts) {
        let Some(idx) = self.current_module.take() else {
            warn!("module finished, but no module was started: ignoring");
            return;
        };
        let module = &mut self.run.modules[idx];
        module.time = self.clock.elapsed_since(module.start);
        module.counts = counts;
        debug!(module = %module.name, time = ?module.time, "module finished");
    }

    /// Finishes the run, generates the report and hands it to the hook.
    pub fn on_run_end(&mut self, summary: RunSummary) {
        self.run.time = summary
            .runtime()
            .unwrap_or_else(|| self.clock.elapsed_since(self.run.start));
        self.run.counts = summary.counts();

        let xml = generate_report(&self.run, &self.config);
        debug!(
            modules = self.run.modules.len(),
            bytes = xml.len(),
            "run finished, report generated"
        );
        self.hook.report_generated(GeneratedReport {
            results: summary,
            xml,
        });
    }

    fn push_module(&mut self, module: Module) -> usize {
        self.run.modules.push(module);
        self.run.modules.len() - 1
    }

    fn current_test(&self) -> Option<&Test> {
        let cursor = self.current_test?;
        Some(&self.run.modules[cursor.module].tests[cursor.test])
    }

    fn current_test_mut(&mut self) -> Option<&mut Test> {
        let cursor = self.current_test?;
        Some(&mut self.run.modules[cursor.module].tests[cursor.test])
    }
}

fn append_failure_diagnostics(
    stdout: &mut Vec<String>,
    module_label: &str,
    test_label: &str,
    assertion: &AssertionLogged,
) {
    stdout.push(format!("\nModule: {module_label} Test: {test_label}"));
    if let Some(message) = assertion.message.as_ref().filter(|m| !m.is_empty()) {
        stdout.push(message.clone());
    }
    if let Some(source) = assertion.source.as_ref().filter(|s| !s.is_empty()) {
        stdout.push(source.clone());
    }
    if assertion.actual.is_some() || assertion.expected.is_some() {
        stdout.push("Actual value:".to_owned());
        stdout.push(assertion.actual.as_ref().map(display_value).unwrap_or_default());
        stdout.push("Expected value:".to_owned());
        stdout.push(
            assertion
                .expected
                .as_ref()
                .map(display_value)
                .unwrap_or_default(),
        );
    }
}
