// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line driver that turns a newline-delimited stream of test lifecycle events into
//! JUnit XML.
//!
//! Each line of input is one JSON event, for example:
//!
//! ```text
//! {"event": "run-start"}
//! {"event": "suite-start", "name": "Math"}
//! {"event": "case-start", "name": "add"}
//! {"event": "assertion-logged", "result": true}
//! {"event": "case-end", "total": 1, "passed": 1, "failed": 0}
//! {"event": "suite-end", "total": 1, "passed": 1, "failed": 0}
//! {"event": "run-end", "total": 1, "passed": 1, "failed": 0, "runtime": 12}
//! ```

mod output;

use atomicwrites::{AtomicFile, OverwriteBehavior};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, bail};
use junit_reporter::{
    aggregator::{Aggregator, GeneratedReport},
    config::ReportConfig,
    events::{EventReader, LifecycleEvent},
};
use output::OutputOpts;
use std::{
    fs,
    io::{self, BufRead, BufReader, Write},
};
use tracing::{debug, info};

/// Convert test lifecycle events into a JUnit XML report.
#[derive(Debug, Parser)]
#[command(
    version,
    bin_name = "junit-events",
    styles = output::clap_styles::style(),
    max_term_width = 100
)]
pub struct JunitEventsApp {
    /// Newline-delimited JSON events to read [default: standard input]
    #[arg(long, short, value_name = "PATH")]
    input: Option<Utf8PathBuf>,

    /// Where to write the report [default: standard output]
    #[arg(long, short, value_name = "PATH")]
    output: Option<Utf8PathBuf>,

    /// Report config file (TOML)
    #[arg(long, value_name = "PATH", env = "JUNIT_EVENTS_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Name of the report, overriding the config file
    #[arg(long, value_name = "NAME")]
    report_name: Option<String>,

    /// Hostname recorded in the report, overriding the config file
    #[arg(long, value_name = "HOST")]
    hostname: Option<String>,

    #[clap(flatten)]
    output_opts: OutputOpts,
}

impl JunitEventsApp {
    /// Initializes logging and color output. Call this before [`Self::exec`].
    pub fn init_output(&self) {
        self.output_opts.init();
    }

    /// Reads the event stream and writes every report it produces.
    ///
    /// Reports go to the `--output` file when one is given, otherwise to `stdout`.
    pub fn exec(self, stdout: &mut dyn Write) -> Result<()> {
        let config = self.load_config()?;
        let input = self.open_input()?;

        let mut aggregator = Aggregator::new(config).with_hook(Vec::<GeneratedReport>::new());
        let mut run_open = false;
        let mut written = 0;

        for event in EventReader::new(input) {
            let event = event.wrap_err("failed to read event stream")?;
            match &event {
                LifecycleEvent::RunEnd(_) => run_open = false,
                _ => run_open = true,
            }
            aggregator.handle(event);

            for report in aggregator.hook_mut().drain(..) {
                self.write_report(&report, stdout)?;
                written += 1;
            }
        }

        if run_open {
            let run = aggregator.run();
            let failed_assertions: usize = run
                .modules
                .iter()
                .flat_map(|module| &module.tests)
                .map(|test| test.failed_assertions.len())
                .sum();
            bail!(
                "event stream ended before run-end ({} modules and {} failed assertions \
                 were not reported)",
                run.modules.len(),
                failed_assertions,
            );
        }
        if written == 0 {
            bail!("event stream contained no run-end event, so no report was produced");
        }

        Ok(())
    }

    fn load_config(&self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => {
                debug!("loading report config from {path}");
                ReportConfig::from_file(path)?
            }
            None => ReportConfig::default(),
        };
        if let Some(report_name) = &self.report_name {
            config.report_name = Some(report_name.clone());
        }
        if let Some(hostname) = &self.hostname {
            config.hostname = hostname.clone();
        }
        Ok(config)
    }

    fn open_input(&self) -> Result<Box<dyn BufRead>> {
        match &self.input {
            Some(path) => {
                let file = fs::File::open(path)
                    .wrap_err_with(|| format!("failed to open event stream `{path}`"))?;
                Ok(Box::new(BufReader::new(file)))
            }
            None => Ok(Box::new(BufReader::new(io::stdin()))),
        }
    }

    fn write_report(&self, report: &GeneratedReport, stdout: &mut dyn Write) -> Result<()> {
        let results = &report.results;
        info!(
            "run finished: {} total, {} passed, {} failed",
            DisplayCount(results.total),
            DisplayCount(results.passed),
            DisplayCount(results.failed),
        );

        match &self.output {
            Some(path) => write_report_file(path, &report.xml),
            None => writeln!(stdout, "{}", report.xml).wrap_err("failed to write report"),
        }
    }
}

fn write_report_file(path: &Utf8Path, xml: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create directory `{parent}`"))?;
    }
    let file = AtomicFile::new(path, OverwriteBehavior::AllowOverwrite);
    file.write(|f| f.write_all(xml.as_bytes()))
        .map_err(|err| match err {
            atomicwrites::Error::Internal(err) | atomicwrites::Error::User(err) => err,
        })
        .wrap_err_with(|| format!("failed to write report to `{path}`"))?;
    debug!("wrote report to {path}");
    Ok(())
}

struct DisplayCount(Option<u64>);

impl std::fmt::Display for DisplayCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(count) => write!(f, "{count}"),
            None => write!(f, "?"),
        }
    }
}
