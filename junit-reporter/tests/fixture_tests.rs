// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{TimeZone, Utc};
use goldenfile::Mint;
use junit_reporter::{
    aggregator::{Aggregator, GeneratedReport},
    clock::ManualClock,
    config::ReportConfig,
    events::{AssertionLogged, Counts, ModuleRef, RunSummary},
};
use serde_json::json;
use std::{io::Write, time::Duration};

#[test]
fn fixtures() {
    let mut mint = Mint::new("tests/fixtures");

    let mut f = mint
        .new_goldenfile("basic_report.xml")
        .expect("creating new goldenfile succeeds");

    let report = basic_report();
    f.write_all(report.xml.as_bytes())
        .expect("writing basic_report succeeds");
}

fn basic_report() -> GeneratedReport {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap());
    let config = ReportConfig {
        report_name: Some("file:///work/tests/index.html".to_owned()),
        ..ReportConfig::default()
    };
    let mut agg = Aggregator::with_parts(config, Vec::new(), clock.clone());

    agg.on_run_start();
    agg.on_module_start("Math");

    agg.on_test_start("add", None);
    agg.on_assertion_logged(AssertionLogged {
        result: true,
        ..AssertionLogged::default()
    });
    clock.advance(Duration::from_millis(12));
    agg.on_test_end(Counts::new(1, 1, 0));

    agg.on_test_start("divide", None);
    agg.on_assertion_logged(AssertionLogged {
        result: false,
        message: Some("division by zero".to_owned()),
        source: Some("at divide (math.js:12:5)".to_owned()),
        actual: Some(json!("Infinity")),
        expected: Some(json!(0)),
        module: None,
    });
    agg.on_assertion_logged(AssertionLogged {
        result: false,
        message: Some("result is <NaN> & 'odd'".to_owned()),
        ..AssertionLogged::default()
    });
    clock.advance(Duration::from_millis(1500));
    agg.on_test_end(Counts::new(3, 1, 2));
    agg.on_module_end(Counts::new(4, 2, 2));

    clock.advance(Duration::from_millis(1000));
    agg.on_module_start("Strings");
    agg.on_test_start(
        "concat",
        Some(&ModuleRef::Path {
            path: "tests/strings.js".to_owned(),
        }),
    );
    clock.advance(Duration::from_millis(7));
    agg.on_test_end(Counts::new(2, 2, 0));
    agg.on_module_end(Counts::new(2, 2, 0));

    agg.on_run_end(RunSummary {
        total: Some(6),
        passed: Some(4),
        failed: Some(2),
        runtime: Some(2519.4),
    });

    let mut reports = std::mem::take(agg.hook_mut());
    assert_eq!(reports.len(), 1, "exactly one report per run");
    reports.remove(0)
}
