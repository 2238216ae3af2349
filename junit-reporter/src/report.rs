// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generate a JUnit XML document from a finished [`Run`].

use crate::{
    config::ReportConfig,
    events::display_value,
    model::{FailedAssertion, Module, Run, Test},
};
use chrono::{DateTime, Utc};
use junit_xml_writer::{AttrValue, XmlWriter, XmlWriterSettings};
use std::time::Duration;

static TESTSUITES_TAG: &str = "testsuites";
static TESTSUITE_TAG: &str = "testsuite";
static TESTCASE_TAG: &str = "testcase";
static FAILURE_TAG: &str = "failure";
static ACTUAL_TAG: &str = "actual";
static EXPECTED_TAG: &str = "expected";
static SYSTEM_OUT_TAG: &str = "system-out";
static SYSTEM_ERR_TAG: &str = "system-err";

static FAILURE_TYPE: &str = "AssertionFailedError";

/// Failures are never distinguished from errors, so `errors` is always zero.
const ERRORS: u64 = 0;

/// Walks `run` once, depth-first, and returns the JUnit XML document.
pub fn generate_report(run: &Run, config: &ReportConfig) -> String {
    let mut settings = XmlWriterSettings::new();
    settings
        .set_xml_declaration(config.xml_declaration.as_str())
        .add_line_breaks_at([
            TESTSUITES_TAG,
            TESTSUITE_TAG,
            TESTCASE_TAG,
            FAILURE_TAG,
            SYSTEM_OUT_TAG,
            SYSTEM_ERR_TAG,
        ]);
    let mut writer = XmlWriter::new(settings);

    // Use the destructuring syntax to ensure that all fields are handled.
    let Run {
        modules,
        counts,
        start,
        time,
    } = run;

    writer.start(
        TESTSUITES_TAG,
        [
            ("name", AttrValue::from(report_name(run, config))),
            ("hostname", config.hostname.as_str().into()),
            ("tests", counts.total.into()),
            ("failures", counts.failed.into()),
            ("errors", ERRORS.into()),
            ("time", serialize_time(*time).into()),
            ("timestamp", serialize_timestamp(start).into()),
        ],
    );

    for (id, module) in modules.iter().enumerate() {
        serialize_module(id, module, config, &mut writer);
    }

    writer.end();
    writer.get_string()
}

/// The configured name wins; otherwise a run with exactly one module is named after it.
fn report_name<'a>(run: &'a Run, config: &'a ReportConfig) -> Option<&'a str> {
    if let Some(name) = config.report_name.as_deref() {
        return Some(name);
    }
    match run.modules.as_slice() {
        [only] if !only.name.is_empty() => Some(&only.name),
        _ => None,
    }
}

fn serialize_module(id: usize, module: &Module, config: &ReportConfig, writer: &mut XmlWriter) {
    let Module {
        name,
        tests,
        counts,
        start,
        time,
        stdout,
        stderr,
    } = module;

    writer.start(
        TESTSUITE_TAG,
        [
            ("id", AttrValue::from(id)),
            ("name", name.as_str().into()),
            ("hostname", config.hostname.as_str().into()),
            ("tests", counts.total.into()),
            ("failures", counts.failed.into()),
            ("errors", ERRORS.into()),
            ("time", serialize_time(*time).into()),
            ("timestamp", serialize_timestamp(start).into()),
        ],
    );

    for test in tests {
        serialize_test(test, writer);
    }

    serialize_output(stdout, SYSTEM_OUT_TAG, writer);
    serialize_output(stderr, SYSTEM_ERR_TAG, writer);

    writer.end();
}

fn serialize_test(test: &Test, writer: &mut XmlWriter) {
    let Test {
        name,
        failed_assertions,
        counts,
        start,
        time,
    } = test;

    writer.start(
        TESTCASE_TAG,
        [
            ("name", AttrValue::from(name.as_str())),
            ("tests", counts.total.into()),
            ("failures", counts.failed.into()),
            ("errors", ERRORS.into()),
            ("time", serialize_time(*time).into()),
            ("timestamp", serialize_timestamp(start).into()),
        ],
    );

    for assertion in failed_assertions {
        serialize_failure(assertion, writer);
    }

    writer.end();
}

fn serialize_failure(assertion: &FailedAssertion, writer: &mut XmlWriter) {
    let attrs = [
        ("type", AttrValue::from(FAILURE_TYPE)),
        ("message", assertion.message.as_deref().into()),
    ];

    // Values are only written when both of them are present.
    let (Some(actual), Some(expected)) = (&assertion.actual, &assertion.expected) else {
        writer.empty(FAILURE_TAG, attrs);
        return;
    };

    writer.start(FAILURE_TAG, attrs);
    writer.empty(ACTUAL_TAG, [("value", display_value(actual).into())]);
    writer.empty(EXPECTED_TAG, [("value", display_value(expected).into())]);
    writer.end();
}

fn serialize_output(lines: &[String], tag_name: &'static str, writer: &mut XmlWriter) {
    if lines.is_empty() {
        return;
    }
    writer.start(tag_name, []);
    writer.cdata(&format!("\n{}\n", lines.join("\n")));
    writer.end();
}

/// Serializes time as seconds, rounded to the microsecond.
fn serialize_time(time: Duration) -> String {
    let secs = time.as_micros() as f64 / 1_000_000.0;
    secs.to_string()
}

fn serialize_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Counts, ModuleRef};
    use chrono::TimeZone;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test_case(Duration::ZERO, "0" ; "zero")]
    #[test_case(Duration::from_millis(42), "0.042" ; "millis")]
    #[test_case(Duration::from_millis(1000), "1" ; "whole seconds")]
    #[test_case(Duration::from_micros(1_234_567), "1.234567" ; "micros")]
    #[test_case(Duration::from_nanos(1_234_567_890), "1.234567" ; "nanos are dropped")]
    fn time_in_seconds(time: Duration, expected: &str) {
        assert_eq!(serialize_time(time), expected);
    }

    #[test]
    fn timestamp_is_utc_without_fraction() {
        let timestamp = start() + chrono::TimeDelta::milliseconds(999);
        assert_eq!(serialize_timestamp(&timestamp), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn empty_run() {
        let run = Run::new(start());
        let xml = generate_report(&run, &ReportConfig::default());
        assert_eq!(
            xml,
            indoc! {r#"
                <?xml version="1.0" encoding="UTF-8"?>
                <testsuites hostname="localhost" tests="0" failures="0" errors="0" time="0" timestamp="2024-01-02T03:04:05Z">
                </testsuites>"#}
        );
    }

    #[test]
    fn single_passing_test() {
        let mut run = Run::new(start());
        run.counts = Counts::new(1, 1, 0);
        run.time = Duration::from_millis(5);
        let mut module = Module::new("Math", start());
        module.counts = Counts::new(1, 1, 0);
        module.time = Duration::from_millis(4);
        let mut test = Test::new("add", start());
        test.counts = Counts::new(1, 1, 0);
        test.time = Duration::from_millis(3);
        module.tests.push(test);
        run.modules.push(module);

        let xml = generate_report(&run, &ReportConfig::default());
        assert_eq!(
            xml,
            indoc! {r#"
                <?xml version="1.0" encoding="UTF-8"?>
                <testsuites name="Math" hostname="localhost" tests="1" failures="0" errors="0" time="0.005" timestamp="2024-01-02T03:04:05Z">
                <testsuite id="0" name="Math" hostname="localhost" tests="1" failures="0" errors="0" time="0.004" timestamp="2024-01-02T03:04:05Z">
                <testcase name="add" tests="1" failures="0" errors="0" time="0.003" timestamp="2024-01-02T03:04:05Z">
                </testcase>
                </testsuite>
                </testsuites>"#}
        );
    }

    #[test]
    fn report_name_selection() {
        let mut config = ReportConfig::default();
        let mut run = Run::new(start());
        assert_eq!(report_name(&run, &config), None);

        run.modules.push(Module::new("only", start()));
        assert_eq!(report_name(&run, &config), Some("only"));

        run.modules.push(Module::new("second", start()));
        assert_eq!(report_name(&run, &config), None);

        config.report_name = Some("https://ci.example.com/42".to_owned());
        assert_eq!(
            report_name(&run, &config),
            Some("https://ci.example.com/42")
        );
    }

    #[test]
    fn failures_with_and_without_values() {
        let mut test = Test::new("x", start());
        test.failed_assertions = vec![
            FailedAssertion {
                message: Some("no values".to_owned()),
                ..FailedAssertion::default()
            },
            FailedAssertion {
                message: Some("a < b".to_owned()),
                actual: Some(json!(1)),
                expected: Some(json!("two")),
                module: Some(ModuleRef::Name("M".to_owned())),
                ..FailedAssertion::default()
            },
            FailedAssertion {
                expected: Some(json!([1, 2])),
                ..FailedAssertion::default()
            },
            FailedAssertion {
                actual: Some(json!({"a": null})),
                expected: Some(json!([1, 2])),
                ..FailedAssertion::default()
            },
        ];

        let mut settings = XmlWriterSettings::new();
        settings.add_line_breaks_at([TESTCASE_TAG, FAILURE_TAG]);
        let mut writer = XmlWriter::new(settings);
        // Drop the declaration so only the testcase is compared.
        writer.reset();
        serialize_test(&test, &mut writer);

        assert_eq!(
            writer.get_string(),
            indoc! {r#"
                <testcase name="x" tests="0" failures="0" errors="0" time="0" timestamp="2024-01-02T03:04:05Z">
                <failure type="AssertionFailedError" message="no values" />
                <failure type="AssertionFailedError" message="a &lt; b">
                <actual value="1" /><expected value="two" />
                </failure>
                <failure type="AssertionFailedError" />
                <failure type="AssertionFailedError">
                <actual value="{&quot;a&quot;:null}" /><expected value="[1,2]" />
                </failure>
                </testcase>"#}
        );
    }

    #[test]
    fn module_output_is_wrapped_in_cdata() {
        let mut run = Run::new(start());
        let mut module = Module::new("M", start());
        module.stdout = vec!["\nModule: M Test: x".to_owned(), "boom".to_owned()];
        module.stderr = vec!["warning".to_owned()];
        run.modules.push(module);
        run.modules.push(Module::new("N", start()));

        let xml = generate_report(&run, &ReportConfig::default());
        assert_eq!(
            xml,
            indoc! {r#"
                <?xml version="1.0" encoding="UTF-8"?>
                <testsuites hostname="localhost" tests="0" failures="0" errors="0" time="0" timestamp="2024-01-02T03:04:05Z">
                <testsuite id="0" name="M" hostname="localhost" tests="0" failures="0" errors="0" time="0" timestamp="2024-01-02T03:04:05Z">
                <system-out>
                <![CDATA[

                Module: M Test: x
                boom
                ]]>
                </system-out>
                <system-err>
                <![CDATA[
                warning
                ]]>
                </system-err>
                </testsuite>
                <testsuite id="1" name="N" hostname="localhost" tests="0" failures="0" errors="0" time="0" timestamp="2024-01-02T03:04:05Z">
                </testsuite>
                </testsuites>"#}
        );
    }

    #[test]
    fn missing_counters_are_omitted() {
        let mut run = Run::new(start());
        run.counts = Counts {
            total: Some(2),
            ..Counts::default()
        };
        let config = ReportConfig {
            hostname: "ci & co".to_owned(),
            ..ReportConfig::default()
        };

        let xml = generate_report(&run, &config);
        assert!(
            xml.contains(
                r#"<testsuites hostname="ci &amp; co" tests="2" errors="0" time="0" timestamp"#
            ),
            "unexpected report: {xml}"
        );
    }
}
