// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report configuration.

use crate::errors::ConfigParseError;
use camino::Utf8Path;
use config::{Config, File, FileFormat};
use serde::Deserialize;

static DEFAULT_HOSTNAME: &str = "localhost";
static DEFAULT_XML_DECLARATION: &str = r#"version="1.0" encoding="UTF-8""#;

/// Configuration for generated reports.
///
/// In TOML, keys are written in kebab-case:
///
/// ```toml
/// report-name = "https://ci.example.com/run/42"
/// hostname = "ci-runner"
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReportConfig {
    /// The report name. If unset and the run has exactly one module, that module's name is used
    /// instead.
    pub report_name: Option<String>,

    /// The value of the `hostname` attribute.
    pub hostname: String,

    /// The contents of the `<?xml ...?>` declaration.
    pub xml_declaration: String,
}

impl ReportConfig {
    /// Reads a config from a TOML file.
    pub fn from_file(config_file: &Utf8Path) -> Result<Self, ConfigParseError> {
        Self::build(
            File::new(config_file.as_str(), FileFormat::Toml),
            config_file,
        )
    }

    /// Reads a config from TOML source text. `origin` is used in error messages.
    pub fn from_toml_str(source: &str, origin: &Utf8Path) -> Result<Self, ConfigParseError> {
        Self::build(File::from_str(source, FileFormat::Toml), origin)
    }

    fn build<S>(source: S, origin: &Utf8Path) -> Result<Self, ConfigParseError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(source)
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|err| ConfigParseError::new(origin, err))
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report_name: None,
            hostname: DEFAULT_HOSTNAME.to_owned(),
            xml_declaration: DEFAULT_XML_DECLARATION.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(
        "",
        ReportConfig::default()
        ; "empty"
    )]
    #[test_case(
        indoc! {r#"
            report-name = "https://ci.example.com/run/42"
        "#},
        ReportConfig {
            report_name: Some("https://ci.example.com/run/42".to_owned()),
            ..ReportConfig::default()
        }
        ; "report name only"
    )]
    #[test_case(
        indoc! {r#"
            hostname = "ci-runner"
            xml-declaration = 'version="1.0"'
        "#},
        ReportConfig {
            report_name: None,
            hostname: "ci-runner".to_owned(),
            xml_declaration: r#"version="1.0""#.to_owned(),
        }
        ; "hostname and declaration"
    )]
    fn valid_configs(input: &str, expected: ReportConfig) {
        let config = ReportConfig::from_toml_str(input, Utf8Path::new("report.toml"))
            .expect("config is valid");
        assert_eq!(config, expected);
    }

    #[test]
    fn invalid_config_names_the_file() {
        let error = ReportConfig::from_toml_str("hostname = [1, 2]", Utf8Path::new("bad.toml"))
            .expect_err("hostname must be a string");
        assert_eq!(error.config_file(), "bad.toml");
        assert_eq!(
            error.to_string(),
            "failed to parse report config at `bad.toml`"
        );
    }
}
