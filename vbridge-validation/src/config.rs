//! Configuration management for the validation driver.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use vbridge_common::LogFormat;
use vbridge_glue::{ConnectParams, Style};

use crate::cli::Args;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Scenario-driver configuration
    pub driver: DriverConfig,
    /// Web-service connection configuration
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config =
            serde_yaml::from_str(&content).with_context(|| "Failed to parse config file")?;

        Ok(config)
    }

    /// Apply CLI argument overrides to the configuration.
    pub fn with_cli_overrides(mut self, args: &Args) -> Result<Self> {
        self.logging.level = args.log_level.clone();
        self.logging.format = args.log_format.parse()?;

        if let Some(style) = args.style {
            self.driver.style = Some(style);
        }
        if !args.fixtures.is_empty() {
            self.driver.fixtures = args.fixtures.clone();
        }
        if let Some(ref dir) = args.fixture_dir {
            self.driver.fixture_dir = Some(dir.clone());
        }
        if let Some(ref dir) = args.scratch_dir {
            self.driver.scratch_dir = Some(dir.clone());
        }
        if args.dev {
            self.driver.dev = true;
        }

        if let Some(ref url) = args.web_url {
            self.web.url = url.clone();
        }
        if let Some(ref user) = args.web_user {
            self.web.user = user.clone();
        }
        if let Some(ref password) = args.web_password {
            self.web.password = password.clone();
        }

        Ok(self)
    }

    /// Build a configuration from CLI arguments and defaults alone.
    pub fn default_with_cli(args: &Args) -> Result<Self> {
        Self::default().with_cli_overrides(args)
    }

    /// Connection parameters for the web-service style.
    pub fn connect_params(&self) -> ConnectParams {
        ConnectParams {
            url: self.web.url.clone(),
            user: self.web.user.clone(),
            password: self.web.password.clone(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Scenario-driver configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Backend access style (auto-detected if not set)
    pub style: Option<Style>,
    /// Appliance fixture files
    pub fixtures: Vec<String>,
    /// Directory scanned for appliance fixtures
    pub fixture_dir: Option<String>,
    /// Scratch directory for unpacked fixtures
    pub scratch_dir: Option<String>,
    /// Run against the mock transport
    pub dev: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            style: None,
            fixtures: Vec::new(),
            fixture_dir: None,
            scratch_dir: None,
            dev: true,
        }
    }
}

/// Web-service connection configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Endpoint URL
    pub url: String,
    /// User name
    pub user: String,
    /// Password
    pub password: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:18083".to_string(),
            user: String::new(),
            password: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_are_dev_mode_with_auto_style() {
        let config = Config::default();
        assert!(config.driver.dev);
        assert!(config.driver.style.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.web.url, "http://localhost:18083");
    }

    #[test]
    fn yaml_fields_parse_into_config() {
        let yaml = r#"
logging:
  level: debug
  format: json
driver:
  style: xpcom
  fixtures:
    - /fixtures/tiny.ova
web:
  url: http://vbox-host:18083
  user: vbox
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.driver.style, Some(Style::Xpcom));
        assert_eq!(config.driver.fixtures, vec!["/fixtures/tiny.ova"]);
        assert_eq!(config.web.url, "http://vbox-host:18083");
        // Unset fields keep their defaults.
        assert!(config.driver.dev);
        assert!(config.web.password.is_empty());
    }

    #[test]
    fn cli_arguments_override_the_file() {
        let args = Args::parse_from([
            "vbridge-validation",
            "--style",
            "webservice",
            "--web-url",
            "http://other:18083",
            "--fixture",
            "a.ova",
            "--fixture",
            "b.ova",
            "--log-level",
            "trace",
        ]);
        let config = Config::default().with_cli_overrides(&args).unwrap();
        assert_eq!(config.driver.style, Some(Style::WebService));
        assert_eq!(config.web.url, "http://other:18083");
        assert_eq!(config.driver.fixtures, vec!["a.ova", "b.ova"]);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn bad_log_format_is_rejected() {
        let args = Args::parse_from(["vbridge-validation", "--log-format", "xml"]);
        assert!(Config::default().with_cli_overrides(&args).is_err());
    }
}
