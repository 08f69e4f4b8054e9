//! # vbridge validation driver
//!
//! Runs the appliance import scenarios against a platform connection and
//! reports an aggregate pass/fail result. In development mode (the default)
//! the scenarios run against the in-memory mock transport; real transports
//! are linked in by downstream integrations.
//!
//! ## Usage
//! ```bash
//! vbridge-validation --fixture tiny.ova --style xpcom
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{error, info};

use vbridge_glue::mock::MockBridge;
use vbridge_glue::{Bridge, Manager, Style};

mod cli;
mod config;
mod driver;
mod progress;
mod reporter;

use cli::Args;
use config::Config;
use driver::ApplianceDriver;
use reporter::Reporter;

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = vbridge_common::init_logging(&config.logging.level, config.logging.format) {
        eprintln!("logging setup failed: {:#}", e);
        return ExitCode::FAILURE;
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting vbridge validation driver"
    );

    match run(&config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = format!("{:#}", e), "Validation run aborted");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    match &args.config {
        Some(path) => Config::load(path)?.with_cli_overrides(args),
        None => Config::default_with_cli(args),
    }
}

fn run(config: &Config) -> Result<bool> {
    if !config.driver.dev {
        return Err(anyhow!(
            "no real transport is linked into this binary; run with --dev"
        ));
    }
    let bridge: Arc<dyn Bridge> = match config.driver.style {
        Some(Style::Com) => Arc::new(MockBridge::com()),
        _ => Arc::new(MockBridge::new()),
    };
    let manager = Manager::new(config.driver.style, config.connect_params(), bridge)?;
    info!(style = %manager.style(), remote = manager.is_remote(), "Platform connection ready");

    // A configured scratch dir persists after the run; the temporary
    // fallback cleans itself up on drop.
    let temp_scratch;
    let scratch: PathBuf = match &config.driver.scratch_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            PathBuf::from(dir)
        }
        None => {
            temp_scratch = tempfile::tempdir()?;
            temp_scratch.path().to_path_buf()
        }
    };

    let fixtures = collect_fixtures(config, &scratch)?;
    info!(count = fixtures.len(), "Fixtures collected");

    let mut reporter = Reporter::new();
    ApplianceDriver::new(&manager, &scratch).run(&mut reporter, &fixtures);

    let summary = reporter.summary();
    info!(
        passed = summary.passed,
        failed = summary.failed,
        errors = summary.errors,
        duration_ms = summary.duration_ms,
        "Validation run finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(reporter.all_passed())
}

/// Fixtures from the explicit list plus any `*.ova`/`*.ovf` files in the
/// fixture directory. Development mode synthesizes one descriptor into the
/// scratch directory when nothing else is configured.
fn collect_fixtures(config: &Config, scratch: &std::path::Path) -> Result<Vec<PathBuf>> {
    let mut fixtures: Vec<PathBuf> = config.driver.fixtures.iter().map(PathBuf::from).collect();

    if let Some(dir) = &config.driver.fixture_dir {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some("ova") | Some("ovf") => found.push(path),
                _ => {}
            }
        }
        found.sort();
        fixtures.extend(found);
    }

    if fixtures.is_empty() {
        let path = scratch.join("synthetic.ovf");
        std::fs::write(&path, "<Envelope/>\n")?;
        info!(path = %path.display(), "No fixtures configured; synthesized one");
        fixtures.push(path);
    }
    Ok(fixtures)
}
