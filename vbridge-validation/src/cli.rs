//! Command-line argument parsing.

use clap::Parser;
use vbridge_glue::Style;

/// vbridge validation driver - appliance scenario runner
#[derive(Parser, Debug)]
#[command(name = "vbridge-validation")]
#[command(about = "vbridge validation driver - appliance scenario runner")]
#[command(version)]
pub struct Args {
    /// Path to configuration file (optional, defaults used if not found)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, default_value = "text")]
    pub log_format: String,

    /// Backend access style (com, xpcom, webservice); auto-detected if unset
    #[arg(long)]
    pub style: Option<Style>,

    /// Web-service endpoint URL
    #[arg(long)]
    pub web_url: Option<String>,

    /// Web-service user name
    #[arg(long)]
    pub web_user: Option<String>,

    /// Web-service password
    #[arg(long, env = "VBRIDGE_WEB_PASSWORD")]
    pub web_password: Option<String>,

    /// Appliance fixture file (repeatable)
    #[arg(long = "fixture")]
    pub fixtures: Vec<String>,

    /// Directory scanned for appliance fixtures (*.ova, *.ovf)
    #[arg(long)]
    pub fixture_dir: Option<String>,

    /// Scratch directory for unpacked fixtures (temporary dir if unset)
    #[arg(long)]
    pub scratch_dir: Option<String>,

    /// Enable development mode (mock transport)
    #[arg(long)]
    pub dev: bool,
}
