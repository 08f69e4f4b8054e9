//! Environment-derived install locations.
//!
//! Two overrides are consumed once per process: the platform's installed
//! binaries and its SDK bindings. Both fall back to install-time placeholder
//! strings when unset, and both are re-exported into the process environment
//! for downstream consumers (child processes, generated bindings).

use std::env;

use tracing::debug;

/// Environment variable naming the platform's binary directory.
pub const PROGRAM_PATH_ENV: &str = "VBRIDGE_PROGRAM_PATH";
/// Environment variable naming the platform's SDK directory.
pub const SDK_PATH_ENV: &str = "VBRIDGE_SDK_PATH";

// Rewritten by the installer; left as markers in development trees.
const PROGRAM_PATH_PLACEHOLDER: &str = "%VBRIDGE_INSTALL_PATH%";
const SDK_PATH_PLACEHOLDER: &str = "%VBRIDGE_SDK_PATH%";

/// Resolved install locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    /// Directory holding the platform's installed binaries.
    pub bin_dir: String,
    /// Directory holding the platform's SDK bindings.
    pub sdk_dir: String,
}

impl InstallPaths {
    /// Read the overrides, apply placeholder defaults, and re-export both
    /// values into the environment.
    pub fn discover() -> InstallPaths {
        let bin_dir =
            env::var(PROGRAM_PATH_ENV).unwrap_or_else(|_| PROGRAM_PATH_PLACEHOLDER.to_string());
        let sdk_dir = env::var(SDK_PATH_ENV).unwrap_or_else(|_| SDK_PATH_PLACEHOLDER.to_string());

        env::set_var(PROGRAM_PATH_ENV, &bin_dir);
        env::set_var(SDK_PATH_ENV, &sdk_dir);

        debug!(bin_dir = %bin_dir, sdk_dir = %sdk_dir, "Resolved install paths");
        InstallPaths { bin_dir, sdk_dir }
    }
}
