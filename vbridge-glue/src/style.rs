//! Backend style selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GlueError;

/// Which backend a manager talks through. Selected once at construction and
/// immutable for the manager's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Local COM dispatch backend.
    Com,
    /// Local XPCOM component backend.
    Xpcom,
    /// Remote web-service backend.
    WebService,
}

impl Style {
    /// The platform-appropriate default when the caller does not specify a
    /// style. Pure function of the host identifier so it can be exercised in
    /// tests without touching ambient state.
    pub fn default_for(host: HostOs) -> Style {
        match host {
            HostOs::Windows => Style::Com,
            HostOs::Unix => Style::Xpcom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Com => "COM",
            Style::Xpcom => "XPCOM",
            Style::WebService => "WEBSERVICE",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Style {
    type Err = GlueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "COM" | "MSCOM" => Ok(Style::Com),
            "XPCOM" => Ok(Style::Xpcom),
            "WEBSERVICE" | "WEB" => Ok(Style::WebService),
            other => Err(GlueError::Argument(format!("unknown style '{}'", other))),
        }
    }
}

/// Coarse host identifier used for style auto-detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Unix,
}

impl HostOs {
    /// The host this process is running on.
    pub fn current() -> HostOs {
        if cfg!(windows) {
            HostOs::Windows
        } else {
            HostOs::Unix
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_follows_host() {
        assert_eq!(Style::default_for(HostOs::Windows), Style::Com);
        assert_eq!(Style::default_for(HostOs::Unix), Style::Xpcom);
    }

    #[test]
    fn styles_parse_case_insensitively() {
        assert_eq!("xpcom".parse::<Style>().unwrap(), Style::Xpcom);
        assert_eq!("MSCOM".parse::<Style>().unwrap(), Style::Com);
        assert_eq!("WebService".parse::<Style>().unwrap(), Style::WebService);
        assert!("plan9".parse::<Style>().is_err());
    }
}
