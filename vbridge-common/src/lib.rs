//! # vbridge Common
//!
//! Shared utilities for the vbridge crates.
//!
//! ## Logging
//!
//! ```rust,no_run
//! use vbridge_common::{init_logging, LogFormat};
//!
//! init_logging("info", LogFormat::Text).unwrap();
//! ```

pub mod logging;

pub use logging::{init_logging, LogFormat};
