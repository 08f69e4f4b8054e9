//! Platform-abstraction glue for the virtualization API.
//!
//! One construction path and one operation surface across the three backend
//! access styles:
//!
//! - **COM**: local Windows backend with its own event pump and PascalCase
//!   member names
//! - **XPCOM**: local Unix component backend with a native event loop and
//!   getter-method array access
//! - **Web service**: remote SOAP endpoint, no event transport
//!
//! Callers write against [`Manager`] and [`ObjectRef`] using lowerCamelCase
//! member names; per-style quirks (name capitalization, array access, event
//! waiting and interruption, connection lifecycles) are absorbed by the
//! adapters in [`platform`]. The transport itself is behind the [`Bridge`]
//! trait; [`mock::MockBridge`] provides an in-memory one for tests and
//! development.

pub mod bridge;
pub mod error;
pub mod manager;
pub mod mock;
pub mod names;
pub mod object;
pub mod paths;
pub mod perf;
pub mod platform;
pub mod style;
pub mod traits;
pub mod value;

pub use bridge::{Bridge, ConnectParams, EventSink};
pub use error::{GlueError, Result};
pub use manager::{LockType, Manager};
pub use object::ObjectRef;
pub use perf::{MetricRecord, PerfCollector};
pub use style::{HostOs, Style};
pub use traits::{EventHandler, EventListener, Platform, WaitResult};
pub use value::{Handle, Value};
