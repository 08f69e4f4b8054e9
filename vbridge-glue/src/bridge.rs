//! The transport seam between the glue and a backend object model.
//!
//! The real transports (COM dispatch, XPCOM components, the web-service SOAP
//! client) live outside this crate. Each of them exposes the raw object-model
//! operations below; the adapters in [`crate::platform`] add policy on top:
//! name translation, array-access conventions, event pumping, thread affinity
//! and the listener rules. Nothing in this crate patches a foreign library;
//! foreign handles are only ever touched through this trait.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::Result;
use crate::traits::WaitResult;
use crate::value::{Handle, Value};

/// Connection parameters. Only the web-service backend reads these; the local
/// backends connect to whatever is installed on the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectParams {
    /// Endpoint address of the web service.
    pub url: String,
    /// Credential principal.
    pub user: String,
    /// Credential secret.
    pub password: String,
}

/// Receives platform events delivered into a per-adapter pump queue.
///
/// Used by the backend whose events arrive on the constructing thread's
/// message queue rather than through a native event loop.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: Value);
}

/// Raw object-model operations a transport provides.
///
/// Implementations must be usable from multiple threads; serialization of
/// anything beyond the wait/interrupt pair is the caller's business, exactly
/// as for the adapters built on top.
pub trait Bridge: Send + Sync {
    /// Establish the connection and return the platform's root object.
    ///
    /// For the local transports this resolves the installed object model; for
    /// the web service it performs the logon with `params`.
    fn connect(&self, params: &ConnectParams) -> Result<Handle>;

    /// Tear down a connection established by [`Bridge::connect`].
    fn disconnect(&self, root: Handle) -> Result<()>;

    /// Create a session object usable for machine locking, keyed to the
    /// given root connection.
    fn create_session(&self, root: Handle) -> Result<Handle>;

    /// The declared member names (attributes and methods) of an object.
    ///
    /// This is the scan path of the name-translation fallback; it is only
    /// consulted when the straightforward spellings of a name miss.
    fn member_names(&self, object: Handle) -> Result<Vec<String>>;

    /// Read an attribute by its exact backend spelling.
    fn get_attribute(&self, object: Handle, name: &str) -> Result<Value>;

    /// Write an attribute by its exact backend spelling.
    fn set_attribute(&self, object: Handle, name: &str, value: Value) -> Result<()>;

    /// Invoke a method by its exact backend spelling.
    fn call(&self, object: Handle, method: &str, args: &[Value]) -> Result<Value>;

    /// Reinterpret an object as another declared interface.
    fn query_interface(&self, object: Handle, interface: &str) -> Result<Handle>;

    /// Establish backend context for the calling thread.
    fn attach_thread(&self) -> Result<()> {
        Ok(())
    }

    /// Tear down backend context for the calling thread.
    fn detach_thread(&self) -> Result<()> {
        Ok(())
    }

    /// Register the sink that receives pump-style events. Backends with a
    /// native event loop may ignore this.
    fn set_event_sink(&self, _sink: Arc<dyn EventSink>) {}

    /// Block in the backend's native event loop, where one exists.
    fn wait_native_events(&self, _timeout_ms: i64) -> Result<WaitResult> {
        Ok(WaitResult::Unsupported)
    }

    /// Wake a concurrent [`Bridge::wait_native_events`] call. Returns whether
    /// the wake-up was delivered.
    fn interrupt_native_wait(&self) -> bool {
        false
    }
}
