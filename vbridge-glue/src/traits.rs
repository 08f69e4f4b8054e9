//! Core platform abstraction trait.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::object::ObjectRef;
use crate::style::Style;
use crate::value::Value;

/// Outcome of an event wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    /// One or more platform events were pumped and dispatched.
    Processed,
    /// The timeout elapsed, or the wait was interrupted from another thread.
    Interrupted,
    /// This backend has no event transport.
    Unsupported,
}

/// Caller-supplied passive event handler.
///
/// Implementations receive every event delivered to the listener they were
/// wrapped into; dispatch happens on the thread driving the event loop.
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, event: &Value);
}

/// A wrapped handler ready for registration with an event source.
///
/// A fixed type parameterized by the handler object; constructed only by
/// [`Platform::create_listener`] on backends that support active listeners.
pub struct EventListener {
    handler: Arc<dyn EventHandler>,
    args: HashMap<String, String>,
}

impl std::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl EventListener {
    pub(crate) fn new(handler: Arc<dyn EventHandler>, args: HashMap<String, String>) -> Self {
        EventListener { handler, args }
    }

    /// Forward one event to the wrapped handler.
    pub fn dispatch(&self, event: &Value) {
        self.handler.handle_event(event);
    }

    /// Side-channel argument supplied at construction.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }
}

/// Backend capability set.
///
/// Each adapter fulfils the same contract over a different transport. An
/// adapter is `Ready` after construction and `Deinitialized` (terminal) after
/// [`Platform::deinit`]; every other operation fails fast once deinitialized.
///
/// Apart from the wait/interrupt pair, adapters assume external serialization
/// by the caller; they are not designed for concurrent use from multiple
/// worker threads.
pub trait Platform: Send + Sync {
    /// The style this adapter implements.
    fn style(&self) -> Style;

    /// Obtain the platform's root object.
    fn get_root(&self) -> Result<ObjectRef>;

    /// Obtain a session object for machine locking, keyed to `root`.
    fn get_session_object(&self, root: &ObjectRef) -> Result<ObjectRef>;

    /// Read an array-typed attribute.
    ///
    /// One local backend reads the attribute directly, the other must invoke
    /// a getter-style method instead; callers never see the difference.
    fn get_array(&self, object: &ObjectRef, attribute: &str) -> Result<Vec<Value>>;

    /// Whether this adapter talks to a remote host.
    fn is_remote(&self) -> bool;

    /// Backend context setup for the calling thread. Must be paired with
    /// [`Platform::deinit_per_thread`] on every worker thread that touches
    /// this adapter; unpaired calls leak backend resources.
    fn init_per_thread(&self) -> Result<()>;

    /// Backend context teardown for the calling thread.
    fn deinit_per_thread(&self) -> Result<()>;

    /// Wrap a passive handler for registration with an event source.
    ///
    /// Fails with `Unsupported` on backends without active-listener support;
    /// never returns a partially usable handle.
    fn create_listener(
        &self,
        handler: Arc<dyn EventHandler>,
        args: HashMap<String, String>,
    ) -> Result<EventListener>;

    /// Block until a platform event, an interrupt, or the timeout.
    ///
    /// A negative `timeout_ms` waits indefinitely; zero polls without
    /// blocking. Only the thread that constructed the adapter may call this;
    /// other threads get a `ThreadAffinity` error.
    fn wait_for_events(&self, timeout_ms: i64) -> Result<WaitResult>;

    /// Wake a concurrently blocked [`Platform::wait_for_events`] call.
    ///
    /// The one operation safe to call from any thread. Returns whether the
    /// interrupt signal was delivered.
    fn interrupt_wait_events(&self) -> bool;

    /// Reinterpret a reference as another declared interface.
    fn query_interface(&self, object: &ObjectRef, interface: &str) -> Result<ObjectRef>;

    /// Release all adapter-held resources. Idempotent.
    fn deinit(&self);
}
