//! Remote web-service adapter.
//!
//! Connections are established by logging on to the configured endpoint;
//! session objects come from the remote session manager keyed to that
//! connection. There is no event transport: waiting reports `Unsupported`
//! and interruption is a no-op, from any thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::bridge::{Bridge, ConnectParams};
use crate::error::{GlueError, Result};
use crate::object::ObjectRef;
use crate::style::Style;
use crate::traits::{EventHandler, EventListener, Platform, WaitResult};
use crate::value::{Handle, Value};

/// Adapter for the remote web-service backend.
pub struct WebAdapter {
    bridge: Arc<dyn Bridge>,
    params: ConnectParams,
    connected: Mutex<Option<Handle>>,
    dead: AtomicBool,
}

impl WebAdapter {
    /// Construct the adapter. No connection is attempted yet; logon happens
    /// on the first [`Platform::get_root`] call.
    pub fn new(bridge: Arc<dyn Bridge>, params: ConnectParams) -> Result<Self> {
        info!(url = %params.url, user = %params.user, "Web-service adapter ready");
        Ok(WebAdapter {
            bridge,
            params,
            connected: Mutex::new(None),
            dead: AtomicBool::new(false),
        })
    }

    fn ensure_ready(&self, op: &str) -> Result<()> {
        if self.dead.load(Ordering::SeqCst) {
            return Err(GlueError::Deinitialized(op.to_string()));
        }
        Ok(())
    }
}

impl Platform for WebAdapter {
    fn style(&self) -> Style {
        Style::WebService
    }

    fn get_root(&self) -> Result<ObjectRef> {
        self.ensure_ready("getRoot")?;
        let mut connected = self
            .connected
            .lock()
            .map_err(|_| GlueError::Internal("connection state lock poisoned".to_string()))?;
        // Reconnecting first logs the previous session off.
        if let Some(old) = connected.take() {
            if let Err(e) = self.bridge.disconnect(old) {
                debug!(error = %e, "Logoff of previous connection failed");
            }
        }
        let handle = self.bridge.connect(&self.params)?;
        *connected = Some(handle);
        info!(url = %self.params.url, "Logged on to web service");
        Ok(ObjectRef::new(
            Arc::clone(&self.bridge),
            handle,
            Style::WebService,
        ))
    }

    fn get_session_object(&self, root: &ObjectRef) -> Result<ObjectRef> {
        self.ensure_ready("getSessionObject")?;
        // The remote session manager hands out sessions keyed to the
        // established connection.
        let handle = self.bridge.create_session(root.handle())?;
        Ok(root.sibling(handle))
    }

    fn get_array(&self, object: &ObjectRef, attribute: &str) -> Result<Vec<Value>> {
        self.ensure_ready("getArray")?;
        object.get(attribute)?.into_array()
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn init_per_thread(&self) -> Result<()> {
        self.ensure_ready("initPerThread")
    }

    fn deinit_per_thread(&self) -> Result<()> {
        self.ensure_ready("deinitPerThread")
    }

    fn create_listener(
        &self,
        _handler: Arc<dyn EventHandler>,
        _args: HashMap<String, String>,
    ) -> Result<EventListener> {
        // No transport for push events.
        Err(GlueError::Unsupported(
            "no active listeners over the web-service transport".to_string(),
        ))
    }

    fn wait_for_events(&self, _timeout_ms: i64) -> Result<WaitResult> {
        self.ensure_ready("waitForEvents")?;
        Ok(WaitResult::Unsupported)
    }

    fn interrupt_wait_events(&self) -> bool {
        false
    }

    fn query_interface(&self, object: &ObjectRef, interface: &str) -> Result<ObjectRef> {
        self.ensure_ready("queryInterface")?;
        let handle = self.bridge.query_interface(object.handle(), interface)?;
        Ok(object.sibling(handle))
    }

    fn deinit(&self) {
        if self.dead.swap(true, Ordering::SeqCst) {
            return;
        }
        // Logoff failures are tolerated here and only here; the connection
        // may already be gone.
        if let Ok(mut connected) = self.connected.lock() {
            if let Some(handle) = connected.take() {
                if let Err(e) = self.bridge.disconnect(handle) {
                    debug!(error = %e, "Logoff during deinit failed");
                }
            }
        }
        info!("Web-service adapter deinitialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBridge;

    fn params() -> ConnectParams {
        ConnectParams {
            url: "http://127.0.0.1:18083".to_string(),
            user: "tester".to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn waiting_is_unsupported_everywhere() {
        let bridge = Arc::new(MockBridge::new());
        let adapter = WebAdapter::new(bridge, params()).unwrap();
        assert_eq!(
            adapter.wait_for_events(-1).unwrap(),
            WaitResult::Unsupported
        );
        assert_eq!(adapter.wait_for_events(0).unwrap(), WaitResult::Unsupported);
        assert!(!adapter.interrupt_wait_events());
    }

    #[test]
    fn listeners_are_rejected() {
        struct Nop;
        impl EventHandler for Nop {
            fn handle_event(&self, _event: &Value) {}
        }
        let bridge = Arc::new(MockBridge::new());
        let adapter = WebAdapter::new(bridge, params()).unwrap();
        let err = adapter
            .create_listener(Arc::new(Nop), HashMap::new())
            .unwrap_err();
        assert!(matches!(err, GlueError::Unsupported(_)));
    }

    #[test]
    fn logon_failure_surfaces_as_connection_error() {
        let bridge = Arc::new(MockBridge::new());
        bridge.refuse_connections(true);
        let adapter = WebAdapter::new(bridge, params()).unwrap();
        assert!(matches!(
            adapter.get_root(),
            Err(GlueError::Connection(_))
        ));
    }

    #[test]
    fn deinit_logs_off_and_is_idempotent() {
        let bridge = Arc::new(MockBridge::new());
        let adapter = WebAdapter::new(Arc::clone(&bridge) as Arc<dyn Bridge>, params()).unwrap();
        adapter.get_root().unwrap();
        adapter.deinit();
        adapter.deinit();
        assert!(matches!(
            adapter.get_root(),
            Err(GlueError::Deinitialized(_))
        ));
    }
}
