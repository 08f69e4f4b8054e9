//! Local XPCOM component adapter.
//!
//! The backend owns a native event loop, so waiting and interruption are
//! delegated to the bridge. Array-typed attributes are not readable as
//! attributes on this backend; the adapter calls the corresponding
//! getter-style method instead, invisibly to callers. This is also the one
//! backend with working active-listener support.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tracing::{debug, info};

use crate::bridge::{Bridge, ConnectParams};
use crate::error::{GlueError, Result};
use crate::names::comify_name;
use crate::object::ObjectRef;
use crate::style::Style;
use crate::traits::{EventHandler, EventListener, Platform, WaitResult};
use crate::value::Value;

/// Adapter for the local XPCOM component backend.
pub struct XpcomAdapter {
    bridge: Arc<dyn Bridge>,
    tid: ThreadId,
    dead: AtomicBool,
}

impl XpcomAdapter {
    /// Construct the adapter on the calling thread.
    pub fn new(bridge: Arc<dyn Bridge>) -> Result<Self> {
        bridge.attach_thread()?;
        info!("XPCOM adapter ready");
        Ok(XpcomAdapter {
            bridge,
            tid: thread::current().id(),
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

impl Platform for XpcomAdapter {
    fn style(&self) -> Style {
        Style::Xpcom
    }

    fn get_root(&self) -> Result<ObjectRef> {
        self.ensure_ready("getRoot")?;
        let handle = self.bridge.connect(&ConnectParams::default())?;
        Ok(ObjectRef::new(
            Arc::clone(&self.bridge),
            handle,
            Style::Xpcom,
        ))
    }

    fn get_session_object(&self, root: &ObjectRef) -> Result<ObjectRef> {
        self.ensure_ready("getSessionObject")?;
        let handle = self.bridge.create_session(root.handle())?;
        Ok(root.sibling(handle))
    }

    fn get_array(&self, object: &ObjectRef, attribute: &str) -> Result<Vec<Value>> {
        self.ensure_ready("getArray")?;
        // Array attributes are only reachable through their getter method on
        // this backend.
        let getter = format!("get{}", comify_name(attribute)?);
        object.call(&getter, &[])?.into_array()
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn init_per_thread(&self) -> Result<()> {
        self.ensure_ready("initPerThread")?;
        self.bridge.attach_thread()
    }

    fn deinit_per_thread(&self) -> Result<()> {
        self.ensure_ready("deinitPerThread")?;
        self.bridge.detach_thread()
    }

    fn create_listener(
        &self,
        handler: Arc<dyn EventHandler>,
        args: HashMap<String, String>,
    ) -> Result<EventListener> {
        self.ensure_ready("createListener")?;
        Ok(EventListener::new(handler, args))
    }

    fn wait_for_events(&self, timeout_ms: i64) -> Result<WaitResult> {
        self.ensure_ready("waitForEvents")?;
        if thread::current().id() != self.tid {
            return Err(GlueError::ThreadAffinity(
                "waitForEvents must run on the thread that constructed the adapter".to_string(),
            ));
        }
        self.bridge.wait_native_events(timeout_ms)
    }

    fn interrupt_wait_events(&self) -> bool {
        if self.dead.load(Ordering::SeqCst) {
            return false;
        }
        self.bridge.interrupt_native_wait()
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
        // Wake a blocked waiter before tearing down thread context.
        self.bridge.interrupt_native_wait();
        if let Err(e) = self.bridge.detach_thread() {
            debug!(error = %e, "Thread detach during deinit failed");
        }
        info!("XPCOM adapter deinitialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBridge;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    fn adapter() -> (Arc<MockBridge>, XpcomAdapter) {
        let bridge = Arc::new(MockBridge::new());
        let adapter = XpcomAdapter::new(Arc::clone(&bridge) as Arc<dyn Bridge>).unwrap();
        (bridge, adapter)
    }

    #[test]
    fn arrays_come_through_the_getter_method() {
        let (bridge, adapter) = adapter();
        bridge.add_machine("alpha");
        bridge.add_machine("beta");
        let root = adapter.get_root().unwrap();
        let machines = adapter.get_array(&root, "machines").unwrap();
        assert_eq!(machines.len(), 2);
    }

    #[test]
    fn native_wait_sees_injected_events() {
        let (bridge, adapter) = adapter();
        bridge.inject_event(Value::Int(1));
        assert_eq!(
            adapter.wait_for_events(1000).unwrap(),
            WaitResult::Processed
        );
    }

    #[test]
    fn native_wait_interruptible_from_other_thread() {
        let (_bridge, adapter) = adapter();
        let adapter = Arc::new(adapter);
        let interrupter = Arc::clone(&adapter);
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            interrupter.interrupt_wait_events()
        });
        let started = Instant::now();
        assert_eq!(adapter.wait_for_events(-1).unwrap(), WaitResult::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(t.join().unwrap());
    }

    #[test]
    fn wait_fails_off_thread() {
        let (_bridge, adapter) = adapter();
        let adapter = Arc::new(adapter);
        let off = Arc::clone(&adapter);
        let result = thread::spawn(move || off.wait_for_events(0)).join().unwrap();
        assert!(matches!(result, Err(GlueError::ThreadAffinity(_))));
    }

    #[test]
    fn listener_wraps_handler_and_args() {
        struct Recorder(Mutex<Vec<Value>>);
        impl EventHandler for Recorder {
            fn handle_event(&self, event: &Value) {
                self.0.lock().unwrap().push(event.clone());
            }
        }

        let (_bridge, adapter) = adapter();
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let mut args = HashMap::new();
        args.insert("tag".to_string(), "t1".to_string());
        let listener = adapter
            .create_listener(Arc::clone(&recorder) as Arc<dyn EventHandler>, args)
            .unwrap();

        listener.dispatch(&Value::Str("ping".into()));
        assert_eq!(listener.arg("tag"), Some("t1"));
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn per_thread_context_is_paired() {
        let (bridge, adapter) = adapter();
        let attached_before = bridge.attached_threads();
        let adapter = Arc::new(adapter);
        let worker = Arc::clone(&adapter);
        thread::spawn(move || {
            worker.init_per_thread().unwrap();
            worker.deinit_per_thread().unwrap();
        })
        .join()
        .unwrap();
        assert_eq!(bridge.attached_threads(), attached_before);
    }
}
