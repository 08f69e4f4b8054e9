//! The unified entry point callers construct and use regardless of backend.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::bridge::{Bridge, ConnectParams};
use crate::error::{GlueError, Result};
use crate::object::ObjectRef;
use crate::paths::InstallPaths;
use crate::perf::PerfCollector;
use crate::platform::{ComAdapter, WebAdapter, XpcomAdapter};
use crate::style::{HostOs, Style};
use crate::traits::{EventHandler, EventListener, Platform, WaitResult};
use crate::value::Value;

/// Machine lock levels. Wire values match the platform's enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    Shared = 1,
    Write = 2,
}

/// API manager: selects an adapter by style and exposes the unified
/// operation set plus a few derived conveniences.
///
/// Exactly one adapter lives for the manager's lifetime; the style cannot
/// change after construction. The transport `bridge` is supplied by the
/// integration linking this crate (or [`crate::mock::MockBridge`] in tests
/// and development).
pub struct Manager {
    style: Style,
    platform: Box<dyn Platform>,
    root: Option<ObjectRef>,
    paths: InstallPaths,
}

impl Manager {
    /// Construct a manager, auto-detecting the style for this host when none
    /// is given.
    pub fn new(
        style: Option<Style>,
        params: ConnectParams,
        bridge: Arc<dyn Bridge>,
    ) -> Result<Manager> {
        Self::with_host(style, params, bridge, HostOs::current())
    }

    /// Construct with an explicit host identifier for the auto-detection.
    #[instrument(skip(params, bridge))]
    pub fn with_host(
        style: Option<Style>,
        params: ConnectParams,
        bridge: Arc<dyn Bridge>,
        host: HostOs,
    ) -> Result<Manager> {
        let style = style.unwrap_or_else(|| Style::default_for(host));
        let platform: Box<dyn Platform> = match style {
            Style::Com => Box::new(ComAdapter::new(bridge)?),
            Style::Xpcom => Box::new(XpcomAdapter::new(bridge)?),
            Style::WebService => Box::new(WebAdapter::new(bridge, params)?),
        };

        // Remote connections may be established later; local backends must
        // be reachable at construction.
        let root = match platform.get_root() {
            Ok(root) => Some(root),
            Err(e) if platform.is_remote() => {
                warn!(error = %e, "Deferring web-service connection");
                None
            }
            Err(e) => return Err(e),
        };

        info!(style = %style, connected = root.is_some(), "Manager ready");
        Ok(Manager {
            style,
            platform,
            root,
            paths: InstallPaths::discover(),
        })
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn is_remote(&self) -> bool {
        self.platform.is_remote()
    }

    /// The root object, if a connection is established.
    pub fn root(&self) -> Option<&ObjectRef> {
        self.root.as_ref()
    }

    fn require_root(&self) -> Result<&ObjectRef> {
        self.root
            .as_ref()
            .ok_or_else(|| GlueError::Connection("no root connection established".to_string()))
    }

    /// (Re-)establish the connection and return the root object. Mostly
    /// useful for the remote style, whose construction defers logon.
    pub fn connect(&mut self) -> Result<&ObjectRef> {
        let root = self.platform.get_root()?;
        self.root = Some(root);
        Ok(self.root.as_ref().expect("root was just set"))
    }

    // =========================================================================
    // Adapter pass-throughs
    // =========================================================================

    pub fn get_session_object(&self, root: &ObjectRef) -> Result<ObjectRef> {
        self.platform.get_session_object(root)
    }

    pub fn get_array(&self, object: &ObjectRef, attribute: &str) -> Result<Vec<Value>> {
        self.platform.get_array(object, attribute)
    }

    pub fn create_listener(
        &self,
        handler: Arc<dyn EventHandler>,
        args: HashMap<String, String>,
    ) -> Result<EventListener> {
        self.platform.create_listener(handler, args)
    }

    pub fn wait_for_events(&self, timeout_ms: i64) -> Result<WaitResult> {
        self.platform.wait_for_events(timeout_ms)
    }

    pub fn interrupt_wait_events(&self) -> bool {
        self.platform.interrupt_wait_events()
    }

    pub fn query_interface(&self, object: &ObjectRef, interface: &str) -> Result<ObjectRef> {
        self.platform.query_interface(object, interface)
    }

    pub fn init_per_thread(&self) -> Result<()> {
        self.platform.init_per_thread()
    }

    pub fn deinit_per_thread(&self) -> Result<()> {
        self.platform.deinit_per_thread()
    }

    // =========================================================================
    // Derived conveniences
    // =========================================================================

    /// Open a session holding a shared or exclusive lock on `machine`.
    ///
    /// The caller owns the returned session and must release it with
    /// [`Manager::close_machine_session`]. Lock failures propagate unchanged.
    #[instrument(skip(self, machine), fields(machine = machine.handle()))]
    pub fn open_machine_session(
        &self,
        machine: &ObjectRef,
        permit_sharing: bool,
    ) -> Result<ObjectRef> {
        let root = self.require_root()?;
        let session = self.platform.get_session_object(root)?;
        let lock = if permit_sharing {
            LockType::Shared
        } else {
            LockType::Write
        };
        machine.call(
            "lockMachine",
            &[Value::Object(session.handle()), Value::Int(lock as i64)],
        )?;
        Ok(session)
    }

    /// Release the machine lock held by a session opened with
    /// [`Manager::open_machine_session`]. A `None` session is a no-op; any
    /// other failure propagates.
    pub fn close_machine_session(&self, session: Option<&ObjectRef>) -> Result<()> {
        match session {
            None => Ok(()),
            Some(session) => {
                session.call("unlockMachine", &[])?;
                Ok(())
            }
        }
    }

    /// Helper for the performance-collector goodies, bound to this
    /// connection's collector object.
    pub fn perf_collector(&self) -> Result<PerfCollector> {
        let root = self.require_root()?;
        PerfCollector::new(root, self.style)
    }

    /// The platform's binary directory.
    pub fn bin_dir(&self) -> &str {
        &self.paths.bin_dir
    }

    /// The platform's SDK directory.
    pub fn sdk_dir(&self) -> &str {
        &self.paths.sdk_dir
    }

    /// Release the root reference and tear the adapter down. Idempotent; the
    /// manager must not be used afterwards.
    pub fn deinit(&mut self) {
        self.root = None;
        self.platform.deinit();
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.deinit();
    }
}
