//! Local accessor for foreign object handles.
//!
//! All attribute and method traffic that crosses into the backend object
//! model goes through [`ObjectRef`], which applies the name-translation shim
//! at every access. Nothing about the backend library itself is altered; the
//! shim is composed per reference.

use std::fmt;
use std::sync::Arc;

use crate::bridge::Bridge;
use crate::error::{GlueError, Result};
use crate::names::{comify_name, NameCache};
use crate::style::Style;
use crate::value::{Handle, Value};

/// A reference to an object in the backend object model.
///
/// Cheap to clone; does not own the backend object. Lifetime of the
/// underlying object is the backend's business (sessions, for instance, are
/// released by explicitly unlocking them).
#[derive(Clone)]
pub struct ObjectRef {
    bridge: Arc<dyn Bridge>,
    handle: Handle,
    style: Style,
}

impl ObjectRef {
    pub(crate) fn new(bridge: Arc<dyn Bridge>, handle: Handle, style: Style) -> Self {
        ObjectRef {
            bridge,
            handle,
            style,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub(crate) fn bridge(&self) -> &Arc<dyn Bridge> {
        &self.bridge
    }

    /// Re-wrap another handle from the same connection, e.g. one returned
    /// from a method call as [`Value::Object`].
    pub fn sibling(&self, handle: Handle) -> ObjectRef {
        ObjectRef::new(Arc::clone(&self.bridge), handle, self.style)
    }

    /// Read an attribute, translating the name as needed.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.with_resolved(name, |n| self.bridge.get_attribute(self.handle, n))
    }

    /// Write an attribute, translating the name as needed.
    pub fn set(&self, name: &str, value: Value) -> Result<()> {
        self.with_resolved(name, |n| {
            self.bridge.set_attribute(self.handle, n, value.clone())
        })
    }

    /// Invoke a method, translating the name as needed.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.with_resolved(method, |n| self.bridge.call(self.handle, n, args))
    }

    /// Name resolution applied to every crossing into the object model:
    ///
    /// 1. memoized mapping, if one exists;
    /// 2. the verbatim name;
    /// 3. the PascalCase translation (memoized on success);
    /// 4. a case-insensitive scan of the declared members (memoized on
    ///    success);
    /// 5. otherwise the original lookup failure, unchanged.
    ///
    /// Only lookup failures trigger the fallbacks; a transport failure on the
    /// verbatim name propagates as-is.
    fn with_resolved<T>(&self, name: &str, access: impl Fn(&str) -> Result<T>) -> Result<T> {
        if name.is_empty() {
            return Err(GlueError::Argument("empty member name".to_string()));
        }

        let cache = NameCache::for_style(self.style);
        if let Some(resolved) = cache.lookup(name) {
            return access(&resolved);
        }

        let original = match access(name) {
            Ok(v) => return Ok(v),
            Err(e @ GlueError::Lookup(_)) => e,
            Err(e) => return Err(e),
        };

        let comified = comify_name(name)?;
        if comified != name {
            if let Ok(v) = access(&comified) {
                cache.remember(name, &comified);
                return Ok(v);
            }
        }

        if let Ok(members) = self.bridge.member_names(self.handle) {
            let matched = members.iter().find(|m| {
                m.eq_ignore_ascii_case(name) && m.as_str() != name && m.as_str() != comified
            });
            if let Some(m) = matched {
                cache.remember(name, m);
                return access(m);
            }
        }

        Err(original)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("handle", &self.handle)
            .field("style", &self.style)
            .finish()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && Arc::ptr_eq(&self.bridge, &other.bridge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::ConnectParams;
    use crate::mock::MockBridge;

    fn root(bridge: &Arc<MockBridge>, style: Style) -> ObjectRef {
        let handle = bridge.connect(&ConnectParams::default()).unwrap();
        ObjectRef::new(Arc::clone(bridge) as Arc<dyn Bridge>, handle, style)
    }

    #[test]
    fn verbatim_access_skips_all_fallbacks() {
        let bridge = Arc::new(MockBridge::new());
        let root = root(&bridge, Style::Xpcom);
        let before = bridge.member_scan_count();
        assert_eq!(
            root.get("version").unwrap(),
            Value::Str("7.0.0-mock".to_string())
        );
        assert_eq!(bridge.member_scan_count(), before);
    }

    #[test]
    fn pascal_case_members_resolve_from_camel_case() {
        let bridge = Arc::new(MockBridge::com());
        let root = root(&bridge, Style::Com);
        assert_eq!(
            root.get("version").unwrap(),
            Value::Str("7.0.0-mock".to_string())
        );
        root.set("version", Value::Str("7.1.0".to_string())).unwrap();
        assert_eq!(root.get("version").unwrap(), Value::Str("7.1.0".to_string()));
    }

    #[test]
    fn irregular_spellings_resolve_once_then_memoize() {
        let bridge = Arc::new(MockBridge::com());
        let root = root(&bridge, Style::Com);
        // Neither the verbatim name nor its capitalization matches this
        // spelling; only the member scan can find it.
        bridge.declare_attribute(root.handle(), "OSTypes", Value::Array(Vec::new()));

        let before = bridge.member_scan_count();
        assert!(root.get("osTypes").is_ok());
        assert_eq!(bridge.member_scan_count(), before + 1);
        // The second access hits the memoized mapping.
        assert!(root.get("osTypes").is_ok());
        assert_eq!(bridge.member_scan_count(), before + 1);
    }

    #[test]
    fn unknown_members_surface_the_original_error() {
        let bridge = Arc::new(MockBridge::new());
        let root = root(&bridge, Style::Xpcom);
        let err = root.get("noSuchThing").unwrap_err();
        assert!(matches!(err, GlueError::Lookup(ref msg) if msg.contains("noSuchThing")));
    }

    #[test]
    fn empty_names_are_rejected() {
        let bridge = Arc::new(MockBridge::new());
        let root = root(&bridge, Style::Xpcom);
        assert!(matches!(root.get(""), Err(GlueError::Argument(_))));
        assert!(matches!(root.call("", &[]), Err(GlueError::Argument(_))));
    }

    #[test]
    fn transport_failures_do_not_trigger_fallbacks() {
        let bridge = Arc::new(MockBridge::new());
        let root = root(&bridge, Style::Xpcom);
        let stale = root.sibling(9999);
        let before = bridge.member_scan_count();
        assert!(matches!(
            stale.get("rareStaleAttr"),
            Err(GlueError::Transport(_))
        ));
        assert_eq!(bridge.member_scan_count(), before);
    }
}
