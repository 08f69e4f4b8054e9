//! Attribute-name translation between caller convention and backend spelling.
//!
//! Callers use lowerCamelCase regardless of the backend. One backend declares
//! its members in PascalCase, and a few members differ only in capitalization
//! beyond the first letter (`osTypes` vs `OSTypes`), so resolution falls back
//! to a case-insensitive scan of the object's declared members. Successful
//! fallbacks are memoized per adapter class: the cache is static, shared by
//! every adapter instance of that style, grows monotonically and is never
//! evicted. Once a name has resolved, resolution is never redone.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::error::{GlueError, Result};
use crate::style::Style;

/// Translate a lowerCamelCase member name to the PascalCase convention by
/// upper-casing exactly the first character.
pub fn comify_name(name: &str) -> Result<String> {
    let mut chars = name.chars();
    match chars.next() {
        None => Err(GlueError::Argument(
            "cannot translate an empty member name".to_string(),
        )),
        Some(first) => {
            let mut out = String::with_capacity(name.len());
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            Ok(out)
        }
    }
}

static COM_CACHE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
static XPCOM_CACHE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
static WEB_CACHE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();

/// The per-style memoization table for resolved member names.
#[derive(Clone, Copy)]
pub(crate) struct NameCache {
    map: &'static OnceLock<Mutex<HashMap<String, String>>>,
}

impl NameCache {
    pub(crate) fn for_style(style: Style) -> Self {
        let map = match style {
            Style::Com => &COM_CACHE,
            Style::Xpcom => &XPCOM_CACHE,
            Style::WebService => &WEB_CACHE,
        };
        NameCache { map }
    }

    fn table(&self) -> &'static Mutex<HashMap<String, String>> {
        self.map.get_or_init(|| Mutex::new(HashMap::new()))
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<String> {
        // A poisoned cache is treated as a miss; resolution just runs again.
        let table = self.table().lock().ok()?;
        table.get(name).cloned()
    }

    pub(crate) fn remember(&self, name: &str, resolved: &str) {
        if let Ok(mut table) = self.table().lock() {
            table.insert(name.to_string(), resolved.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comify_capitalizes_only_the_first_character() {
        assert_eq!(comify_name("machines").unwrap(), "Machines");
        assert_eq!(comify_name("osTypes").unwrap(), "OsTypes");
        assert_eq!(comify_name("lockMachine").unwrap(), "LockMachine");
        assert_eq!(comify_name("X").unwrap(), "X");
        assert_eq!(comify_name("Already").unwrap(), "Already");
    }

    #[test]
    fn comify_rejects_empty_name() {
        let err = comify_name("").unwrap_err();
        assert!(matches!(err, GlueError::Argument(_)));
    }

    #[test]
    fn cache_is_shared_per_style() {
        let a = NameCache::for_style(Style::Xpcom);
        let b = NameCache::for_style(Style::Xpcom);
        a.remember("cacheSharingProbe", "CacheSharingProbe");
        assert_eq!(
            b.lookup("cacheSharingProbe").as_deref(),
            Some("CacheSharingProbe")
        );
        // Other styles keep their own tables.
        assert!(NameCache::for_style(Style::WebService)
            .lookup("cacheSharingProbe")
            .is_none());
    }
}
