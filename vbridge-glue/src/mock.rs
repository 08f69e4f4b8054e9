//! Mock transport for testing and development.
//!
//! Simulates the platform object model in memory without any installed
//! backend: a root object with machines and a performance collector,
//! appliances with progress objects, sessions with lock state, and both
//! event delivery paths (pump sink and native loop). Useful for:
//! - Unit and integration testing
//! - Running the validation driver without a platform installed
//! - Demo environments
//!
//! [`MockBridge::new`] mimics the getter-convention local backend and the
//! web service (members declared in lowerCamelCase); [`MockBridge::com`]
//! mimics the COM backend (PascalCase members, duplicated input arrays in
//! the metrics query).

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use tracing::{debug, info};
use uuid::Uuid;

use crate::bridge::{Bridge, ConnectParams, EventSink};
use crate::error::{GlueError, Result};
use crate::traits::WaitResult;
use crate::value::{Handle, Value};

// HRESULT-style failure code the mock progress reports for a missing file.
const MOCK_E_FILE_ERROR: i64 = 0x80BB_0001;

struct MockObject {
    interface: String,
    attrs: HashMap<String, Value>,
}

struct MockMetric {
    name: String,
    object: String,
    unit: String,
    scale: i64,
    values: Vec<i64>,
    enabled: bool,
}

struct MockState {
    next_handle: Handle,
    objects: HashMap<Handle, MockObject>,
    root: Option<Handle>,
    collector: Option<Handle>,
    metrics: Vec<MockMetric>,
}

#[derive(Default)]
struct NativeState {
    pending: VecDeque<Value>,
    interrupted: bool,
}

/// In-memory platform object model implementing [`Bridge`].
pub struct MockBridge {
    state: Mutex<MockState>,
    native: Mutex<NativeState>,
    native_wakeup: Condvar,
    sink: Mutex<Option<Arc<dyn EventSink>>>,
    threads: Mutex<HashMap<ThreadId, usize>>,
    member_scans: AtomicUsize,
    refuse: AtomicBool,
    pascal_members: bool,
    duplicate_query_inputs: bool,
}

impl MockBridge {
    /// Mock with lowerCamelCase members (getter-convention local backend and
    /// web service).
    pub fn new() -> Self {
        Self::build(false, false)
    }

    /// Mock with PascalCase members and the duplicated metrics input arrays
    /// of the COM backend.
    pub fn com() -> Self {
        Self::build(true, true)
    }

    fn build(pascal_members: bool, duplicate_query_inputs: bool) -> Self {
        info!(pascal_members, "Creating mock bridge");
        MockBridge {
            state: Mutex::new(MockState {
                next_handle: 1,
                objects: HashMap::new(),
                root: None,
                collector: None,
                metrics: Vec::new(),
            }),
            native: Mutex::new(NativeState::default()),
            native_wakeup: Condvar::new(),
            sink: Mutex::new(None),
            threads: Mutex::new(HashMap::new()),
            member_scans: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
            pascal_members,
            duplicate_query_inputs,
        }
    }

    /// Make subsequent connection attempts fail.
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// Register a machine on the root object. Returns its handle.
    pub fn add_machine(&self, name: &str) -> Handle {
        let mut st = match self.state.lock() {
            Ok(st) => st,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.add_machine_locked(&mut st, name)
    }

    /// Register a metric sample set served by the performance collector.
    pub fn register_metric(&self, name: &str, object: &str, unit: &str, scale: i64, values: &[i64]) {
        if let Ok(mut st) = self.state.lock() {
            st.metrics.push(MockMetric {
                name: name.to_string(),
                object: object.to_string(),
                unit: unit.to_string(),
                scale,
                values: values.to_vec(),
                enabled: true,
            });
        }
    }

    /// Deliver a platform event: into the registered pump sink if one is
    /// attached, otherwise into the native event loop.
    pub fn inject_event(&self, event: Value) {
        let sink = self.sink.lock().ok().and_then(|s| s.clone());
        match sink {
            Some(sink) => sink.deliver(event),
            None => {
                if let Ok(mut native) = self.native.lock() {
                    native.pending.push_back(event);
                }
                self.native_wakeup.notify_all();
            }
        }
    }

    /// Declare an attribute with an exact spelling, bypassing the backend's
    /// naming convention. Hook for name-translation coverage.
    pub fn declare_attribute(&self, object: Handle, name: &str, value: Value) {
        if let Ok(mut st) = self.state.lock() {
            if let Some(obj) = st.objects.get_mut(&object) {
                obj.attrs.insert(name.to_string(), value);
            }
        }
    }

    /// How many times the member-scan path ([`Bridge::member_names`]) ran.
    pub fn member_scan_count(&self) -> usize {
        self.member_scans.load(Ordering::SeqCst)
    }

    /// Number of threads currently holding attached backend context.
    pub fn attached_threads(&self) -> usize {
        self.threads
            .lock()
            .map(|t| t.values().filter(|&&n| n > 0).count())
            .unwrap_or(0)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Spell a camelCase member the way this backend declares it.
    fn key(&self, camel: &str) -> String {
        if self.pascal_members {
            crate::names::comify_name(camel).unwrap_or_else(|_| camel.to_string())
        } else {
            camel.to_string()
        }
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, MockState>> {
        self.state
            .lock()
            .map_err(|_| GlueError::Internal("mock state lock poisoned".to_string()))
    }

    fn alloc(&self, st: &mut MockState, interface: &str, attrs: HashMap<String, Value>) -> Handle {
        let handle = st.next_handle;
        st.next_handle += 1;
        st.objects.insert(
            handle,
            MockObject {
                interface: interface.to_string(),
                attrs,
            },
        );
        handle
    }

    fn ensure_root(&self, st: &mut MockState) -> Handle {
        if let Some(root) = st.root {
            return root;
        }
        let collector = self.alloc(st, "IPerformanceCollector", HashMap::new());
        let mut attrs = HashMap::new();
        attrs.insert(self.key("version"), Value::Str("7.0.0-mock".to_string()));
        attrs.insert(self.key("machines"), Value::Array(Vec::new()));
        attrs.insert(self.key("performanceCollector"), Value::Object(collector));
        let root = self.alloc(st, "IVirtualBox", attrs);
        st.root = Some(root);
        st.collector = Some(collector);
        root
    }

    fn add_machine_locked(&self, st: &mut MockState, name: &str) -> Handle {
        let root = self.ensure_root(st);
        let mut attrs = HashMap::new();
        attrs.insert(self.key("name"), Value::Str(name.to_string()));
        attrs.insert(self.key("id"), Value::Str(Uuid::new_v4().to_string()));
        attrs.insert(self.key("lockCount"), Value::Int(0));
        attrs.insert(self.key("writeLocked"), Value::Bool(false));
        let machine = self.alloc(st, "IMachine", attrs);

        let machines_key = self.key("machines");
        if let Some(Value::Array(machines)) = st
            .objects
            .get_mut(&root)
            .and_then(|o| o.attrs.get_mut(&machines_key))
        {
            machines.push(Value::Object(machine));
        }
        machine
    }

    fn object<'a>(&self, st: &'a MockState, handle: Handle) -> Result<&'a MockObject> {
        st.objects
            .get(&handle)
            .ok_or_else(|| GlueError::Transport(format!("stale object handle {}", handle)))
    }

    fn declared_methods(&self, interface: &str) -> Vec<String> {
        let camel: &[&str] = match interface {
            "IVirtualBox" => &["createAppliance"],
            "IAppliance" => &["read", "interpret", "importMachines"],
            "IMachine" => &["lockMachine"],
            "ISession" => &["unlockMachine"],
            "IPerformanceCollector" => &[
                "setupMetrics",
                "enableMetrics",
                "disableMetrics",
                "queryMetricsData",
            ],
            "IProgress" => &["waitForCompletion"],
            _ => &[],
        };
        camel.iter().map(|m| self.key(m)).collect()
    }

    fn new_progress(&self, st: &mut MockState, description: &str, result_code: i64) -> Handle {
        let mut attrs = HashMap::new();
        attrs.insert(self.key("completed"), Value::Bool(true));
        attrs.insert(self.key("resultCode"), Value::Int(result_code));
        attrs.insert(self.key("percent"), Value::Int(100));
        attrs.insert(
            self.key("description"),
            Value::Str(description.to_string()),
        );
        self.alloc(st, "IProgress", attrs)
    }

    fn metric_selected(names: &[Value], metric: &MockMetric) -> bool {
        if names.is_empty() {
            return true;
        }
        names
            .iter()
            .any(|n| matches!(n, Value::Str(s) if s == "*" || s == &metric.name))
    }

    fn query_metrics_data(&self, st: &MockState, names: &[Value]) -> Value {
        let selected: Vec<&MockMetric> = st
            .metrics
            .iter()
            .filter(|m| m.enabled && Self::metric_selected(names, m))
            .collect();

        let mut values = Vec::new();
        let mut names_out = Vec::new();
        let mut objects_out = Vec::new();
        let mut units = Vec::new();
        let mut scales = Vec::new();
        let mut sequence_numbers = Vec::new();
        let mut indices = Vec::new();
        let mut lengths = Vec::new();

        for (seq, metric) in selected.iter().enumerate() {
            indices.push(Value::Int(values.len() as i64));
            lengths.push(Value::Int(metric.values.len() as i64));
            values.extend(metric.values.iter().map(|v| Value::Int(*v)));
            names_out.push(Value::Str(metric.name.clone()));
            objects_out.push(Value::Str(metric.object.clone()));
            units.push(Value::Str(metric.unit.clone()));
            scales.push(Value::Int(metric.scale));
            sequence_numbers.push(Value::Int(seq as i64));
        }

        let mut arrays = vec![Value::Array(values)];
        if self.duplicate_query_inputs {
            // The COM transport echoes the input arrays back in the output.
            arrays.push(Value::Array(names_out.clone()));
            arrays.push(Value::Array(objects_out.clone()));
        }
        arrays.push(Value::Array(names_out));
        arrays.push(Value::Array(objects_out));
        arrays.push(Value::Array(units));
        arrays.push(Value::Array(scales));
        arrays.push(Value::Array(sequence_numbers));
        arrays.push(Value::Array(indices));
        arrays.push(Value::Array(lengths));
        Value::Array(arrays)
    }

    fn set_metrics_enabled(&self, st: &mut MockState, names: &[Value], enabled: bool) {
        for metric in st.metrics.iter_mut() {
            if Self::metric_selected(names, metric) {
                metric.enabled = enabled;
            }
        }
    }

    fn lock_machine(&self, st: &mut MockState, machine: Handle, args: &[Value]) -> Result<Value> {
        let session = args
            .first()
            .ok_or_else(|| GlueError::Argument("lockMachine needs a session".to_string()))?
            .as_object()?;
        let lock_type = args
            .get(1)
            .ok_or_else(|| GlueError::Argument("lockMachine needs a lock type".to_string()))?
            .as_i64()?;
        self.object(st, session)?;

        let lock_count_key = self.key("lockCount");
        let write_locked_key = self.key("writeLocked");
        {
            let obj = self.object(st, machine)?;
            let lock_count = obj.attrs.get(&lock_count_key).and_then(|v| v.as_i64().ok());
            let write_locked = obj
                .attrs
                .get(&write_locked_key)
                .and_then(|v| v.as_bool().ok());
            let (lock_count, write_locked) = match (lock_count, write_locked) {
                (Some(c), Some(w)) => (c, w),
                _ => {
                    return Err(GlueError::Transport(
                        "object is not a lockable machine".to_string(),
                    ))
                }
            };
            if lock_type == 2 && lock_count > 0 {
                return Err(GlueError::Transport(
                    "machine is already locked for a session".to_string(),
                ));
            }
            if write_locked {
                return Err(GlueError::Transport(
                    "machine is exclusively locked".to_string(),
                ));
            }
        }

        if let Some(obj) = st.objects.get_mut(&machine) {
            if let Some(Value::Int(count)) = obj.attrs.get_mut(&lock_count_key) {
                *count += 1;
            }
            if lock_type == 2 {
                obj.attrs.insert(write_locked_key, Value::Bool(true));
            }
        }
        let state_key = self.key("state");
        let machine_key = self.key("machine");
        if let Some(obj) = st.objects.get_mut(&session) {
            obj.attrs.insert(state_key, Value::Str("Locked".to_string()));
            obj.attrs.insert(machine_key, Value::Object(machine));
        }
        debug!(machine, session, lock_type, "Mock machine locked");
        Ok(Value::Null)
    }

    fn unlock_machine(&self, st: &mut MockState, session: Handle) -> Result<Value> {
        let state_key = self.key("state");
        let machine_key = self.key("machine");
        let machine = {
            let obj = self.object(st, session)?;
            match obj.attrs.get(&state_key) {
                Some(Value::Str(s)) if s == "Locked" => {}
                _ => {
                    return Err(GlueError::Transport(
                        "session is not locked".to_string(),
                    ))
                }
            }
            obj.attrs.get(&machine_key).and_then(|v| v.as_object().ok())
        };

        if let Some(machine) = machine {
            let lock_count_key = self.key("lockCount");
            let write_locked_key = self.key("writeLocked");
            if let Some(obj) = st.objects.get_mut(&machine) {
                if let Some(Value::Int(count)) = obj.attrs.get_mut(&lock_count_key) {
                    *count = (*count - 1).max(0);
                }
                obj.attrs.insert(write_locked_key, Value::Bool(false));
            }
        }
        if let Some(obj) = st.objects.get_mut(&session) {
            obj.attrs
                .insert(state_key, Value::Str("Unlocked".to_string()));
            obj.attrs.insert(machine_key, Value::Null);
        }
        debug!(session, "Mock session unlocked");
        Ok(Value::Null)
    }

    fn appliance_read(&self, st: &mut MockState, appliance: Handle, args: &[Value]) -> Result<Value> {
        let path = args
            .first()
            .ok_or_else(|| GlueError::Argument("read needs a file path".to_string()))?
            .as_str()?
            .to_string();
        if path.is_empty() {
            return Err(GlueError::Argument("empty appliance path".to_string()));
        }
        let result_code = if Path::new(&path).exists() {
            0
        } else {
            MOCK_E_FILE_ERROR
        };
        let path_key = self.key("path");
        if let Some(obj) = st.objects.get_mut(&appliance) {
            obj.attrs.insert(path_key, Value::Str(path.clone()));
        }
        let progress = self.new_progress(st, &format!("read {}", path), result_code);
        Ok(Value::Object(progress))
    }

    fn appliance_import(&self, st: &mut MockState, appliance: Handle) -> Result<Value> {
        let path_key = self.key("path");
        let path = self
            .object(st, appliance)?
            .attrs
            .get(&path_key)
            .and_then(|v| v.as_str().ok().map(str::to_string));
        let path = match path {
            Some(p) if !p.is_empty() => p,
            _ => {
                return Err(GlueError::Transport(
                    "appliance has not read a descriptor".to_string(),
                ))
            }
        };
        let name = format!("imported-{}", Uuid::new_v4());
        self.add_machine_locked(st, &name);
        let progress = self.new_progress(st, &format!("import {}", path), 0);
        Ok(Value::Object(progress))
    }
}

impl Default for MockBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge for MockBridge {
    fn connect(&self, params: &ConnectParams) -> Result<Handle> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(GlueError::Connection(format!(
                "connection refused by mock endpoint '{}'",
                params.url
            )));
        }
        let mut st = self.lock_state()?;
        Ok(self.ensure_root(&mut st))
    }

    fn disconnect(&self, root: Handle) -> Result<()> {
        let st = self.lock_state()?;
        self.object(&st, root)?;
        debug!(root, "Mock connection closed");
        Ok(())
    }

    fn create_session(&self, root: Handle) -> Result<Handle> {
        let mut st = self.lock_state()?;
        let obj = self.object(&st, root)?;
        if obj.interface != "IVirtualBox" {
            return Err(GlueError::Transport(
                "session objects are keyed to the root connection".to_string(),
            ));
        }
        let mut attrs = HashMap::new();
        attrs.insert(self.key("state"), Value::Str("Unlocked".to_string()));
        attrs.insert(self.key("machine"), Value::Null);
        Ok(self.alloc(&mut st, "ISession", attrs))
    }

    fn member_names(&self, object: Handle) -> Result<Vec<String>> {
        self.member_scans.fetch_add(1, Ordering::SeqCst);
        let st = self.lock_state()?;
        let obj = self.object(&st, object)?;
        let mut names: Vec<String> = obj.attrs.keys().cloned().collect();
        names.extend(self.declared_methods(&obj.interface));
        Ok(names)
    }

    fn get_attribute(&self, object: Handle, name: &str) -> Result<Value> {
        let st = self.lock_state()?;
        let obj = self.object(&st, object)?;
        obj.attrs.get(name).cloned().ok_or_else(|| {
            GlueError::Lookup(format!("no attribute '{}' on {}", name, obj.interface))
        })
    }

    fn set_attribute(&self, object: Handle, name: &str, value: Value) -> Result<()> {
        let mut st = self.lock_state()?;
        let obj = st
            .objects
            .get_mut(&object)
            .ok_or_else(|| GlueError::Transport(format!("stale object handle {}", object)))?;
        match obj.attrs.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(GlueError::Lookup(format!(
                "no attribute '{}' on {}",
                name, obj.interface
            ))),
        }
    }

    fn call(&self, object: Handle, method: &str, args: &[Value]) -> Result<Value> {
        let mut st = self.lock_state()?;
        let interface = self.object(&st, object)?.interface.clone();

        if !self.declared_methods(&interface).iter().any(|m| m == method) {
            // Getter-style access to a declared attribute.
            let getter_prefix = self.key("get");
            if let Some(rest) = method.strip_prefix(getter_prefix.as_str()) {
                let attr = self.key(&decapitalize(rest));
                if let Some(value) = self.object(&st, object)?.attrs.get(&attr) {
                    return Ok(value.clone());
                }
            }
            return Err(GlueError::Lookup(format!(
                "no method '{}' on {}",
                method, interface
            )));
        }

        match (interface.as_str(), decapitalize(method).as_str()) {
            ("IVirtualBox", "createAppliance") => {
                let mut attrs = HashMap::new();
                attrs.insert(self.key("path"), Value::Str(String::new()));
                Ok(Value::Object(self.alloc(&mut st, "IAppliance", attrs)))
            }
            ("IAppliance", "read") => self.appliance_read(&mut st, object, args),
            ("IAppliance", "interpret") => {
                let path_key = self.key("path");
                let has_path = self
                    .object(&st, object)?
                    .attrs
                    .get(&path_key)
                    .and_then(|v| v.as_str().ok())
                    .map(|p| !p.is_empty())
                    .unwrap_or(false);
                if has_path {
                    Ok(Value::Null)
                } else {
                    Err(GlueError::Transport(
                        "appliance has not read a descriptor".to_string(),
                    ))
                }
            }
            ("IAppliance", "importMachines") => self.appliance_import(&mut st, object),
            ("IMachine", "lockMachine") => self.lock_machine(&mut st, object, args),
            ("ISession", "unlockMachine") => self.unlock_machine(&mut st, object),
            ("IPerformanceCollector", "setupMetrics") => {
                let names = args.first().and_then(|v| v.as_array().ok()).unwrap_or(&[]);
                self.set_metrics_enabled(&mut st, names, true);
                Ok(Value::Null)
            }
            ("IPerformanceCollector", "enableMetrics") => {
                let names = args.first().and_then(|v| v.as_array().ok()).unwrap_or(&[]);
                self.set_metrics_enabled(&mut st, names, true);
                Ok(Value::Null)
            }
            ("IPerformanceCollector", "disableMetrics") => {
                let names = args.first().and_then(|v| v.as_array().ok()).unwrap_or(&[]);
                self.set_metrics_enabled(&mut st, names, false);
                Ok(Value::Null)
            }
            ("IPerformanceCollector", "queryMetricsData") => {
                let names = args.first().and_then(|v| v.as_array().ok()).unwrap_or(&[]);
                Ok(self.query_metrics_data(&st, names))
            }
            ("IProgress", "waitForCompletion") => Ok(Value::Null),
            _ => Err(GlueError::Lookup(format!(
                "no method '{}' on {}",
                method, interface
            ))),
        }
    }

    fn query_interface(&self, object: Handle, interface: &str) -> Result<Handle> {
        let st = self.lock_state()?;
        let obj = self.object(&st, object)?;
        if obj.interface == interface || interface == "IUnknown" {
            Ok(object)
        } else {
            Err(GlueError::Lookup(format!(
                "{} does not implement {}",
                obj.interface, interface
            )))
        }
    }

    fn attach_thread(&self) -> Result<()> {
        let mut threads = self
            .threads
            .lock()
            .map_err(|_| GlueError::Internal("thread table lock poisoned".to_string()))?;
        *threads.entry(thread::current().id()).or_insert(0) += 1;
        Ok(())
    }

    fn detach_thread(&self) -> Result<()> {
        let mut threads = self
            .threads
            .lock()
            .map_err(|_| GlueError::Internal("thread table lock poisoned".to_string()))?;
        match threads.get_mut(&thread::current().id()) {
            Some(count) if *count > 0 => {
                *count -= 1;
                Ok(())
            }
            _ => Err(GlueError::Internal(
                "thread context was never attached".to_string(),
            )),
        }
    }

    fn set_event_sink(&self, sink: Arc<dyn EventSink>) {
        if let Ok(mut slot) = self.sink.lock() {
            *slot = Some(sink);
        }
    }

    fn wait_native_events(&self, timeout_ms: i64) -> Result<WaitResult> {
        let deadline = if timeout_ms < 0 {
            None
        } else {
            Some(Instant::now() + Duration::from_millis(timeout_ms as u64))
        };
        let mut native = self
            .native
            .lock()
            .map_err(|_| GlueError::Internal("native event lock poisoned".to_string()))?;
        let mut rc = loop {
            if native.interrupted {
                break WaitResult::Interrupted;
            }
            if !native.pending.is_empty() {
                native.pending.clear();
                break WaitResult::Processed;
            }
            native = match deadline {
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        break WaitResult::Interrupted;
                    }
                    self.native_wakeup
                        .wait_timeout(native, d - now)
                        .map_err(|_| {
                            GlueError::Internal("native event lock poisoned".to_string())
                        })?
                        .0
                }
                None => self
                    .native_wakeup
                    .wait(native)
                    .map_err(|_| GlueError::Internal("native event lock poisoned".to_string()))?,
            };
        };
        if native.interrupted {
            native.interrupted = false;
            rc = WaitResult::Interrupted;
        }
        Ok(rc)
    }

    fn interrupt_native_wait(&self) -> bool {
        match self.native.lock() {
            Ok(mut native) => {
                native.interrupted = true;
                drop(native);
                self.native_wakeup.notify_all();
                true
            }
            Err(_) => false,
        }
    }
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let mut out = String::with_capacity(name.len());
            out.extend(first.to_lowercase());
            out.push_str(chars.as_str());
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_builds_a_root_with_collector() {
        let bridge = MockBridge::new();
        let root = bridge.connect(&ConnectParams::default()).unwrap();
        let collector = bridge.get_attribute(root, "performanceCollector").unwrap();
        assert!(matches!(collector, Value::Object(_)));
        // Reconnecting yields the same root.
        assert_eq!(bridge.connect(&ConnectParams::default()).unwrap(), root);
    }

    #[test]
    fn com_mode_declares_pascal_case_members() {
        let bridge = MockBridge::com();
        let root = bridge.connect(&ConnectParams::default()).unwrap();
        assert!(bridge.get_attribute(root, "version").is_err());
        assert_eq!(
            bridge.get_attribute(root, "Version").unwrap(),
            Value::Str("7.0.0-mock".to_string())
        );
    }

    #[test]
    fn lock_rules_enforced() {
        let bridge = MockBridge::new();
        let machine = bridge.add_machine("locky");
        let root = bridge.connect(&ConnectParams::default()).unwrap();
        let s1 = bridge.create_session(root).unwrap();
        let s2 = bridge.create_session(root).unwrap();

        // Shared then exclusive: second must fail.
        bridge
            .call(machine, "lockMachine", &[Value::Object(s1), Value::Int(1)])
            .unwrap();
        let err = bridge
            .call(machine, "lockMachine", &[Value::Object(s2), Value::Int(2)])
            .unwrap_err();
        assert!(matches!(err, GlueError::Transport(_)));

        bridge.call(s1, "unlockMachine", &[]).unwrap();
        // Unlocking twice fails.
        assert!(bridge.call(s1, "unlockMachine", &[]).is_err());
    }

    #[test]
    fn getter_methods_reach_attributes() {
        let bridge = MockBridge::new();
        bridge.add_machine("a");
        let root = bridge.connect(&ConnectParams::default()).unwrap();
        let machines = bridge.call(root, "getMachines", &[]).unwrap();
        assert_eq!(machines.as_array().unwrap().len(), 1);
    }

    #[test]
    fn appliance_pipeline_reports_file_errors_via_progress() {
        let bridge = MockBridge::new();
        let root = bridge.connect(&ConnectParams::default()).unwrap();
        let appliance = bridge
            .call(root, "createAppliance", &[])
            .unwrap()
            .as_object()
            .unwrap();

        let fixture = tempfile::NamedTempFile::new().unwrap();
        let path = fixture.path().to_str().unwrap().to_string();
        let progress = bridge
            .call(appliance, "read", &[Value::Str(path)])
            .unwrap()
            .as_object()
            .unwrap();
        assert_eq!(
            bridge.get_attribute(progress, "resultCode").unwrap(),
            Value::Int(0)
        );

        let progress = bridge
            .call(appliance, "read", &[Value::Str("/absent.ova".to_string())])
            .unwrap()
            .as_object()
            .unwrap();
        assert_eq!(
            bridge.get_attribute(progress, "resultCode").unwrap(),
            Value::Int(MOCK_E_FILE_ERROR)
        );
    }

    #[test]
    fn detach_without_attach_fails() {
        let bridge = MockBridge::new();
        assert!(bridge.detach_thread().is_err());
        bridge.attach_thread().unwrap();
        assert!(bridge.detach_thread().is_ok());
    }
}
