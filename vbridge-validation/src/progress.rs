//! Wrapper around a platform progress object.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use tracing::{error, info};

use vbridge_glue::{ObjectRef, Value};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Tracks a long-running platform operation through its progress object.
pub struct ProgressWrapper {
    progress: ObjectRef,
    action: String,
}

impl ProgressWrapper {
    pub fn new(progress: ObjectRef, action: &str) -> Self {
        ProgressWrapper {
            progress,
            action: action.to_string(),
        }
    }

    /// Block until the operation completes or the timeout elapses.
    /// Negative means wait forever.
    pub fn wait_for_completion(&self, timeout_ms: i64) -> Result<()> {
        self.progress
            .call("waitForCompletion", &[Value::Int(timeout_ms)])?;
        let deadline = if timeout_ms < 0 {
            None
        } else {
            Some(Instant::now() + Duration::from_millis(timeout_ms as u64))
        };
        while !self.progress.get("completed")?.as_bool()? {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(anyhow!("'{}' timed out after {}ms", self.action, timeout_ms));
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
        Ok(())
    }

    /// The operation's HRESULT-style completion code; 0 is success.
    pub fn result_code(&self) -> Result<i64> {
        Ok(self.progress.get("resultCode")?.as_i64()?)
    }

    /// Log the outcome and report whether the operation succeeded.
    pub fn log_result(&self) -> Result<bool> {
        let code = self.result_code()?;
        let description = self
            .progress
            .get("description")
            .ok()
            .and_then(|v| v.as_str().map(str::to_string).ok())
            .unwrap_or_default();
        if code == 0 {
            info!(action = %self.action, %description, "Operation succeeded");
            Ok(true)
        } else {
            error!(
                action = %self.action,
                %description,
                result_code = format!("{:#x}", code),
                "Operation failed"
            );
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use vbridge_glue::mock::MockBridge;
    use vbridge_glue::{Bridge, ConnectParams, HostOs, Manager, Style};

    fn manager() -> Manager {
        let bridge = Arc::new(MockBridge::new()) as Arc<dyn Bridge>;
        Manager::with_host(Some(Style::Xpcom), ConnectParams::default(), bridge, HostOs::Unix)
            .unwrap()
    }

    fn read_appliance(mgr: &Manager, path: &str) -> ProgressWrapper {
        let root = mgr.root().unwrap();
        let appliance = root.sibling(root.call("createAppliance", &[]).unwrap().as_object().unwrap());
        let progress = appliance
            .call("read", &[Value::Str(path.to_string())])
            .unwrap()
            .as_object()
            .unwrap();
        ProgressWrapper::new(appliance.sibling(progress), "read")
    }

    #[test]
    fn successful_read_reports_zero_result_code() {
        let mgr = manager();
        let mut fixture = tempfile::NamedTempFile::new().unwrap();
        writeln!(fixture, "<Envelope/>").unwrap();
        let progress = read_appliance(&mgr, fixture.path().to_str().unwrap());
        progress.wait_for_completion(-1).unwrap();
        assert_eq!(progress.result_code().unwrap(), 0);
        assert!(progress.log_result().unwrap());
    }

    #[test]
    fn missing_file_reports_a_failure_code() {
        let mgr = manager();
        let progress = read_appliance(&mgr, "/no/such/fixture.ova");
        progress.wait_for_completion(5000).unwrap();
        assert_ne!(progress.result_code().unwrap(), 0);
        assert!(!progress.log_result().unwrap());
    }
}
