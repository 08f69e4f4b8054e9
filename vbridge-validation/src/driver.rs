//! Appliance import scenarios.
//!
//! Each fixture is imported twice: once verbatim from its original location,
//! then again from a descriptor unpacked into a scratch subdirectory. Any
//! step failure is reported against the current sub-test and the run moves
//! on to the next fixture.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use vbridge_glue::{Manager, ObjectRef, Value};

use crate::progress::ProgressWrapper;
use crate::reporter::Reporter;

const STEP_TIMEOUT_MS: i64 = 60_000;

pub struct ApplianceDriver<'a> {
    manager: &'a Manager,
    scratch: PathBuf,
}

impl<'a> ApplianceDriver<'a> {
    pub fn new(manager: &'a Manager, scratch: &Path) -> Self {
        ApplianceDriver {
            manager,
            scratch: scratch.to_path_buf(),
        }
    }

    /// Run both import variants for every fixture.
    pub fn run(&self, reporter: &mut Reporter, fixtures: &[PathBuf]) {
        for fixture in fixtures {
            let name = fixture
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| fixture.display().to_string());
            reporter.test_start(&format!("appliance {}", name));

            reporter.test_start("import verbatim");
            if let Err(e) = self.import(fixture) {
                reporter.error(&format!("{:#}", e));
            }
            reporter.test_done();

            reporter.test_start("import unpacked");
            match self.unpack(fixture) {
                Ok(descriptor) => {
                    if let Err(e) = self.import(&descriptor) {
                        reporter.error(&format!("{:#}", e));
                    }
                }
                Err(e) => reporter.error(&format!("{:#}", e)),
            }
            reporter.test_done();

            reporter.test_done();
        }
    }

    fn require_root(&self) -> Result<&ObjectRef> {
        self.manager
            .root()
            .ok_or_else(|| anyhow!("no root connection established"))
    }

    fn progress_of(&self, source: &ObjectRef, result: Value, action: &str) -> Result<ProgressWrapper> {
        Ok(ProgressWrapper::new(source.sibling(result.as_object()?), action))
    }

    /// createAppliance, read the descriptor, interpret it, import its
    /// machines. A non-zero completion code on either progress object is a
    /// step failure.
    fn import(&self, descriptor: &Path) -> Result<()> {
        let path = descriptor
            .to_str()
            .ok_or_else(|| anyhow!("fixture path is not valid UTF-8: {}", descriptor.display()))?;
        info!(%path, "Importing appliance");

        let root = self.require_root()?;
        let appliance = root.sibling(root.call("createAppliance", &[])?.as_object()?);

        let read = self.progress_of(
            &appliance,
            appliance.call("read", &[Value::Str(path.to_string())])?,
            "read",
        )?;
        read.wait_for_completion(STEP_TIMEOUT_MS)?;
        if !read.log_result()? {
            return Err(anyhow!("reading '{}' failed", path));
        }

        appliance.call("interpret", &[])?;

        let import = self.progress_of(
            &appliance,
            appliance.call("importMachines", &[])?,
            "importMachines",
        )?;
        import.wait_for_completion(STEP_TIMEOUT_MS)?;
        if !import.log_result()? {
            return Err(anyhow!("importing '{}' failed", path));
        }
        Ok(())
    }

    /// Place the fixture's descriptor into a scratch subdirectory, the way
    /// an unpacked archive would lay it out. Suite fixtures are bare
    /// descriptors, so unpacking amounts to copying into that layout.
    fn unpack(&self, fixture: &Path) -> Result<PathBuf> {
        let stem = fixture
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("fixture has no file name: {}", fixture.display()))?;
        let dir = self.scratch.join(&stem);
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating scratch dir {}", dir.display()))?;
        let descriptor = dir.join(format!("{}.ovf", stem));
        fs::copy(fixture, &descriptor)
            .with_context(|| format!("unpacking {}", fixture.display()))?;
        Ok(descriptor)
    }
}
