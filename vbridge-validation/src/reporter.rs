//! Sub-test reporting.
//!
//! Scenarios are reported as a flat sequence of named sub-tests. A step
//! failure fails its sub-test and the run, but never stops it; the driver
//! moves on to the next scenario and the summary carries the aggregate.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

/// Outcome of one completed sub-test.
#[derive(Debug, Clone, Serialize)]
pub struct TestRecord {
    pub name: String,
    pub passed: bool,
    pub duration_ms: u64,
}

/// Aggregate run outcome, serialized at the end of the run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub started_at: DateTime<Utc>,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub duration_ms: u64,
    pub tests: Vec<TestRecord>,
}

struct OpenTest {
    name: String,
    started: Instant,
    failed: bool,
}

/// Collects sub-test outcomes over a validation run.
pub struct Reporter {
    started_at: DateTime<Utc>,
    started: Instant,
    errors: usize,
    open: Vec<OpenTest>,
    finished: Vec<TestRecord>,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter {
            started_at: Utc::now(),
            started: Instant::now(),
            errors: 0,
            open: Vec::new(),
            finished: Vec::new(),
        }
    }

    /// Begin a named sub-test. Sub-tests nest; a failure in a nested test
    /// also fails its enclosing tests.
    pub fn test_start(&mut self, name: &str) {
        info!(test = name, "Sub-test started");
        self.open.push(OpenTest {
            name: name.to_string(),
            started: Instant::now(),
            failed: false,
        });
    }

    /// Record an error against the innermost open sub-test (or the run
    /// itself when none is open) and keep going.
    pub fn error(&mut self, message: &str) {
        self.errors += 1;
        match self.open.last_mut() {
            Some(test) => {
                error!(test = %test.name, "{}", message);
                for test in self.open.iter_mut() {
                    test.failed = true;
                }
            }
            None => error!("{}", message),
        }
    }

    /// Finish the innermost open sub-test.
    pub fn test_done(&mut self) {
        let Some(test) = self.open.pop() else {
            self.error("test_done without a matching test_start");
            return;
        };
        let duration_ms = test.started.elapsed().as_millis() as u64;
        if test.failed {
            error!(test = %test.name, duration_ms, "Sub-test FAILED");
        } else {
            info!(test = %test.name, duration_ms, "Sub-test passed");
        }
        self.finished.push(TestRecord {
            name: test.name,
            passed: !test.failed,
            duration_ms,
        });
    }

    pub fn all_passed(&self) -> bool {
        self.errors == 0 && self.finished.iter().all(|t| t.passed)
    }

    pub fn summary(&self) -> Summary {
        let passed = self.finished.iter().filter(|t| t.passed).count();
        Summary {
            started_at: self.started_at,
            passed,
            failed: self.finished.len() - passed,
            errors: self.errors,
            duration_ms: self.started.elapsed().as_millis() as u64,
            tests: self.finished.clone(),
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passing_tests_count_as_passed() {
        let mut reporter = Reporter::new();
        reporter.test_start("alpha");
        reporter.test_done();
        reporter.test_start("beta");
        reporter.test_done();

        assert!(reporter.all_passed());
        let summary = reporter.summary();
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.errors, 0);
    }

    #[test]
    fn errors_fail_the_enclosing_tests() {
        let mut reporter = Reporter::new();
        reporter.test_start("outer");
        reporter.test_start("inner");
        reporter.error("step exploded");
        reporter.test_done();
        reporter.test_done();

        assert!(!reporter.all_passed());
        let summary = reporter.summary();
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.errors, 1);
        assert!(summary.tests.iter().all(|t| !t.passed));
    }

    #[test]
    fn failures_do_not_leak_into_later_tests() {
        let mut reporter = Reporter::new();
        reporter.test_start("bad");
        reporter.error("nope");
        reporter.test_done();
        reporter.test_start("good");
        reporter.test_done();

        let summary = reporter.summary();
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn summary_serializes_to_json() {
        let mut reporter = Reporter::new();
        reporter.test_start("alpha");
        reporter.test_done();
        let json = serde_json::to_string(&reporter.summary()).unwrap();
        assert!(json.contains("\"passed\":1"));
        assert!(json.contains("\"alpha\""));
    }

    #[test]
    fn unbalanced_test_done_is_an_error() {
        let mut reporter = Reporter::new();
        reporter.test_done();
        assert!(!reporter.all_passed());
        assert_eq!(reporter.summary().errors, 1);
    }
}
