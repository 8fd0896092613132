//! Test execution seam

use interpreter::ValueHook;

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    /// The test completed normally
    Pass,
    /// The test failed with the given detail
    Fail(String),
    /// The run broke down for reasons unrelated to the program under test
    Inconclusive(String),
}

impl TestResult {
    /// Check if the result is a pass
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass)
    }

    /// Check if the result is a failure
    pub fn is_fail(&self) -> bool {
        matches!(self, TestResult::Fail(_))
    }

    /// Check if the run was inconclusive
    pub fn is_inconclusive(&self) -> bool {
        matches!(self, TestResult::Inconclusive(_))
    }
}

/// Runs named tests against instrumented code.
///
/// The driver brackets every call with the recorder's test bookkeeping, so
/// an executor only has to route hook calls to `hook`.
pub trait TestExecutor {
    /// Test identifiers in suite order
    fn test_ids(&self) -> Vec<String>;

    /// Run one test to completion
    fn run_test(&mut self, test: &str, hook: &mut dyn ValueHook) -> TestResult;
}
