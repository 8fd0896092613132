//! Test executor over interpreted modules

use bytecode_system::{MethodRef, Module};
use interpreter::{RuntimeError, ValueHook, VM};
use recorder::SiteTable;
use tracing::debug;

use crate::error::LocalizeError;
use crate::executor::{TestExecutor, TestResult};

/// Attribute marking a test method
pub const TEST_ATTRIBUTE: &str = "Test";

/// Runs the `Test` methods of one module on the interpreter.
///
/// A test is a static, parameterless method with a body, carrying the
/// [`TEST_ATTRIBUTE`] attribute. Static fields are reset before every test.
#[derive(Debug)]
pub struct ModuleTestExecutor {
    vm: VM,
    tests: Vec<MethodRef>,
}

impl ModuleTestExecutor {
    /// Link `modules` and collect the tests declared in `test_module`
    pub fn new(modules: Vec<Module>, test_module: &str) -> Result<Self, LocalizeError> {
        let vm = VM::load(modules)?;
        let module = vm
            .program()
            .module(test_module)
            .ok_or_else(|| LocalizeError::UnknownTestModule(test_module.to_string()))?;
        let tests = module
            .methods
            .iter()
            .filter(|m| {
                m.is_static
                    && m.params.is_empty()
                    && m.body.is_some()
                    && m.has_attribute(TEST_ATTRIBUTE)
            })
            .map(|m| m.method_ref())
            .collect();
        Ok(Self { vm, tests })
    }

    /// Abort a test after `limit` instructions
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.vm = self.vm.with_step_limit(limit);
        self
    }

    /// Sites of every loaded module
    pub fn sites(&self) -> SiteTable {
        SiteTable::from_modules(self.vm.program().modules())
    }
}

impl TestExecutor for ModuleTestExecutor {
    fn test_ids(&self) -> Vec<String> {
        self.tests.iter().map(|t| t.to_string()).collect()
    }

    fn run_test(&mut self, test: &str, hook: &mut dyn ValueHook) -> TestResult {
        let Some(method) = self.tests.iter().find(|t| t.to_string() == test).cloned() else {
            return TestResult::Inconclusive(format!("unknown test {}", test));
        };
        self.vm.reset();
        let result = self.vm.invoke(&method, Vec::new(), hook);
        debug!(test, steps = self.vm.last_steps(), "test finished");
        match result {
            Ok(_) => TestResult::Pass,
            Err(e) if e.is_inconclusive() => TestResult::Inconclusive(e.to_string()),
            Err(RuntimeError::Thrown { message, .. }) => TestResult::Fail(message),
            Err(e) => TestResult::Fail(e.to_string()),
        }
    }
}
