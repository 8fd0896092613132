//! Virtual Machine for bytecode execution
//!
//! Main entry point for executing module code.

use bytecode_system::{FieldRef, MethodRef, Module};
use core_types::Value;
use std::collections::HashMap;

use crate::dispatch::{Dispatcher, DEFAULT_MAX_DEPTH};
use crate::error::RuntimeError;
use crate::hook::ValueHook;
use crate::program::Program;

/// Virtual Machine for executing linked modules
///
/// The VM owns the linked program and the static field storage. Static
/// fields persist across invocations until [`VM::reset`].
#[derive(Debug)]
pub struct VM {
    program: Program,
    statics: HashMap<FieldRef, Value>,
    step_limit: Option<u64>,
    max_depth: usize,
    steps: u64,
}

impl VM {
    /// Create a VM over already linked modules
    pub fn new(program: Program) -> Self {
        Self {
            program,
            statics: HashMap::new(),
            step_limit: None,
            max_depth: DEFAULT_MAX_DEPTH,
            steps: 0,
        }
    }

    /// Link `modules` and create a VM over them
    pub fn load(modules: Vec<Module>) -> Result<Self, RuntimeError> {
        Ok(Self::new(Program::new(modules)?))
    }

    /// Abort every invocation after `limit` executed instructions
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Limit nested calls
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// The linked program
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Instructions executed by the last invocation
    pub fn last_steps(&self) -> u64 {
        self.steps
    }

    /// Current value of a static field, if it was ever stored
    pub fn static_field(&self, field: &FieldRef) -> Option<&Value> {
        self.statics.get(field)
    }

    /// Forget all static field values
    pub fn reset(&mut self) {
        self.statics.clear();
    }

    /// Invoke `method` with `args`, routing `CallHook` to `hook`.
    ///
    /// Returns the method's return value, `None` for void methods.
    pub fn invoke(
        &mut self,
        method: &MethodRef,
        args: Vec<Value>,
        hook: &mut dyn ValueHook,
    ) -> Result<Option<Value>, RuntimeError> {
        let target = self.program.method(method)?;
        let mut dispatcher = Dispatcher::new(&self.program, &mut self.statics, hook)
            .with_step_limit(self.step_limit)
            .with_max_depth(self.max_depth);
        let result = dispatcher.execute(target, args);
        self.steps = dispatcher.steps();
        result
    }
}
