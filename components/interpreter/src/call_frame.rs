//! Call frame for method invocations

use bytecode_system::{resolve_location, MethodDef};
use core_types::{StackFrame, Value};

use crate::error::RuntimeError;

/// Activation record of one method invocation
#[derive(Debug, Clone)]
pub struct CallFrame<'p> {
    /// Method being executed
    pub method: &'p MethodDef,
    /// Index of the next instruction
    pub instruction_pointer: usize,
    /// Argument slots, receiver first for instance methods
    pub args: Vec<Value>,
    /// Local variable slots
    pub locals: Vec<Value>,
    /// Operand stack
    pub stack: Vec<Value>,
}

impl<'p> CallFrame<'p> {
    /// Create a frame with locals set to their type's default value
    pub fn new(method: &'p MethodDef, args: Vec<Value>) -> Self {
        Self {
            method,
            instruction_pointer: 0,
            args,
            locals: method.locals.iter().map(|t| t.default_value()).collect(),
            stack: Vec::with_capacity(8),
        }
    }

    /// Index of the instruction currently executing
    pub fn current_index(&self) -> usize {
        self.instruction_pointer.saturating_sub(1)
    }

    /// Pop the operand stack
    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or_else(|| RuntimeError::StackUnderflow {
            method: self.method.qualified_name(),
            index: self.current_index(),
        })
    }

    /// Pop `n` values, returned in push order
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, RuntimeError> {
        if self.stack.len() < n {
            return Err(RuntimeError::StackUnderflow {
                method: self.method.qualified_name(),
                index: self.current_index(),
            });
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    /// Push onto the operand stack
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Read a local
    pub fn local(&self, index: u16) -> Result<Value, RuntimeError> {
        self.locals
            .get(index as usize)
            .cloned()
            .ok_or_else(|| self.invalid_slot("local", index))
    }

    /// Write a local
    pub fn set_local(&mut self, index: u16, value: Value) -> Result<(), RuntimeError> {
        let err = self.invalid_slot("local", index);
        let slot = self.locals.get_mut(index as usize).ok_or(err)?;
        *slot = value;
        Ok(())
    }

    /// Read an argument
    pub fn arg(&self, index: u16) -> Result<Value, RuntimeError> {
        self.args
            .get(index as usize)
            .cloned()
            .ok_or_else(|| self.invalid_slot("argument", index))
    }

    /// Write an argument
    pub fn set_arg(&mut self, index: u16, value: Value) -> Result<(), RuntimeError> {
        let err = self.invalid_slot("argument", index);
        let slot = self.args.get_mut(index as usize).ok_or(err)?;
        *slot = value;
        Ok(())
    }

    /// Stack frame description for error traces
    pub fn describe(&self) -> StackFrame {
        let index = self.current_index();
        StackFrame {
            method: self.method.qualified_name(),
            instruction: index,
            location: resolve_location(self.method.instructions(), index).cloned(),
        }
    }

    fn invalid_slot(&self, kind: &'static str, index: u16) -> RuntimeError {
        RuntimeError::InvalidSlot {
            kind,
            index,
            method: self.method.qualified_name(),
        }
    }
}
