//! Runtime errors raised while executing module code.

use core_types::{StackFrame, ValueError, ValueType};
use thiserror::Error;

/// Error produced by a value hook
pub type HookFault = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Execution failure
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The program raised an exception with `Throw`
    #[error("uncaught exception: {message}")]
    Thrown {
        /// Rendering of the thrown value
        message: String,
        /// Call stack at the throw, innermost first
        trace: Vec<StackFrame>,
    },
    /// The step budget ran out
    #[error("step limit of {limit} instructions exhausted")]
    StepLimit {
        /// Configured budget
        limit: u64,
    },
    /// Call depth exceeded
    #[error("call stack overflow at depth {depth}")]
    StackOverflow {
        /// Frames on the stack
        depth: usize,
    },
    /// The value hook reported a failure
    #[error("value hook failed at site {site}: {source}")]
    Hook {
        /// Site the hook was invoked for
        site: u32,
        /// Hook error
        #[source]
        source: HookFault,
    },
    /// The value hook returned a value of the wrong type
    #[error("value hook returned {found} at site {site}, expected {expected}")]
    HookResultType {
        /// Site the hook was invoked for
        site: u32,
        /// Declared type of the site
        expected: ValueType,
        /// Description of the returned value
        found: String,
    },
    /// Call to a method no loaded module declares
    #[error("unknown method {0}")]
    UnknownMethod(String),
    /// Reference to a class no loaded module declares
    #[error("unknown class {0}")]
    UnknownClass(String),
    /// Reference to an undeclared field
    #[error("unknown field {0}")]
    UnknownField(String),
    /// Two modules declare the same method
    #[error("method {0} is declared more than once")]
    DuplicateMethod(String),
    /// Call to a method without a body
    #[error("method {0} has no body")]
    NoBody(String),
    /// Wrong number of arguments passed to a method
    #[error("{method} expects {expected} arguments, got {found}")]
    ArgumentCount {
        /// `Class::method`
        method: String,
        /// Declared argument count
        expected: usize,
        /// Supplied argument count
        found: usize,
    },
    /// Local or argument index outside the declared slots
    #[error("invalid {kind} slot {index} in {method}")]
    InvalidSlot {
        /// `local` or `argument`
        kind: &'static str,
        /// Slot index
        index: u16,
        /// `Class::method`
        method: String,
    },
    /// Pop from an empty operand stack
    #[error("operand stack underflow at instruction {index} in {method}")]
    StackUnderflow {
        /// `Class::method`
        method: String,
        /// Instruction index
        index: usize,
    },
    /// Control ran past the last instruction
    #[error("control fell off the end of {0}")]
    FellOffEnd(String),
    /// Operand of the wrong type
    #[error("type mismatch in {op}: {found}")]
    TypeMismatch {
        /// Operation name
        op: &'static str,
        /// Description of the offending operands
        found: String,
    },
    /// Field access through a null reference
    #[error("null reference accessing {0}")]
    NullReference(String),
    /// Integer division by zero
    #[error("division by zero")]
    DivideByZero,
    /// Opcode this interpreter does not execute
    #[error("unsupported opcode {0}")]
    Unsupported(String),
    /// Boxing or unboxing failure
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl RuntimeError {
    /// Whether the failure says nothing about the program's behaviour:
    /// budget exhaustion, stack overflow and hook failures.
    pub fn is_inconclusive(&self) -> bool {
        matches!(
            self,
            RuntimeError::StepLimit { .. }
                | RuntimeError::StackOverflow { .. }
                | RuntimeError::Hook { .. }
                | RuntimeError::HookResultType { .. }
        )
    }

    pub(crate) fn mismatch(op: &'static str, found: String) -> Self {
        RuntimeError::TypeMismatch { op, found }
    }
}
