//! Bytecode interpreter for instrumentable modules
//!
//! This crate provides a stack virtual machine with:
//! - Per-frame operand stacks, typed locals and arguments
//! - Heap objects with instance fields and per-class static fields
//! - Calls resolved across all linked modules
//! - A [`ValueHook`] receiving every instrumented value
//! - A step budget that aborts runaway executions
//!
//! # Example
//!
//! ```
//! use bytecode_system::{MethodDef, MethodRef, Module, Opcode};
//! use core_types::{Value, ValueType};
//! use interpreter::{PassThrough, VM};
//!
//! let mut module = Module::new("Calc");
//! let mut answer = MethodDef::new("Calc", "answer").returning(ValueType::Int32);
//! answer.emit(Opcode::LoadInt32(40));
//! answer.emit(Opcode::LoadInt32(2));
//! answer.emit(Opcode::Add);
//! answer.emit(Opcode::Return);
//! module.add_method(answer);
//!
//! let mut vm = VM::load(vec![module]).unwrap();
//! let result = vm
//!     .invoke(&MethodRef::new("Calc", "answer"), vec![], &mut PassThrough)
//!     .unwrap();
//! assert_eq!(result, Some(Value::Int32(42)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call_frame;
pub mod dispatch;
pub mod error;
pub mod hook;
pub mod program;
pub mod vm;

// Re-export main types at crate root
pub use call_frame::CallFrame;
pub use dispatch::{Dispatcher, DEFAULT_MAX_DEPTH};
pub use error::{HookFault, RuntimeError};
pub use hook::{HookSite, PassThrough, ValueHook};
pub use program::Program;
pub use vm::VM;
