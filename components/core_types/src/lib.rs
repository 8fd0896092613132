//! Core value types and source locations.
//!
//! This crate provides the foundational types shared by the module model,
//! the interpreter, the value recorder and the search driver.
//!
//! # Overview
//!
//! - [`Value`] - Uniform runtime value representation
//! - [`ValueType`] - Declared static types
//! - [`SourceLocation`] - Debug-symbol span of an instruction
//! - [`StackFrame`] - Interpreter call stack frame
//!
//! # Examples
//!
//! ```
//! use core_types::{Value, ValueType};
//!
//! let v = Value::Int32(42);
//! assert_eq!(v.value_type(), Some(ValueType::Int32));
//! assert!(v.is_truthy());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod source;
mod value;

pub use error::ValueError;
pub use source::{SourceLocation, StackFrame, HIDDEN_LINE};
pub use value::{ObjectData, ObjectRef, Value, ValueType};
