//! Module model and bytecode for the instrumentable stack machine
//!
//! This crate provides the instruction set, the module object model, the
//! on-disk binary and symbol-file formats, the method editing interface used
//! by the instrumentation rewriter and an operand-stack depth analysis.
//!
//! # Features
//!
//! - Stack-based opcode set with typed locals, arguments and fields
//! - Binary serialization (`IVMB`) plus JSON symbol files
//! - Branch-preserving instruction insertion via [`MethodEditor`]
//! - Stack depth analysis for verifying rewritten bodies
//!
//! # Example
//!
//! ```
//! use bytecode_system::{decode_module, encode_module, MethodDef, Module, Opcode};
//! use core_types::ValueType;
//!
//! let mut module = Module::new("Calc");
//! let mut add = MethodDef::new("Calc", "add")
//!     .with_params(vec![ValueType::Int32, ValueType::Int32])
//!     .returning(ValueType::Int32);
//! add.emit(Opcode::LoadArg(0));
//! add.emit(Opcode::LoadArg(1));
//! add.emit(Opcode::Add);
//! add.emit(Opcode::Return);
//! module.add_method(add);
//!
//! let bytes = encode_module(&module);
//! let restored = decode_module(&bytes).unwrap();
//! assert_eq!(restored, module);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod editor;
pub mod error;
pub mod files;
pub mod instruction;
pub mod module;
pub mod opcode;
pub mod stack;
pub mod symbols;

// Re-export main types at crate root
pub use codec::{decode_module, encode_module};
pub use editor::{MethodEditor, MethodId};
pub use error::{ModuleError, StackError};
pub use files::{write_atomically, ModuleFiles, SYMBOL_EXTENSION};
pub use instruction::{resolve_location, Instruction};
pub use module::{
    ArgSlot, BuildInfo, ClassDef, DebugInfo, FieldDef, MethodDef, Module, SiteRecord,
};
pub use opcode::{FieldRef, MethodRef, Opcode};
pub use stack::{call_effect_of, stack_depths, SignatureResolver};
pub use symbols::{MethodSymbols, SymbolFile};
