//! Bytecode instrumentation for value-mapping fault localization
//!
//! This crate rewrites compiled modules so that every value read from a
//! local, an argument or a field flows through a runtime hook:
//! - Site classification over the full opcode set
//! - Branch-preserving insertion of stack-neutral hook sequences
//! - A fingerprint stamp that makes rewriting idempotent
//! - A content-addressed backup store used to restore stale modules
//!
//! # Example
//!
//! ```
//! use bytecode_system::{MethodDef, Module, Opcode};
//! use core_types::{SourceLocation, ValueType};
//! use instrumenter::{instrument, SiteIdAllocator};
//!
//! let mut module = Module::new("Calc");
//! let mut f = MethodDef::new("Calc", "id")
//!     .with_params(vec![ValueType::Int32])
//!     .returning(ValueType::Int32);
//! f.emit_at(Opcode::LoadArg(0), SourceLocation::new("calc.src", 2, 2, 5, 6));
//! f.emit(Opcode::Return);
//! module.add_method(f);
//!
//! let fields = module.clone();
//! let sites = instrument(&mut module, &fields, &mut SiteIdAllocator::starting_at(0)).unwrap();
//! assert_eq!(sites.len(), 1);
//! assert_eq!(module.methods[0].instructions().len(), 11);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod classifier;
pub mod error;
pub mod fingerprint;
pub mod pass;
pub mod rewriter;
pub mod snapshot;

// Re-export main types at crate root
pub use classifier::{classify, Classification, FieldTypes};
pub use error::{ClassifyError, RewriteError, SnapshotError};
pub use fingerprint::{Stamp, FINGERPRINT_KEY};
pub use pass::{RewriteOutcome, RewriteStatus, RewriteTarget, Rewriter};
pub use rewriter::{hook_sequence, hook_sequence_len, instrument, SiteIdAllocator};
pub use snapshot::{SnapshotEntry, SnapshotStore};
