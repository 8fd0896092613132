//! Runtime value recorder for instrumented modules
//!
//! The rewritten binaries call the interpreter's hook at every site; this
//! crate provides the hook the search driver installs:
//! - [`Recorder`] records per-test [`ValueProfile`]s in recording mode
//! - In replay mode it serves overrides from a [`SubstitutionMapping`]
//! - Overrides are type-checked against the [`SiteTable`] when installed
//!
//! # Example
//!
//! ```
//! use bytecode_system::SiteRecord;
//! use core_types::{SourceLocation, Value, ValueType};
//! use interpreter::{HookSite, ValueHook};
//! use recorder::{Mode, Recorder, SiteTable};
//!
//! let record = SiteRecord {
//!     id: 0,
//!     ty: ValueType::Int32,
//!     location: SourceLocation::new("calc.src", 10, 10, 9, 10),
//!     method: "Calc::f".into(),
//! };
//! let site = HookSite { id: 0, ty: ValueType::Int32, location: record.location.clone() };
//! let mut recorder = Recorder::new(SiteTable::from_iter([record]));
//!
//! recorder.begin_test("CalcTests::f");
//! recorder.on_value(&site, Value::Int32(5)).unwrap();
//! recorder.end_test();
//!
//! recorder.set_mode(Mode::Replay);
//! recorder.install(0, Value::Int32(9)).unwrap();
//! recorder.begin_test("CalcTests::f");
//! assert_eq!(recorder.on_value(&site, Value::Int32(5)).unwrap(), Value::Int32(9));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod mapping;
pub mod profile;
pub mod recorder;
pub mod sites;

// Re-export main types at crate root
pub use error::HookError;
pub use mapping::SubstitutionMapping;
pub use profile::{Observation, ValueProfile};
pub use recorder::{Mode, Recorder};
pub use sites::SiteTable;
