//! Errors raised by classification, rewriting and the snapshot store.

use bytecode_system::{DebugInfo, ModuleError};
use std::path::PathBuf;
use thiserror::Error;

/// Classification failures. All of them are fatal for the rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// A load-like opcode the rewriter cannot instrument
    #[error("unsupported load {opcode} at instruction {index} in {method}")]
    UnsupportedLoad {
        /// `Class::method`
        method: String,
        /// Instruction index
        index: usize,
        /// Opcode rendering
        opcode: String,
    },
    /// Local index without a declared type
    #[error("undeclared local {slot} at instruction {index} in {method}")]
    UnknownLocal {
        /// `Class::method`
        method: String,
        /// Instruction index
        index: usize,
        /// Local slot
        slot: u16,
    },
    /// Argument index without a declared type
    #[error("undeclared argument {slot} at instruction {index} in {method}")]
    UnknownArgument {
        /// `Class::method`
        method: String,
        /// Instruction index
        index: usize,
        /// Argument slot
        slot: u16,
    },
    /// Field reference that no loaded class declares
    #[error("undeclared field {field} at instruction {index} in {method}")]
    UnknownField {
        /// `Class::method`
        method: String,
        /// Instruction index
        index: usize,
        /// `Class::field`
        field: String,
    },
}

/// Rewrite failures
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The module was optimized or built without full debug information
    #[error("module {module} is not instrumentable (optimized: {optimized}, debug info: {debug_info:?})")]
    NotInstrumentable {
        /// Module name
        module: String,
        /// Whether the build was optimized
        optimized: bool,
        /// Debug information level
        debug_info: DebugInfo,
    },
    /// The module has no symbol file
    #[error("module {module} has no symbol file at {}", path.display())]
    MissingSymbols {
        /// Module name
        module: String,
        /// Expected symbol file path
        path: PathBuf,
    },
    /// No source location could be resolved for a site
    #[error("no source location for instruction {index} in {method}")]
    NoLocation {
        /// `Class::method`
        method: String,
        /// Instruction index
        index: usize,
    },
    /// A location coordinate does not fit the `Int32` literal the hook
    /// sequence passes it in
    #[error("site {site} location {value} exceeds the Int32 range")]
    LocationOutOfRange {
        /// Site id
        site: u32,
        /// Offending line or column
        value: u32,
    },
    /// Site classification failed
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    /// Reading or writing the module failed
    #[error(transparent)]
    Module(#[from] ModuleError),
    /// Backup or restore failed
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Snapshot store failures
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Filesystem failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// The index file is not valid JSON
    #[error("malformed snapshot index {}: {source}", path.display())]
    Index {
        /// Index path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
    /// A stale module has no recorded backup
    #[error("no backup recorded for module {0}")]
    MissingBackup(String),
    /// A stored object does not hash to its id
    #[error("snapshot object {id} is corrupt")]
    Corrupt {
        /// Object id
        id: String,
    },
    /// Writing into the working copy failed
    #[error(transparent)]
    Module(#[from] ModuleError),
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::Io {
            path: path.into(),
            source,
        }
    }
}
