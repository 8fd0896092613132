//! Errors raised while reading, writing or analysing modules.

use std::path::PathBuf;
use thiserror::Error;

/// Module read/write failures
#[derive(Debug, Error)]
pub enum ModuleError {
    /// The binary does not start with the module magic
    #[error("invalid module header: {0}")]
    InvalidHeader(String),
    /// The binary was written by an incompatible format version
    #[error("unsupported module format version {0}")]
    UnsupportedVersion(u8),
    /// The binary ended in the middle of a record
    #[error("unexpected end of module data at offset {0}")]
    Truncated(usize),
    /// Unknown opcode tag
    #[error("unknown opcode tag {tag} at offset {offset}")]
    UnknownOpcode {
        /// Tag byte read
        tag: u8,
        /// Offset of the tag byte
        offset: usize,
    },
    /// Unknown tag in a tagged record
    #[error("unknown {what} tag {tag} at offset {offset}")]
    UnknownTag {
        /// Kind of record being decoded
        what: &'static str,
        /// Tag byte read
        tag: u8,
        /// Offset of the tag byte
        offset: usize,
    },
    /// String data is not UTF-8
    #[error("invalid UTF-8 in module data: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// Character literal is not a Unicode scalar value
    #[error("invalid character literal {0:#x}")]
    InvalidChar(u32),
    /// Filesystem failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// Symbol file is not valid JSON of the expected shape
    #[error("malformed symbol file {}: {source}", path.display())]
    Symbols {
        /// Symbol file path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
    /// Symbol file does not describe this module
    #[error("symbol file does not match module {module}: {reason}")]
    SymbolMismatch {
        /// Module name
        module: String,
        /// What did not match
        reason: String,
    },
}

impl ModuleError {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ModuleError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Stack analysis failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    /// An instruction pops more values than are on the stack
    #[error("stack underflow at instruction {index} in {method}")]
    Underflow {
        /// `Class::method`
        method: String,
        /// Instruction index
        index: usize,
    },
    /// Two control-flow paths reach an instruction with different depths
    #[error("inconsistent stack depth at instruction {index} in {method}: {first} vs {second}")]
    Inconsistent {
        /// `Class::method`
        method: String,
        /// Instruction index
        index: usize,
        /// Depth seen first
        first: usize,
        /// Conflicting depth
        second: usize,
    },
    /// A branch leaves the method body
    #[error("branch target {target} out of range at instruction {index} in {method}")]
    BadTarget {
        /// `Class::method`
        method: String,
        /// Instruction index
        index: usize,
        /// Offending target
        target: usize,
    },
    /// A call references a method whose signature is unknown
    #[error("cannot resolve callee {callee} at instruction {index} in {method}")]
    UnknownCallee {
        /// `Class::method`
        method: String,
        /// Instruction index
        index: usize,
        /// Unresolved callee
        callee: String,
    },
    /// Control falls off the end of the body
    #[error("control falls off the end of {method}")]
    FallOff {
        /// `Class::method`
        method: String,
    },
}
