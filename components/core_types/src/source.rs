//! Source locations from debug symbols and stack frames for runtime errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved line number marking a compiler-synthesised instruction that has
/// no corresponding source text. Debuggers step over it.
pub const HIDDEN_LINE: u32 = 0x00FE_EFEE;

/// A span of source text attached to an instruction.
///
/// # Examples
///
/// ```
/// use core_types::SourceLocation;
///
/// let loc = SourceLocation::new("file:///src/calc.cs", 10, 10, 5, 18);
/// assert!(!loc.is_hidden());
/// assert!(SourceLocation::hidden("file:///src/calc.cs").is_hidden());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Document identity (file URL)
    pub document: String,
    /// First line of the span (1-based)
    pub start_line: u32,
    /// Last line of the span (1-based)
    pub end_line: u32,
    /// First column of the span (1-based)
    pub start_column: u32,
    /// Column just past the end of the span (1-based)
    pub end_column: u32,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(
        document: impl Into<String>,
        start_line: u32,
        end_line: u32,
        start_column: u32,
        end_column: u32,
    ) -> Self {
        Self {
            document: document.into(),
            start_line,
            end_line,
            start_column,
            end_column,
        }
    }

    /// Location for synthesised code in `document`.
    pub fn hidden(document: impl Into<String>) -> Self {
        Self::new(document, HIDDEN_LINE, HIDDEN_LINE, 0, 0)
    }

    /// Whether this is a hidden (synthesised) location
    pub fn is_hidden(&self) -> bool {
        self.start_line == HIDDEN_LINE
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_hidden() {
            return write!(f, "{}:<hidden>", self.document);
        }
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.document, self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// A single frame of the interpreter call stack at the time of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// `Class::method` of the executing method
    pub method: String,
    /// Index of the faulting instruction in the method body
    pub instruction: usize,
    /// Source location of the instruction, if known
    pub location: Option<SourceLocation>,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "at {} [{}] ({})", self.method, self.instruction, loc),
            None => write!(f, "at {} [{}]", self.method, self.instruction),
        }
    }
}
