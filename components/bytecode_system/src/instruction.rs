//! Bytecode instruction representation
//!
//! Contains the instruction structure and its optional source location.

use core_types::SourceLocation;

use crate::opcode::Opcode;

/// A single bytecode instruction with optional source mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// The opcode and its operand
    pub opcode: Opcode,
    /// Source location from the symbol file, if the compiler emitted one
    pub location: Option<SourceLocation>,
}

impl Instruction {
    /// Create a new instruction without source location
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            location: None,
        }
    }

    /// Create a new instruction with source location
    pub fn with_location(opcode: Opcode, location: SourceLocation) -> Self {
        Self {
            opcode,
            location: Some(location),
        }
    }

    /// Create a synthesised instruction with a hidden location in `document`
    pub fn hidden(opcode: Opcode, document: &str) -> Self {
        Self::with_location(opcode, SourceLocation::hidden(document))
    }

    /// Whether the instruction carries a hidden location
    pub fn is_hidden(&self) -> bool {
        self.location.as_ref().is_some_and(SourceLocation::is_hidden)
    }
}

/// Resolve the location of `instructions[index]`.
///
/// When the instruction has no location of its own, scans backwards for the
/// nearest preceding instruction whose location is present and not hidden.
/// A hidden location on the instruction itself is skipped the same way.
pub fn resolve_location(instructions: &[Instruction], index: usize) -> Option<&SourceLocation> {
    instructions[..=index.min(instructions.len().checked_sub(1)?)]
        .iter()
        .rev()
        .filter_map(|inst| inst.location.as_ref())
        .find(|loc| !loc.is_hidden())
}
