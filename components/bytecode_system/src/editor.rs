//! Method body editing
//!
//! The rewriter only sees modules through [`MethodEditor`]: enumerate
//! methods, read instructions, resolve locations and insert after an
//! instruction. Insertion keeps every branch pointing at the instruction it
//! addressed before the edit.

use core_types::SourceLocation;

use crate::instruction::{resolve_location, Instruction};
use crate::module::{MethodDef, Module};

/// Index of a method inside the edited module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(pub usize);

/// Editing interface over a module's method bodies
pub trait MethodEditor {
    /// All methods, in declaration order
    fn methods(&self) -> Vec<MethodId>;

    /// Declaration of a method
    fn method(&self, method: MethodId) -> &MethodDef;

    /// Whether the method has a body to edit
    fn has_body(&self, method: MethodId) -> bool {
        self.method(method).body.is_some()
    }

    /// Instructions of a method body
    fn instructions(&self, method: MethodId) -> &[Instruction] {
        self.method(method).instructions()
    }

    /// Resolved source location of an instruction, falling back to the
    /// nearest preceding non-hidden location
    fn location(&self, method: MethodId, index: usize) -> Option<&SourceLocation> {
        resolve_location(self.instructions(method), index)
    }

    /// Insert `new` immediately after instruction `index`.
    ///
    /// Branches targeting instructions after `index` are shifted so they
    /// keep addressing the same original instruction.
    fn insert_after(&mut self, method: MethodId, index: usize, new: Vec<Instruction>);
}

impl MethodEditor for Module {
    fn methods(&self) -> Vec<MethodId> {
        (0..self.methods.len()).map(MethodId).collect()
    }

    fn method(&self, method: MethodId) -> &MethodDef {
        &self.methods[method.0]
    }

    fn insert_after(&mut self, method: MethodId, index: usize, new: Vec<Instruction>) {
        let Some(body) = self.methods[method.0].body.as_mut() else {
            return;
        };
        let count = new.len();
        if count == 0 {
            return;
        }
        for inst in body.iter_mut() {
            if let Some(target) = inst.opcode.branch_target_mut() {
                if *target > index {
                    *target += count;
                }
            }
        }
        let at = index + 1;
        body.splice(at..at, new);
    }
}
