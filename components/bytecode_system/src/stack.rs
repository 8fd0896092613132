//! Operand-stack depth analysis
//!
//! Computes the stack depth before every instruction of a method body by
//! walking fallthrough and branch edges. Used to check that instrumented
//! bodies keep the shape of the original.

use crate::error::StackError;
use crate::module::{MethodDef, Module};
use crate::opcode::{MethodRef, Opcode};

/// Resolves the stack effect of calls
pub trait SignatureResolver {
    /// Values popped (arguments plus receiver) and pushed by a call to
    /// `callee`, or `None` if the callee is unknown
    fn call_effect(&self, callee: &MethodRef) -> Option<(usize, usize)>;
}

impl SignatureResolver for Module {
    fn call_effect(&self, callee: &MethodRef) -> Option<(usize, usize)> {
        self.method(callee).map(call_effect_of)
    }
}

impl SignatureResolver for Vec<Module> {
    fn call_effect(&self, callee: &MethodRef) -> Option<(usize, usize)> {
        self.iter().find_map(|m| m.call_effect(callee))
    }
}

/// Stack effect of calling `method`
pub fn call_effect_of(method: &MethodDef) -> (usize, usize) {
    (method.arg_count(), usize::from(method.returns.is_some()))
}

/// Stack depth before each instruction of `method`.
///
/// Unreachable instructions get `None`.
pub fn stack_depths(
    method: &MethodDef,
    resolver: &dyn SignatureResolver,
) -> Result<Vec<Option<usize>>, StackError> {
    let name = method.qualified_name();
    let body = method.instructions();
    let mut depths: Vec<Option<usize>> = vec![None; body.len()];
    if body.is_empty() {
        return Ok(depths);
    }

    let mut worklist = vec![(0usize, 0usize)];
    while let Some((index, depth)) = worklist.pop() {
        if index >= body.len() {
            return Err(StackError::FallOff { method: name });
        }
        match depths[index] {
            Some(seen) if seen == depth => continue,
            Some(seen) => {
                return Err(StackError::Inconsistent {
                    method: name,
                    index,
                    first: seen,
                    second: depth,
                })
            }
            None => depths[index] = Some(depth),
        }

        let opcode = &body[index].opcode;
        let (pop, push) = match opcode {
            Opcode::Call(callee) => {
                resolver
                    .call_effect(callee)
                    .ok_or_else(|| StackError::UnknownCallee {
                        method: name.clone(),
                        index,
                        callee: callee.to_string(),
                    })?
            }
            Opcode::Return => (usize::from(method.returns.is_some()), 0),
            other => other.fixed_stack_effect().unwrap_or((0, 0)),
        };
        let after = depth
            .checked_sub(pop)
            .ok_or_else(|| StackError::Underflow {
                method: name.clone(),
                index,
            })?
            + push;

        if let Some(target) = opcode.branch_target() {
            if target >= body.len() {
                return Err(StackError::BadTarget {
                    method: name,
                    index,
                    target,
                });
            }
            worklist.push((target, after));
        }
        if !opcode.is_unconditional_terminator() {
            worklist.push((index + 1, after));
        }
    }

    Ok(depths)
}
