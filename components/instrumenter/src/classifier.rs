//! Site classification
//!
//! Decides, per instruction, whether the value it pushes is observed. Only
//! plain loads of locals, arguments and fields qualify. The match below has
//! no wildcard arm: a new opcode does not compile until it is classified.

use bytecode_system::{ArgSlot, FieldRef, MethodDef, Module, Opcode};
use core_types::ValueType;

use crate::error::ClassifyError;

/// Outcome of classifying one instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The instruction is not instrumented
    NotASite,
    /// The instruction pushes a value of the given declared type
    Site(ValueType),
}

/// Declared field types visible to the classifier
pub trait FieldTypes {
    /// Declared type of `field`, if some loaded class declares it
    fn field_type(&self, field: &FieldRef) -> Option<ValueType>;
}

impl FieldTypes for Module {
    fn field_type(&self, field: &FieldRef) -> Option<ValueType> {
        self.field(field).map(|f| f.ty.clone())
    }
}

impl FieldTypes for Vec<Module> {
    fn field_type(&self, field: &FieldRef) -> Option<ValueType> {
        self.iter().find_map(|m| m.field_type(field))
    }
}

/// Classify instruction `index` of `method`
pub fn classify(
    method: &MethodDef,
    index: usize,
    opcode: &Opcode,
    fields: &dyn FieldTypes,
) -> Result<Classification, ClassifyError> {
    use Classification::{NotASite, Site};

    let result = match opcode {
        Opcode::LoadLocal(slot) => {
            let ty = method.locals.get(*slot as usize).ok_or_else(|| {
                ClassifyError::UnknownLocal {
                    method: method.qualified_name(),
                    index,
                    slot: *slot,
                }
            })?;
            Site(ty.clone())
        }
        Opcode::LoadArg(slot) => match method.arg_slot(*slot) {
            // replacing the receiver is unsound
            Some(ArgSlot::This(_)) => NotASite,
            Some(ArgSlot::Param(ty)) => Site(ty.clone()),
            None => {
                return Err(ClassifyError::UnknownArgument {
                    method: method.qualified_name(),
                    index,
                    slot: *slot,
                })
            }
        },
        Opcode::LoadField(field) | Opcode::LoadStaticField(field) => {
            let ty = fields
                .field_type(field)
                .ok_or_else(|| ClassifyError::UnknownField {
                    method: method.qualified_name(),
                    index,
                    field: field.to_string(),
                })?;
            Site(ty)
        }

        Opcode::LoadIndirect(_) | Opcode::LoadObject(_) => {
            return Err(ClassifyError::UnsupportedLoad {
                method: method.qualified_name(),
                index,
                opcode: format!("{:?}", opcode),
            })
        }

        Opcode::LoadLocalAddress(_)
        | Opcode::LoadArgAddress(_)
        | Opcode::LoadFieldAddress(_)
        | Opcode::LoadStaticFieldAddress(_)
        | Opcode::LoadElement(_)
        | Opcode::LoadElementAddress(_)
        | Opcode::LoadFunction(_)
        | Opcode::LoadVirtualFunction(_) => NotASite,

        Opcode::LoadNull
        | Opcode::LoadInt32(_)
        | Opcode::LoadInt64(_)
        | Opcode::LoadFloat64(_)
        | Opcode::LoadBool(_)
        | Opcode::LoadChar(_)
        | Opcode::LoadString(_) => NotASite,

        Opcode::Nop
        | Opcode::StoreLocal(_)
        | Opcode::StoreArg(_)
        | Opcode::StoreField(_)
        | Opcode::StoreStaticField(_)
        | Opcode::NewArray(_)
        | Opcode::ArrayLength
        | Opcode::StoreElement(_)
        | Opcode::StoreIndirect(_)
        | Opcode::Dup
        | Opcode::Pop
        | Opcode::Add
        | Opcode::Sub
        | Opcode::Mul
        | Opcode::Div
        | Opcode::Rem
        | Opcode::Neg
        | Opcode::Not
        | Opcode::CompareEqual
        | Opcode::CompareLess
        | Opcode::CompareGreater
        | Opcode::Jump(_)
        | Opcode::JumpIfTrue(_)
        | Opcode::JumpIfFalse(_)
        | Opcode::Return
        | Opcode::Throw
        | Opcode::Call(_)
        | Opcode::NewObject(_)
        | Opcode::Box(_)
        | Opcode::Unbox(_)
        | Opcode::CallHook(_) => NotASite,
    };
    Ok(result)
}
