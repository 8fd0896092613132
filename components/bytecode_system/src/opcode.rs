//! Opcodes of the stack-machine instruction set
//!
//! Defines every instruction a method body may contain, grouped by the
//! category the site classifier reasons about.

use core_types::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a field declared by a class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    /// Declaring class name
    pub class: String,
    /// Field name
    pub name: String,
}

impl FieldRef {
    /// Create a new field reference
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.name)
    }
}

/// Reference to a method declared by a class
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodRef {
    /// Declaring class name
    pub class: String,
    /// Method name
    pub name: String,
}

impl MethodRef {
    /// Create a new method reference
    pub fn new(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.class, self.name)
    }
}

/// Bytecode opcodes
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    /// Do nothing
    Nop,

    // Constants
    /// Push a null reference
    LoadNull,
    /// Push a 32-bit integer literal
    LoadInt32(i32),
    /// Push a 64-bit integer literal
    LoadInt64(i64),
    /// Push a double literal
    LoadFloat64(f64),
    /// Push a boolean literal
    LoadBool(bool),
    /// Push a character literal
    LoadChar(char),
    /// Push a string literal
    LoadString(String),

    // Locals and arguments
    /// Push the value of a local variable
    LoadLocal(u16),
    /// Push the address of a local variable
    LoadLocalAddress(u16),
    /// Pop into a local variable
    StoreLocal(u16),
    /// Push the value of an argument (argument 0 is `this` for instance methods)
    LoadArg(u16),
    /// Push the address of an argument
    LoadArgAddress(u16),
    /// Pop into an argument slot
    StoreArg(u16),

    // Fields
    /// Pop an object, push the value of one of its instance fields
    LoadField(FieldRef),
    /// Pop an object, push the address of one of its instance fields
    LoadFieldAddress(FieldRef),
    /// Pop a value and an object, store into the instance field
    StoreField(FieldRef),
    /// Push the value of a static field
    LoadStaticField(FieldRef),
    /// Push the address of a static field
    LoadStaticFieldAddress(FieldRef),
    /// Pop into a static field
    StoreStaticField(FieldRef),

    // Arrays
    /// Pop a length, push a new array of the element type
    NewArray(ValueType),
    /// Pop an array, push its length
    ArrayLength,
    /// Pop an index and an array, push the element
    LoadElement(ValueType),
    /// Pop an index and an array, push the element address
    LoadElementAddress(ValueType),
    /// Pop a value, an index and an array, store the element
    StoreElement(ValueType),

    // Indirection
    /// Pop an address, push the value it points to
    LoadIndirect(ValueType),
    /// Pop a value and an address, store through the address
    StoreIndirect(ValueType),
    /// Pop an address, push the value-type object it points to
    LoadObject(ValueType),

    // Function pointers
    /// Push a pointer to a method
    LoadFunction(MethodRef),
    /// Pop an object, push a pointer to its virtual method
    LoadVirtualFunction(MethodRef),

    // Stack manipulation
    /// Duplicate top value
    Dup,
    /// Discard top value
    Pop,

    // Arithmetic and comparison
    /// Add top two values
    Add,
    /// Subtract top from second-top
    Sub,
    /// Multiply top two values
    Mul,
    /// Divide second-top by top
    Div,
    /// Remainder of second-top by top
    Rem,
    /// Negate top value
    Neg,
    /// Logical not of top value
    Not,
    /// Push whether the top two values are equal
    CompareEqual,
    /// Push whether second-top is less than top
    CompareLess,
    /// Push whether second-top is greater than top
    CompareGreater,

    // Control flow
    /// Unconditional branch to instruction index
    Jump(usize),
    /// Pop and branch if truthy
    JumpIfTrue(usize),
    /// Pop and branch if falsy
    JumpIfFalse(usize),
    /// Return from the current method
    Return,
    /// Pop a value and raise it as an exception
    Throw,

    // Calls and objects
    /// Call a method; pops arguments (and receiver), pushes the result if non-void
    Call(MethodRef),
    /// Push a new zero-initialised instance of the class
    NewObject(String),

    // Boxing and instrumentation
    /// Pop a value of the given value type, push it boxed
    Box(ValueType),
    /// Pop a boxed value, push it unboxed as the given value type
    Unbox(ValueType),
    /// Invoke the value hook: pops the value, document, start line, end line,
    /// start column, end column and site id; pushes the (possibly
    /// substituted) value. The operand is the site's declared type.
    CallHook(ValueType),
}

impl Opcode {
    /// Check if this opcode is a terminator (ends basic block)
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Opcode::Return
                | Opcode::Jump(_)
                | Opcode::JumpIfTrue(_)
                | Opcode::JumpIfFalse(_)
                | Opcode::Throw
        )
    }

    /// Check if this opcode is an unconditional terminator
    pub fn is_unconditional_terminator(&self) -> bool {
        matches!(self, Opcode::Return | Opcode::Jump(_) | Opcode::Throw)
    }

    /// Branch target of a jump, if any
    pub fn branch_target(&self) -> Option<usize> {
        match self {
            Opcode::Jump(t) | Opcode::JumpIfTrue(t) | Opcode::JumpIfFalse(t) => Some(*t),
            _ => None,
        }
    }

    /// Mutable access to the branch target of a jump
    pub fn branch_target_mut(&mut self) -> Option<&mut usize> {
        match self {
            Opcode::Jump(t) | Opcode::JumpIfTrue(t) | Opcode::JumpIfFalse(t) => Some(t),
            _ => None,
        }
    }

    /// Check if this opcode pushes a compile-time constant
    pub fn is_constant_load(&self) -> bool {
        matches!(
            self,
            Opcode::LoadNull
                | Opcode::LoadInt32(_)
                | Opcode::LoadInt64(_)
                | Opcode::LoadFloat64(_)
                | Opcode::LoadBool(_)
                | Opcode::LoadChar(_)
                | Opcode::LoadString(_)
        )
    }

    /// Number of values popped and pushed, for opcodes whose effect does not
    /// depend on a method signature. `Call` and `Return` yield `None`.
    pub fn fixed_stack_effect(&self) -> Option<(usize, usize)> {
        let effect = match self {
            Opcode::Nop => (0, 0),
            Opcode::LoadNull
            | Opcode::LoadInt32(_)
            | Opcode::LoadInt64(_)
            | Opcode::LoadFloat64(_)
            | Opcode::LoadBool(_)
            | Opcode::LoadChar(_)
            | Opcode::LoadString(_) => (0, 1),
            Opcode::LoadLocal(_) | Opcode::LoadLocalAddress(_) => (0, 1),
            Opcode::StoreLocal(_) => (1, 0),
            Opcode::LoadArg(_) | Opcode::LoadArgAddress(_) => (0, 1),
            Opcode::StoreArg(_) => (1, 0),
            Opcode::LoadField(_) | Opcode::LoadFieldAddress(_) => (1, 1),
            Opcode::StoreField(_) => (2, 0),
            Opcode::LoadStaticField(_) | Opcode::LoadStaticFieldAddress(_) => (0, 1),
            Opcode::StoreStaticField(_) => (1, 0),
            Opcode::NewArray(_) | Opcode::ArrayLength => (1, 1),
            Opcode::LoadElement(_) | Opcode::LoadElementAddress(_) => (2, 1),
            Opcode::StoreElement(_) => (3, 0),
            Opcode::LoadIndirect(_) | Opcode::LoadObject(_) => (1, 1),
            Opcode::StoreIndirect(_) => (2, 0),
            Opcode::LoadFunction(_) => (0, 1),
            Opcode::LoadVirtualFunction(_) => (1, 1),
            Opcode::Dup => (1, 2),
            Opcode::Pop => (1, 0),
            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Rem
            | Opcode::CompareEqual
            | Opcode::CompareLess
            | Opcode::CompareGreater => (2, 1),
            Opcode::Neg | Opcode::Not => (1, 1),
            Opcode::Jump(_) => (0, 0),
            Opcode::JumpIfTrue(_) | Opcode::JumpIfFalse(_) => (1, 0),
            Opcode::Throw => (1, 0),
            Opcode::NewObject(_) => (0, 1),
            Opcode::Box(_) | Opcode::Unbox(_) => (1, 1),
            Opcode::CallHook(_) => (7, 1),
            Opcode::Call(_) | Opcode::Return => return None,
        };
        Some(effect)
    }
}
