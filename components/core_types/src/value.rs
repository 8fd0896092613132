//! Uniform value representation shared by the interpreter, the recorder and
//! the search driver.
//!
//! Every value that crosses the instrumentation hook is carried as a
//! [`Value`]. Primitive values are stored inline, objects are shared heap
//! cells, and [`Value::Boxed`] wraps a primitive that has been boxed by an
//! inserted `Box` instruction.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::error::ValueError;

/// Declared static type of a local, argument, field or instrumentation site.
///
/// # Examples
///
/// ```
/// use core_types::ValueType;
///
/// assert!(ValueType::Int32.is_value_type());
/// assert!(!ValueType::String.is_value_type());
/// assert_eq!(ValueType::Object("Account".into()).to_string(), "Account");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueType {
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// IEEE 754 double-precision floating point
    Float64,
    /// Boolean
    Bool,
    /// Unicode scalar value
    Char,
    /// Immutable string (reference type)
    String,
    /// Instance of the named class (reference type)
    Object(String),
}

impl ValueType {
    /// Returns true for types that must be boxed before crossing the hook.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            ValueType::Int32
                | ValueType::Int64
                | ValueType::Float64
                | ValueType::Bool
                | ValueType::Char
        )
    }

    /// Returns true for reference types, which admit `null`.
    pub fn is_reference_type(&self) -> bool {
        !self.is_value_type()
    }

    /// Zero value used to initialise locals and fields of this type.
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Int32 => Value::Int32(0),
            ValueType::Int64 => Value::Int64(0),
            ValueType::Float64 => Value::Float64(0.0),
            ValueType::Bool => Value::Bool(false),
            ValueType::Char => Value::Char('\0'),
            ValueType::String | ValueType::Object(_) => Value::Null,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int32 => write!(f, "int32"),
            ValueType::Int64 => write!(f, "int64"),
            ValueType::Float64 => write!(f, "float64"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Char => write!(f, "char"),
            ValueType::String => write!(f, "string"),
            ValueType::Object(class) => write!(f, "{}", class),
        }
    }
}

/// Heap-allocated instance of a class.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectData {
    /// Name of the instantiated class
    pub class: String,
    /// Instance field values by field name
    pub fields: BTreeMap<String, Value>,
}

/// Shared handle to a heap object. Equality is identity.
pub type ObjectRef = Rc<RefCell<ObjectData>>;

/// A runtime value.
///
/// # Examples
///
/// ```
/// use core_types::{Value, ValueType};
///
/// let boxed = Value::Int32(5).boxed();
/// assert_eq!(boxed.unbox(&ValueType::Int32).unwrap(), Value::Int32(5));
/// assert!(Value::Null.is_assignable_to(&ValueType::String));
/// assert!(!Value::Null.is_assignable_to(&ValueType::Int32));
/// ```
#[derive(Clone)]
pub enum Value {
    /// Null reference
    Null,
    /// Boolean
    Bool(bool),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// Double-precision float
    Float64(f64),
    /// Character
    Char(char),
    /// String
    Str(String),
    /// Reference to a heap object
    Object(ObjectRef),
    /// A boxed primitive
    Boxed(Box<Value>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Int32(n) => f.debug_tuple("Int32").field(n).finish(),
            Value::Int64(n) => f.debug_tuple("Int64").field(n).finish(),
            Value::Float64(n) => f.debug_tuple("Float64").field(n).finish(),
            Value::Char(c) => f.debug_tuple("Char").field(c).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Value::Object(obj) => write!(f, "Object({}@{:p})", obj.borrow().class, Rc::as_ptr(obj)),
            Value::Boxed(inner) => f.debug_tuple("Boxed").field(inner).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Boxed(a), Value::Boxed(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Creates a fresh object of `class` with the given fields.
    pub fn new_object(class: impl Into<String>, fields: BTreeMap<String, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(ObjectData {
            class: class.into(),
            fields,
        })))
    }

    /// Static type of this value, if it has one. `Null` and boxed values
    /// have no single static type.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null | Value::Boxed(_) => None,
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Int32(_) => Some(ValueType::Int32),
            Value::Int64(_) => Some(ValueType::Int64),
            Value::Float64(_) => Some(ValueType::Float64),
            Value::Char(_) => Some(ValueType::Char),
            Value::Str(_) => Some(ValueType::String),
            Value::Object(obj) => Some(ValueType::Object(obj.borrow().class.clone())),
        }
    }

    /// Whether this value may be stored in a slot declared as `ty`.
    pub fn is_assignable_to(&self, ty: &ValueType) -> bool {
        match self {
            Value::Null => ty.is_reference_type(),
            Value::Boxed(_) => false,
            other => other.value_type().as_ref() == Some(ty),
        }
    }

    /// Boxes a primitive. Reference values are returned unchanged.
    pub fn boxed(self) -> Value {
        match self {
            Value::Bool(_)
            | Value::Int32(_)
            | Value::Int64(_)
            | Value::Float64(_)
            | Value::Char(_) => Value::Boxed(Box::new(self)),
            other => other,
        }
    }

    /// Unboxes a boxed primitive of type `ty`.
    pub fn unbox(self, ty: &ValueType) -> Result<Value, ValueError> {
        match self {
            Value::Boxed(inner) if inner.is_assignable_to(ty) => Ok(*inner),
            other => Err(ValueError::Unbox {
                expected: ty.clone(),
                found: other.describe(),
            }),
        }
    }

    /// Identity used to deduplicate observed values: floats compare by bit
    /// pattern and objects by reference.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::Boxed(a), Value::Boxed(b)) => a.same_value(b),
            _ => self == other,
        }
    }

    /// Copy of the value in which every reachable object is a fresh heap
    /// cell. Sharing and cycles among the copied objects are preserved.
    pub fn deep_copy(&self) -> Value {
        self.deep_copy_into(&mut HashMap::new())
    }

    fn deep_copy_into(&self, copies: &mut HashMap<*const RefCell<ObjectData>, ObjectRef>) -> Value {
        match self {
            Value::Object(obj) => {
                if let Some(copy) = copies.get(&Rc::as_ptr(obj)) {
                    return Value::Object(Rc::clone(copy));
                }
                let source = obj.borrow();
                let copy = Rc::new(RefCell::new(ObjectData {
                    class: source.class.clone(),
                    fields: BTreeMap::new(),
                }));
                copies.insert(Rc::as_ptr(obj), Rc::clone(&copy));
                let fields = source
                    .fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.deep_copy_into(copies)))
                    .collect();
                copy.borrow_mut().fields = fields;
                Value::Object(copy)
            }
            Value::Boxed(inner) => Value::Boxed(Box::new(inner.deep_copy_into(copies))),
            other => other.clone(),
        }
    }

    /// Interprets the value as a branch condition.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int32(n) => *n != 0,
            Value::Int64(n) => *n != 0,
            Value::Float64(n) => *n != 0.0 && !n.is_nan(),
            Value::Char(c) => *c != '\0',
            Value::Str(_) | Value::Object(_) | Value::Boxed(_) => true,
        }
    }

    /// Short type description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boxed(inner) => format!("boxed {}", inner.describe()),
            other => other
                .value_type()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int32(n) => write!(f, "{}", n),
            Value::Int64(n) => write!(f, "{}L", n),
            Value::Float64(n) => write!(f, "{:?}", n),
            Value::Char(c) => write!(f, "'{}'", c),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(obj) => write!(f, "<{}>", obj.borrow().class),
            Value::Boxed(inner) => write!(f, "box({})", inner),
        }
    }
}
