//! Value conversion errors.

use crate::ValueType;
use thiserror::Error;

/// Errors raised when a value does not have the shape an operation expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// `Unbox` applied to something that is not a boxed value of the
    /// expected type
    #[error("cannot unbox {found} as {expected}")]
    Unbox {
        /// Type the unbox instruction asked for
        expected: ValueType,
        /// Description of the value actually found
        found: String,
    },
    /// A value was stored into a slot of an incompatible declared type
    #[error("value of type {found} is not assignable to {expected}")]
    NotAssignable {
        /// Declared type of the slot
        expected: ValueType,
        /// Description of the value actually found
        found: String,
    },
}
