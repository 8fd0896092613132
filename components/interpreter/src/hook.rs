//! Value hook invoked by the `CallHook` opcode.

use core_types::{SourceLocation, Value, ValueType};

use crate::error::HookFault;

/// Metadata the rewriter burned into a hook call
#[derive(Debug, Clone, PartialEq)]
pub struct HookSite {
    /// Site id
    pub id: u32,
    /// Declared type of the observed value
    pub ty: ValueType,
    /// Source location of the observed instruction
    pub location: SourceLocation,
}

/// Receiver of observed values.
///
/// Called in strict execution order with the unboxed value produced at a
/// site. The returned value replaces it and must be assignable to the site's
/// declared type.
pub trait ValueHook {
    /// Observe `value` at `site`, returning the value execution continues with
    fn on_value(&mut self, site: &HookSite, value: Value) -> Result<Value, HookFault>;
}

/// Hook that returns every value unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl ValueHook for PassThrough {
    fn on_value(&mut self, _site: &HookSite, value: Value) -> Result<Value, HookFault> {
        Ok(value)
    }
}
