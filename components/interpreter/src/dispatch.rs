//! Dispatch loop for bytecode execution
//!
//! Handles individual opcode execution.

use bytecode_system::{FieldRef, MethodDef, Opcode};
use core_types::{SourceLocation, Value, ValueType};
use std::collections::HashMap;
use tracing::trace;

use crate::call_frame::CallFrame;
use crate::error::RuntimeError;
use crate::hook::{HookSite, ValueHook};
use crate::program::Program;

/// Default limit on nested calls
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Executes method bodies of a [`Program`]
pub struct Dispatcher<'p, 'h> {
    program: &'p Program,
    statics: &'h mut HashMap<FieldRef, Value>,
    hook: &'h mut dyn ValueHook,
    frames: Vec<CallFrame<'p>>,
    step_limit: Option<u64>,
    steps: u64,
    max_depth: usize,
}

impl<'p, 'h> Dispatcher<'p, 'h> {
    /// Create a dispatcher over `program` sharing static field storage
    pub fn new(
        program: &'p Program,
        statics: &'h mut HashMap<FieldRef, Value>,
        hook: &'h mut dyn ValueHook,
    ) -> Self {
        Self {
            program,
            statics,
            hook,
            frames: Vec::with_capacity(16),
            step_limit: None,
            steps: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Abort after `limit` executed instructions
    pub fn with_step_limit(mut self, limit: Option<u64>) -> Self {
        self.step_limit = limit;
        self
    }

    /// Limit nested calls
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Instructions executed so far
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Run `method` with `args` to completion
    pub fn execute(
        &mut self,
        method: &'p MethodDef,
        args: Vec<Value>,
    ) -> Result<Option<Value>, RuntimeError> {
        self.push_frame(method, args)?;
        loop {
            if let Some(limit) = self.step_limit {
                if self.steps >= limit {
                    return Err(RuntimeError::StepLimit { limit });
                }
            }
            self.steps += 1;

            let frame = self.current()?;
            let method: &'p MethodDef = frame.method;
            let Some(inst) = method.instructions().get(frame.instruction_pointer) else {
                return Err(RuntimeError::FellOffEnd(method.qualified_name()));
            };
            frame.instruction_pointer += 1;
            let opcode = &inst.opcode;

            match opcode {
                Opcode::Nop => {}
                Opcode::LoadNull => frame.push(Value::Null),
                Opcode::LoadInt32(n) => frame.push(Value::Int32(*n)),
                Opcode::LoadInt64(n) => frame.push(Value::Int64(*n)),
                Opcode::LoadFloat64(n) => frame.push(Value::Float64(*n)),
                Opcode::LoadBool(b) => frame.push(Value::Bool(*b)),
                Opcode::LoadChar(c) => frame.push(Value::Char(*c)),
                Opcode::LoadString(s) => frame.push(Value::Str(s.clone())),
                Opcode::LoadLocal(i) => {
                    let value = frame.local(*i)?;
                    frame.push(value);
                }
                Opcode::StoreLocal(i) => {
                    let value = frame.pop()?;
                    frame.set_local(*i, value)?;
                }
                Opcode::LoadArg(i) => {
                    let value = frame.arg(*i)?;
                    frame.push(value);
                }
                Opcode::StoreArg(i) => {
                    let value = frame.pop()?;
                    frame.set_arg(*i, value)?;
                }
                Opcode::LoadField(field) => {
                    let target = frame.pop()?;
                    let value = load_field(&target, field)?;
                    self.current()?.push(value);
                }
                Opcode::StoreField(field) => {
                    let value = frame.pop()?;
                    let target = frame.pop()?;
                    store_field(&target, field, value)?;
                }
                Opcode::LoadStaticField(field) => {
                    let value = self.load_static(field)?;
                    self.current()?.push(value);
                }
                Opcode::StoreStaticField(field) => {
                    let value = frame.pop()?;
                    self.program.field(field)?;
                    self.statics.insert(field.clone(), value);
                }
                Opcode::Dup => {
                    let value = frame.pop()?;
                    frame.push(value.clone());
                    frame.push(value);
                }
                Opcode::Pop => {
                    frame.pop()?;
                }
                Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Div
                | Opcode::Rem
                | Opcode::CompareEqual
                | Opcode::CompareLess
                | Opcode::CompareGreater => {
                    let b = frame.pop()?;
                    let a = frame.pop()?;
                    let result = binary(opcode, a, b)?;
                    frame.push(result);
                }
                Opcode::Neg => {
                    let a = frame.pop()?;
                    frame.push(negate(a)?);
                }
                Opcode::Not => {
                    let a = frame.pop()?;
                    frame.push(Value::Bool(!a.is_truthy()));
                }
                Opcode::Jump(target) => frame.instruction_pointer = *target,
                Opcode::JumpIfTrue(target) => {
                    if frame.pop()?.is_truthy() {
                        frame.instruction_pointer = *target;
                    }
                }
                Opcode::JumpIfFalse(target) => {
                    if !frame.pop()?.is_truthy() {
                        frame.instruction_pointer = *target;
                    }
                }
                Opcode::Return => {
                    let result = match method.returns {
                        Some(_) => Some(frame.pop()?),
                        None => None,
                    };
                    self.frames.pop();
                    match self.frames.last_mut() {
                        Some(caller) => {
                            if let Some(value) = result {
                                caller.push(value);
                            }
                        }
                        None => return Ok(result),
                    }
                }
                Opcode::Throw => {
                    let value = frame.pop()?;
                    return Err(RuntimeError::Thrown {
                        message: exception_message(&value),
                        trace: self.frames.iter().rev().map(CallFrame::describe).collect(),
                    });
                }
                Opcode::Call(callee) => {
                    let target = self.program.method(callee)?;
                    let args = self.current()?.pop_n(target.arg_count())?;
                    self.push_frame(target, args)?;
                }
                Opcode::NewObject(class) => {
                    let def = self.program.class(class)?;
                    let fields = def
                        .fields
                        .iter()
                        .filter(|f| !f.is_static)
                        .map(|f| (f.name.clone(), f.ty.default_value()))
                        .collect();
                    self.current()?.push(Value::new_object(class.clone(), fields));
                }
                Opcode::Box(ty) => {
                    let value = frame.pop()?;
                    if !value.is_assignable_to(ty) {
                        return Err(RuntimeError::mismatch(
                            "box",
                            format!("{} is not {}", value.describe(), ty),
                        ));
                    }
                    frame.push(value.boxed());
                }
                Opcode::Unbox(ty) => {
                    let value = frame.pop()?;
                    frame.push(value.unbox(ty)?);
                }
                Opcode::CallHook(ty) => self.call_hook(ty)?,
                Opcode::LoadLocalAddress(_)
                | Opcode::LoadArgAddress(_)
                | Opcode::LoadFieldAddress(_)
                | Opcode::LoadStaticFieldAddress(_)
                | Opcode::NewArray(_)
                | Opcode::ArrayLength
                | Opcode::LoadElement(_)
                | Opcode::LoadElementAddress(_)
                | Opcode::StoreElement(_)
                | Opcode::LoadIndirect(_)
                | Opcode::StoreIndirect(_)
                | Opcode::LoadObject(_)
                | Opcode::LoadFunction(_)
                | Opcode::LoadVirtualFunction(_) => {
                    return Err(RuntimeError::Unsupported(format!("{:?}", opcode)));
                }
            }
        }
    }

    fn current(&mut self) -> Result<&mut CallFrame<'p>, RuntimeError> {
        self.frames
            .last_mut()
            .ok_or_else(|| RuntimeError::Unsupported("execution without a frame".to_string()))
    }

    fn push_frame(&mut self, method: &'p MethodDef, args: Vec<Value>) -> Result<(), RuntimeError> {
        if method.body.is_none() {
            return Err(RuntimeError::NoBody(method.qualified_name()));
        }
        if args.len() != method.arg_count() {
            return Err(RuntimeError::ArgumentCount {
                method: method.qualified_name(),
                expected: method.arg_count(),
                found: args.len(),
            });
        }
        if self.frames.len() >= self.max_depth {
            return Err(RuntimeError::StackOverflow {
                depth: self.frames.len(),
            });
        }
        trace!(method = %method.qualified_name(), depth = self.frames.len(), "call");
        self.frames.push(CallFrame::new(method, args));
        Ok(())
    }

    fn load_static(&mut self, field: &FieldRef) -> Result<Value, RuntimeError> {
        if let Some(value) = self.statics.get(field) {
            return Ok(value.clone());
        }
        let def = self.program.field(field)?;
        Ok(def.ty.default_value())
    }

    /// Stack on entry: value, document, start line, end line, start column,
    /// end column, site id (top).
    fn call_hook(&mut self, ty: &ValueType) -> Result<(), RuntimeError> {
        let frame = self.current()?;
        let mut operands = frame.pop_n(7)?.into_iter();
        let mut next = || operands.next().unwrap_or(Value::Null);
        let value = next();
        let document = match next() {
            Value::Str(s) => s,
            other => return Err(RuntimeError::mismatch("hook document", other.describe())),
        };
        let start_line = hook_u32(next(), "hook start line")?;
        let end_line = hook_u32(next(), "hook end line")?;
        let start_column = hook_u32(next(), "hook start column")?;
        let end_column = hook_u32(next(), "hook end column")?;
        let id = match next() {
            Value::Int64(n) => u32::try_from(n)
                .map_err(|_| RuntimeError::mismatch("hook site id", n.to_string()))?,
            other => return Err(RuntimeError::mismatch("hook site id", other.describe())),
        };

        let observed = if ty.is_value_type() {
            value.unbox(ty)?
        } else {
            value
        };
        let site = HookSite {
            id,
            ty: ty.clone(),
            location: SourceLocation::new(document, start_line, end_line, start_column, end_column),
        };
        let result = self
            .hook
            .on_value(&site, observed)
            .map_err(|source| RuntimeError::Hook { site: id, source })?;
        if !result.is_assignable_to(ty) {
            return Err(RuntimeError::HookResultType {
                site: id,
                expected: ty.clone(),
                found: result.describe(),
            });
        }
        let result = if ty.is_value_type() {
            result.boxed()
        } else {
            result
        };
        self.current()?.push(result);
        Ok(())
    }
}

fn hook_u32(value: Value, op: &'static str) -> Result<u32, RuntimeError> {
    match value {
        Value::Int32(n) => u32::try_from(n).map_err(|_| RuntimeError::mismatch(op, n.to_string())),
        other => Err(RuntimeError::mismatch(op, other.describe())),
    }
}

fn load_field(target: &Value, field: &FieldRef) -> Result<Value, RuntimeError> {
    match target {
        Value::Object(obj) => obj
            .borrow()
            .fields
            .get(&field.name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownField(field.to_string())),
        Value::Null => Err(RuntimeError::NullReference(field.to_string())),
        other => Err(RuntimeError::mismatch("load field", other.describe())),
    }
}

fn store_field(target: &Value, field: &FieldRef, value: Value) -> Result<(), RuntimeError> {
    match target {
        Value::Object(obj) => {
            let mut obj = obj.borrow_mut();
            let slot = obj
                .fields
                .get_mut(&field.name)
                .ok_or_else(|| RuntimeError::UnknownField(field.to_string()))?;
            *slot = value;
            Ok(())
        }
        Value::Null => Err(RuntimeError::NullReference(field.to_string())),
        other => Err(RuntimeError::mismatch("store field", other.describe())),
    }
}

fn exception_message(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Object(obj) => {
            let obj = obj.borrow();
            match obj.fields.get("message") {
                Some(Value::Str(msg)) => format!("{}: {}", obj.class, msg),
                _ => obj.class.clone(),
            }
        }
        other => other.to_string(),
    }
}

// Operators

fn binary(op: &Opcode, a: Value, b: Value) -> Result<Value, RuntimeError> {
    match op {
        Opcode::Add => add(a, b),
        Opcode::Sub => arith(a, b, "sub", i32::wrapping_sub, i64::wrapping_sub, |x, y| x - y),
        Opcode::Mul => arith(a, b, "mul", i32::wrapping_mul, i64::wrapping_mul, |x, y| x * y),
        Opcode::Div => {
            check_divisor(&b)?;
            arith(a, b, "div", i32::wrapping_div, i64::wrapping_div, |x, y| x / y)
        }
        Opcode::Rem => {
            check_divisor(&b)?;
            arith(a, b, "rem", i32::wrapping_rem, i64::wrapping_rem, |x, y| x % y)
        }
        Opcode::CompareEqual => Ok(Value::Bool(equal(&a, &b))),
        Opcode::CompareLess => compare(a, b).map(|o| Value::Bool(o == Some(std::cmp::Ordering::Less))),
        Opcode::CompareGreater => {
            compare(a, b).map(|o| Value::Bool(o == Some(std::cmp::Ordering::Greater)))
        }
        other => Err(RuntimeError::Unsupported(format!("{:?}", other))),
    }
}

fn add(a: Value, b: Value) -> Result<Value, RuntimeError> {
    match (&a, &b) {
        // String concatenation has priority
        (Value::Str(x), _) => Ok(Value::Str(format!("{}{}", x, to_text(&b)))),
        (_, Value::Str(y)) => Ok(Value::Str(format!("{}{}", to_text(&a), y))),
        _ => arith(a, b, "add", i32::wrapping_add, i64::wrapping_add, |x, y| x + y),
    }
}

fn arith(
    a: Value,
    b: Value,
    op: &'static str,
    int32: fn(i32, i32) -> i32,
    int64: fn(i64, i64) -> i64,
    float: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Int32(x), Value::Int32(y)) => Ok(Value::Int32(int32(x, y))),
        (Value::Int64(x), Value::Int64(y)) => Ok(Value::Int64(int64(x, y))),
        (Value::Int32(x), Value::Int64(y)) => Ok(Value::Int64(int64(x as i64, y))),
        (Value::Int64(x), Value::Int32(y)) => Ok(Value::Int64(int64(x, y as i64))),
        (Value::Float64(x), Value::Float64(y)) => Ok(Value::Float64(float(x, y))),
        (Value::Float64(x), Value::Int32(y)) => Ok(Value::Float64(float(x, y as f64))),
        (Value::Int32(x), Value::Float64(y)) => Ok(Value::Float64(float(x as f64, y))),
        (Value::Float64(x), Value::Int64(y)) => Ok(Value::Float64(float(x, y as f64))),
        (Value::Int64(x), Value::Float64(y)) => Ok(Value::Float64(float(x as f64, y))),
        (a, b) => Err(RuntimeError::mismatch(
            op,
            format!("{} and {}", a.describe(), b.describe()),
        )),
    }
}

fn check_divisor(b: &Value) -> Result<(), RuntimeError> {
    match b {
        Value::Int32(0) | Value::Int64(0) => Err(RuntimeError::DivideByZero),
        _ => Ok(()),
    }
}

fn negate(a: Value) -> Result<Value, RuntimeError> {
    match a {
        Value::Int32(x) => Ok(Value::Int32(x.wrapping_neg())),
        Value::Int64(x) => Ok(Value::Int64(x.wrapping_neg())),
        Value::Float64(x) => Ok(Value::Float64(-x)),
        other => Err(RuntimeError::mismatch("neg", other.describe())),
    }
}

fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int32(x), Value::Int64(y)) | (Value::Int64(y), Value::Int32(x)) => *x as i64 == *y,
        (Value::Float64(x), Value::Int32(y)) | (Value::Int32(y), Value::Float64(x)) => {
            *x == *y as f64
        }
        _ => a == b,
    }
}

fn compare(a: Value, b: Value) -> Result<Option<std::cmp::Ordering>, RuntimeError> {
    let ordering = match (&a, &b) {
        (Value::Int32(x), Value::Int32(y)) => x.partial_cmp(y),
        (Value::Int64(x), Value::Int64(y)) => x.partial_cmp(y),
        (Value::Int32(x), Value::Int64(y)) => (*x as i64).partial_cmp(y),
        (Value::Int64(x), Value::Int32(y)) => x.partial_cmp(&(*y as i64)),
        (Value::Float64(x), Value::Float64(y)) => x.partial_cmp(y),
        (Value::Float64(x), Value::Int32(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Int32(x), Value::Float64(y)) => (*x as f64).partial_cmp(y),
        (Value::Char(x), Value::Char(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => x.partial_cmp(y),
        _ => {
            return Err(RuntimeError::mismatch(
                "compare",
                format!("{} and {}", a.describe(), b.describe()),
            ))
        }
    };
    Ok(ordering)
}

fn to_text(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        Value::Char(c) => c.to_string(),
        Value::Int64(n) => n.to_string(),
        other => other.to_string(),
    }
}
