//! Integration tests for interpreter
//!
//! Tests the interaction between the VM and value hooks

use bytecode_system::{ClassDef, FieldRef, Instruction, MethodDef, MethodRef, Module, Opcode};
use core_types::{SourceLocation, Value, ValueType};
use interpreter::{HookFault, HookSite, PassThrough, RuntimeError, ValueHook, VM};

/// Records every call and optionally replaces one site's value
#[derive(Default)]
struct Spy {
    seen: Vec<(HookSite, Value)>,
    replace: Option<(u32, Value)>,
    fail_at: Option<u32>,
}

impl ValueHook for Spy {
    fn on_value(&mut self, site: &HookSite, value: Value) -> Result<Value, HookFault> {
        self.seen.push((site.clone(), value.clone()));
        if self.fail_at == Some(site.id) {
            return Err("hook exploded".into());
        }
        match &self.replace {
            Some((id, v)) if *id == site.id => Ok(v.clone()),
            _ => Ok(value),
        }
    }
}

fn hook_call(method: &mut MethodDef, ty: ValueType, id: i64, line: i32) {
    let boxed = ty.is_value_type();
    let mut seq = Vec::new();
    if boxed {
        seq.push(Opcode::Box(ty.clone()));
    }
    seq.extend([
        Opcode::LoadString("calc.src".into()),
        Opcode::LoadInt32(line),
        Opcode::LoadInt32(line),
        Opcode::LoadInt32(9),
        Opcode::LoadInt32(14),
        Opcode::LoadInt64(id),
        Opcode::CallHook(ty.clone()),
    ]);
    if boxed {
        seq.push(Opcode::Unbox(ty));
    }
    for op in seq {
        method
            .body
            .get_or_insert_with(Vec::new)
            .push(Instruction::hidden(op, "calc.src"));
    }
}

/// int scaled() { int x = 5; return x * this.factor; } with both loads hooked
fn hooked_module() -> Module {
    let mut module = Module::new("Calc");
    module.add_class(ClassDef::new("Calc").with_static_field("factor", ValueType::Int32));
    let mut m = MethodDef::new("Calc", "scaled")
        .with_locals(vec![ValueType::Int32])
        .returning(ValueType::Int32);
    m.emit(Opcode::LoadInt32(5));
    m.emit(Opcode::StoreLocal(0));
    m.emit_at(Opcode::LoadLocal(0), SourceLocation::new("calc.src", 10, 10, 9, 14));
    hook_call(&mut m, ValueType::Int32, 0, 10);
    m.emit_at(
        Opcode::LoadStaticField(FieldRef::new("Calc", "factor")),
        SourceLocation::new("calc.src", 12, 12, 9, 14),
    );
    hook_call(&mut m, ValueType::Int32, 1, 12);
    m.emit(Opcode::Mul);
    m.emit(Opcode::Return);
    module.add_method(m);
    module
}

fn scaled() -> MethodRef {
    MethodRef::new("Calc", "scaled")
}

#[test]
fn test_hook_sees_unboxed_values_in_order() {
    let mut vm = VM::load(vec![hooked_module()]).unwrap();
    let mut spy = Spy::default();
    let result = vm.invoke(&scaled(), vec![], &mut spy).unwrap();
    assert_eq!(result, Some(Value::Int32(0)));

    assert_eq!(spy.seen.len(), 2);
    assert_eq!(spy.seen[0].0.id, 0);
    assert_eq!(spy.seen[0].0.location, SourceLocation::new("calc.src", 10, 10, 9, 14));
    assert_eq!(spy.seen[0].1, Value::Int32(5));
    assert_eq!(spy.seen[1].0.id, 1);
    assert_eq!(spy.seen[1].1, Value::Int32(0));
}

#[test]
fn test_hook_replacement_changes_result() {
    let mut vm = VM::load(vec![hooked_module()]).unwrap();
    let mut spy = Spy {
        replace: Some((1, Value::Int32(3))),
        ..Spy::default()
    };
    let result = vm.invoke(&scaled(), vec![], &mut spy).unwrap();
    assert_eq!(result, Some(Value::Int32(15)));
}

#[test]
fn test_pass_through_matches_uninstrumented_result() {
    let mut vm = VM::load(vec![hooked_module()]).unwrap();
    let result = vm.invoke(&scaled(), vec![], &mut PassThrough).unwrap();
    assert_eq!(result, Some(Value::Int32(0)));
}

#[test]
fn test_hook_wrong_type_rejected() {
    let mut vm = VM::load(vec![hooked_module()]).unwrap();
    let mut spy = Spy {
        replace: Some((0, Value::Str("five".into()))),
        ..Spy::default()
    };
    let err = vm.invoke(&scaled(), vec![], &mut spy).unwrap_err();
    assert!(matches!(err, RuntimeError::HookResultType { site: 0, .. }));
    assert!(err.is_inconclusive());
}

#[test]
fn test_hook_failure_is_reported_with_site() {
    let mut vm = VM::load(vec![hooked_module()]).unwrap();
    let mut spy = Spy {
        fail_at: Some(1),
        ..Spy::default()
    };
    let err = vm.invoke(&scaled(), vec![], &mut spy).unwrap_err();
    assert!(matches!(err, RuntimeError::Hook { site: 1, .. }));
    assert!(err.to_string().contains("hook exploded"));
}

#[test]
fn test_reference_values_pass_unboxed() {
    let mut module = Module::new("S");
    let mut m = MethodDef::new("S", "greet")
        .with_params(vec![ValueType::String])
        .returning(ValueType::String);
    m.emit_at(Opcode::LoadArg(0), SourceLocation::new("s.src", 2, 2, 1, 5));
    hook_call(&mut m, ValueType::String, 7, 2);
    m.emit(Opcode::Return);
    module.add_method(m);

    let mut vm = VM::load(vec![module]).unwrap();
    let mut spy = Spy {
        replace: Some((7, Value::Null)),
        ..Spy::default()
    };
    let result = vm
        .invoke(
            &MethodRef::new("S", "greet"),
            vec![Value::Str("hi".into())],
            &mut spy,
        )
        .unwrap();
    assert_eq!(spy.seen[0].1, Value::Str("hi".into()));
    assert_eq!(result, Some(Value::Null));
}
