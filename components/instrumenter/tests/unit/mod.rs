//! Unit tests for the instrumenter
//!
//! Modules are written to a temporary directory and rewritten through the
//! same file layer the CLI uses.

mod test_fidelity;

use bytecode_system::{ClassDef, FieldRef, MethodDef, Module, ModuleFiles, Opcode};
use core_types::{SourceLocation, ValueType};
use std::path::Path;

pub fn at(line: u32) -> SourceLocation {
    SourceLocation::new("calc.src", line, line, 9, 14)
}

/// static int triple_plus_one(int x) { int y = x * 3; return y + 1; }
pub fn triple_plus_one() -> MethodDef {
    let mut m = MethodDef::new("Calc", "triple_plus_one")
        .with_params(vec![ValueType::Int32])
        .with_locals(vec![ValueType::Int32])
        .returning(ValueType::Int32);
    m.emit_at(Opcode::LoadArg(0), at(2));
    m.emit(Opcode::LoadInt32(3));
    m.emit(Opcode::Mul);
    m.emit(Opcode::StoreLocal(0));
    m.emit_at(Opcode::LoadLocal(0), at(3));
    m.emit(Opcode::LoadInt32(1));
    m.emit(Opcode::Add);
    m.emit(Opcode::Return);
    m
}

/// static int sum_down(int n) { int acc = 0; while (n) { acc += n; n -= 1; } return acc; }
pub fn sum_down() -> MethodDef {
    let mut m = MethodDef::new("Calc", "sum_down")
        .with_params(vec![ValueType::Int32])
        .with_locals(vec![ValueType::Int32])
        .returning(ValueType::Int32);
    m.emit_at(Opcode::LoadInt32(0), at(5)); // 0
    m.emit(Opcode::StoreLocal(0)); // 1
    m.emit_at(Opcode::LoadArg(0), at(6)); // 2
    m.emit(Opcode::JumpIfFalse(13)); // 3
    m.emit_at(Opcode::LoadLocal(0), at(7)); // 4
    m.emit(Opcode::LoadArg(0)); // 5
    m.emit(Opcode::Add); // 6
    m.emit(Opcode::StoreLocal(0)); // 7
    m.emit_at(Opcode::LoadArg(0), at(8)); // 8
    m.emit(Opcode::LoadInt32(1)); // 9
    m.emit(Opcode::Sub); // 10
    m.emit(Opcode::StoreArg(0)); // 11
    m.emit(Opcode::Jump(2)); // 12
    m.emit_at(Opcode::LoadLocal(0), at(9)); // 13
    m.emit(Opcode::Return); // 14
    m
}

/// static string label() { return Calc.name; }
pub fn label() -> MethodDef {
    let mut m = MethodDef::new("Calc", "label").returning(ValueType::String);
    m.emit_at(
        Opcode::LoadStaticField(FieldRef::new("Calc", "name")),
        at(11),
    );
    m.emit(Opcode::Return);
    m
}

pub fn calc_module() -> Module {
    let mut module = Module::new("Calc");
    module.add_class(ClassDef::new("Calc").with_static_field("name", ValueType::String));
    module.add_method(triple_plus_one());
    module.add_method(sum_down());
    module.add_method(label());
    module.add_method(MethodDef::new("Calc", "native_hash").external());
    module
}

/// Module with a single static method reading one argument
pub fn echo_module(name: &str) -> Module {
    let mut module = Module::new(name);
    let mut m = MethodDef::new(name, "echo")
        .with_params(vec![ValueType::Int64])
        .returning(ValueType::Int64);
    m.emit_at(Opcode::LoadArg(0), at(1));
    m.emit(Opcode::Return);
    module.add_method(m);
    module
}

pub fn write_module(dir: &Path, module: &Module) -> ModuleFiles {
    let files = ModuleFiles::for_binary(dir.join(format!("{}.ivm", module.name)));
    files.store(module).unwrap();
    files
}
