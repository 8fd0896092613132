//! Tests for the binary module format

use bytecode_system::{
    decode_module, encode_module, BuildInfo, ClassDef, DebugInfo, FieldRef, MethodDef, MethodRef,
    Module, ModuleError, Opcode,
};
use core_types::{SourceLocation, ValueType};

fn every_operand_kind() -> Module {
    let mut module = Module::new("Kitchen");
    module.build = BuildInfo {
        optimized: false,
        debug_info: DebugInfo::SymbolsOnly,
    };
    module.add_class(ClassDef::new("Point").with_field("x", ValueType::Float64));
    let mut m = MethodDef::new("Point", "all")
        .instance()
        .with_locals(vec![ValueType::Object("Point".into()), ValueType::Char])
        .with_attribute("Test");
    m.emit(Opcode::LoadInt64(-7));
    m.emit(Opcode::LoadFloat64(1.5));
    m.emit(Opcode::LoadChar('λ'));
    m.emit(Opcode::LoadString("héllo".into()));
    m.emit(Opcode::LoadField(FieldRef::new("Point", "x")));
    m.emit(Opcode::LoadVirtualFunction(MethodRef::new("Point", "len")));
    m.emit(Opcode::NewArray(ValueType::Object("Point".into())));
    m.emit(Opcode::CallHook(ValueType::Float64));
    m.emit(Opcode::JumpIfTrue(0));
    m.emit(Opcode::Return);
    module.add_method(m);
    module
}

#[test]
fn test_every_operand_kind_survives() {
    let module = every_operand_kind();
    let restored = decode_module(&encode_module(&module)).unwrap();
    assert_eq!(restored, module);
}

#[test]
fn test_locations_and_sites_are_not_encoded() {
    let mut module = Module::new("Calc");
    let mut m = MethodDef::new("Calc", "f");
    m.emit_at(Opcode::Return, SourceLocation::new("calc.src", 1, 1, 1, 2));
    module.add_method(m);

    let restored = decode_module(&encode_module(&module)).unwrap();
    assert!(restored.methods[0].instructions()[0].location.is_none());
    assert!(restored.sites.is_empty());
}

#[test]
fn test_metadata_changes_bytes() {
    let mut module = Module::new("Calc");
    let before = encode_module(&module);
    module
        .metadata
        .insert("ivmp.rewriter.fingerprint".into(), "abc".into());
    assert_ne!(before, encode_module(&module));
}

#[test]
fn test_empty_input() {
    assert!(matches!(
        decode_module(&[]),
        Err(ModuleError::InvalidHeader(_))
    ));
}

#[test]
fn test_unknown_opcode_tag() {
    let mut module = Module::new("M");
    let mut m = MethodDef::new("M", "f");
    m.emit(Opcode::Return);
    module.add_method(m);
    let mut bytes = encode_module(&module);
    // the return opcode is the final byte
    let last = bytes.len() - 1;
    bytes[last] = 0xEE;
    assert!(matches!(
        decode_module(&bytes),
        Err(ModuleError::UnknownOpcode { tag: 0xEE, .. })
    ));
}
