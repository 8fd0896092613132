//! Integration test suite for IVMP fault localization
//!
//! This crate provides the shared fixture the integration tests run
//! against: a production module `Calc` with one local load (line 10) and
//! one static field load (line 12), and a test module `CalcTests`.
//!
//! ```text
//! static int compute() {
//!     int y = Feed.next();     // line 10: y is read here
//!     return y + Calc.offset;  // line 12: offset is read here
//! }
//! ```
//!
//! Each test sets `Feed.value` and `Calc.offset`, then asserts on
//! `compute()`:
//!
//! | test      | feed | offset | expects |
//! |-----------|------|--------|---------|
//! | low_feed  | 3    | 7      | 10      |
//! | high_feed | 9    | 1      | 10      |
//! | target    | 5    | 7      | 16      |
//!
//! `target` fails with 12; substituting 9 for `y` fixes it.

use bytecode_system::{ClassDef, FieldRef, MethodDef, MethodRef, Module, ModuleFiles, Opcode};
use core_types::{SourceLocation, ValueType};
use std::path::Path;

/// Re-export components for test convenience
pub mod components {
    pub use bytecode_system;
    pub use core_types;
    pub use instrumenter;
    pub use interpreter;
    pub use ivmp_cli;
    pub use localizer;
    pub use recorder;
}

/// Source document of the production module
pub const CALC_SOURCE: &str = "src/calc.src";

/// Id of the failing test
pub const FAILING_TEST: &str = "CalcTests::target";

fn at(line: u32, start: u32, end: u32) -> SourceLocation {
    SourceLocation::new(CALC_SOURCE, line, line, start, end)
}

/// The production module
pub fn calc_module() -> Module {
    let mut module = Module::new("Calc");
    module.add_class(ClassDef::new("Calc").with_static_field("offset", ValueType::Int32));

    let mut compute = MethodDef::new("Calc", "compute")
        .with_locals(vec![ValueType::Int32])
        .returning(ValueType::Int32);
    compute.emit_at(Opcode::Call(MethodRef::new("Feed", "next")), at(10, 13, 24));
    compute.emit(Opcode::StoreLocal(0));
    compute.emit_at(Opcode::LoadLocal(0), at(10, 9, 10));
    compute.emit_at(
        Opcode::LoadStaticField(FieldRef::new("Calc", "offset")),
        at(12, 16, 27),
    );
    compute.emit(Opcode::Add);
    compute.emit(Opcode::Return);
    module.add_method(compute);
    module
}

fn scenario_test(name: &str, feed: i32, offset: i32, expected: i32) -> MethodDef {
    let mut m = MethodDef::new("CalcTests", name).with_attribute("Test");
    m.emit(Opcode::LoadInt32(feed));
    m.emit(Opcode::StoreStaticField(FieldRef::new("Feed", "value")));
    m.emit(Opcode::LoadInt32(offset));
    m.emit(Opcode::StoreStaticField(FieldRef::new("Calc", "offset")));
    m.emit(Opcode::Call(MethodRef::new("Calc", "compute")));
    m.emit(Opcode::LoadInt32(expected));
    m.emit(Opcode::CompareEqual);
    let jump = m.emit(Opcode::JumpIfTrue(0));
    m.emit(Opcode::LoadString(format!("expected {}", expected)));
    m.emit(Opcode::Throw);
    let done = m.emit(Opcode::Return);
    m.patch_jump(jump, done);
    m
}

/// The test module, including the `Feed` input class
pub fn tests_module() -> Module {
    let mut module = Module::new("CalcTests");
    module.add_class(ClassDef::new("Feed").with_static_field("value", ValueType::Int32));
    module.add_class(ClassDef::new("CalcTests"));

    let mut next = MethodDef::new("Feed", "next").returning(ValueType::Int32);
    next.emit(Opcode::LoadStaticField(FieldRef::new("Feed", "value")));
    next.emit(Opcode::Return);
    module.add_method(next);

    module.add_method(scenario_test("low_feed", 3, 7, 10));
    module.add_method(scenario_test("high_feed", 9, 1, 10));
    module.add_method(scenario_test("target", 5, 7, 16));
    module
}

/// Write both modules into `dir` as `Calc.ivm` and `CalcTests.ivm`
pub fn write_project(dir: &Path) -> (ModuleFiles, ModuleFiles) {
    let calc = ModuleFiles::for_binary(dir.join("Calc.ivm"));
    let tests = ModuleFiles::for_binary(dir.join("CalcTests.ivm"));
    calc.store(&calc_module()).expect("write Calc");
    tests.store(&tests_module()).expect("write CalcTests");
    (calc, tests)
}
