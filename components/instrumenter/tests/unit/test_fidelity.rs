//! Instrumented modules behave like the originals

use bytecode_system::{stack_depths, MethodRef, Module};
use core_types::Value;
use instrumenter::{instrument, SiteIdAllocator};
use interpreter::{HookFault, HookSite, PassThrough, ValueHook, VM};

use super::calc_module;

#[derive(Default)]
struct Spy {
    seen: Vec<(u32, Value)>,
    replace: Option<(u32, Value)>,
}

impl ValueHook for Spy {
    fn on_value(&mut self, site: &HookSite, value: Value) -> Result<Value, HookFault> {
        self.seen.push((site.id, value.clone()));
        match &self.replace {
            Some((id, v)) if *id == site.id => Ok(v.clone()),
            _ => Ok(value),
        }
    }
}

fn instrumented() -> Module {
    let mut module = calc_module();
    let fields = module.clone();
    instrument(&mut module, &fields, &mut SiteIdAllocator::starting_at(0)).unwrap();
    module
}

fn run(module: Module, method: &str, arg: i32, hook: &mut dyn ValueHook) -> Option<Value> {
    VM::load(vec![module])
        .unwrap()
        .invoke(&MethodRef::new("Calc", method), vec![Value::Int32(arg)], hook)
        .unwrap()
}

#[test]
fn test_results_match_the_original() {
    for (method, arg) in [("triple_plus_one", 4), ("sum_down", 3), ("sum_down", 0)] {
        let expected = run(calc_module(), method, arg, &mut PassThrough);
        let actual = run(instrumented(), method, arg, &mut Spy::default());
        assert_eq!(actual, expected, "{}({})", method, arg);
    }
}

#[test]
fn test_recorded_values_are_the_loaded_values() {
    let mut spy = Spy::default();
    let result = run(instrumented(), "triple_plus_one", 4, &mut spy);
    assert_eq!(result, Some(Value::Int32(13)));
    assert_eq!(spy.seen, vec![(0, Value::Int32(4)), (1, Value::Int32(12))]);
}

#[test]
fn test_loop_sites_fire_on_every_iteration() {
    let mut spy = Spy::default();
    run(instrumented(), "sum_down", 3, &mut spy);
    // site 2 is the loop condition `n`
    let condition: Vec<_> = spy
        .seen
        .iter()
        .filter(|(id, _)| *id == 2)
        .map(|(_, v)| v.clone())
        .collect();
    assert_eq!(
        condition,
        vec![
            Value::Int32(3),
            Value::Int32(2),
            Value::Int32(1),
            Value::Int32(0)
        ]
    );
}

#[test]
fn test_override_changes_only_its_site() {
    let mut spy = Spy {
        replace: Some((1, Value::Int32(100))),
        ..Spy::default()
    };
    let result = run(instrumented(), "triple_plus_one", 4, &mut spy);
    assert_eq!(result, Some(Value::Int32(101)));
    // the hook still observes the original value at both sites
    assert_eq!(spy.seen, vec![(0, Value::Int32(4)), (1, Value::Int32(12))]);
}

#[test]
fn test_reference_site_passes_null_through() {
    let mut spy = Spy::default();
    let result = VM::load(vec![instrumented()])
        .unwrap()
        .invoke(&MethodRef::new("Calc", "label"), vec![], &mut spy)
        .unwrap();
    assert_eq!(result, Some(Value::Null));
    assert_eq!(spy.seen, vec![(7, Value::Null)]);
}

#[test]
fn test_stack_depth_unchanged_at_every_original_instruction() {
    let original = calc_module();
    let rewritten = instrumented();
    for (before, after) in original.methods.iter().zip(&rewritten.methods) {
        if before.body.is_none() {
            continue;
        }
        let depths_before = stack_depths(before, &original).unwrap();
        let depths_after = stack_depths(after, &rewritten).unwrap();
        let kept: Vec<usize> = after
            .instructions()
            .iter()
            .enumerate()
            .filter(|(_, inst)| !inst.is_hidden())
            .map(|(index, _)| index)
            .collect();
        assert_eq!(kept.len(), depths_before.len(), "{}", before.name);
        for (orig, new) in kept.into_iter().enumerate() {
            assert_eq!(depths_before[orig], depths_after[new], "{} @{}", before.name, orig);
        }
    }
}
