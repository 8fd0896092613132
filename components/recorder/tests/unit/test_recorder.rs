//! Tests for recording and replay through the hook interface

use core_types::{Value, ValueType};
use interpreter::{HookSite, ValueHook};
use recorder::{HookError, Mode, Recorder, SiteTable};
use std::collections::BTreeMap;

use super::{hook_site, record, table};

fn hook_error(result: Result<Value, interpreter::HookFault>) -> HookError {
    let fault = result.unwrap_err();
    fault.downcast_ref::<HookError>().unwrap().clone()
}

#[test]
fn test_recording_returns_values_unchanged() {
    let sites = table();
    let mut recorder = Recorder::new(sites.clone());
    recorder.begin_test("CalcTests::adds");
    for n in [5, 6] {
        let out = recorder
            .on_value(&hook_site(&sites, 0), Value::Int32(n))
            .unwrap();
        assert_eq!(out, Value::Int32(n));
    }
    recorder
        .on_value(&hook_site(&sites, 1), Value::Str("x".into()))
        .unwrap();
    recorder.end_test();

    let profile = recorder.profile("CalcTests::adds").unwrap();
    assert_eq!(profile.len(), 3);
    assert_eq!(profile.value(0, 0), Some(&Value::Int32(5)));
    assert_eq!(profile.value(0, 1), Some(&Value::Int32(6)));
    assert_eq!(profile.first(1).unwrap().ty, ValueType::String);
    assert!(recorder.replay_profile().is_none());
}

#[test]
fn test_profiles_are_kept_per_test() {
    let sites = table();
    let mut recorder = Recorder::new(sites.clone());
    for (test, n) in [("T::a", 1), ("T::b", 2)] {
        recorder.begin_test(test);
        recorder
            .on_value(&hook_site(&sites, 0), Value::Int32(n))
            .unwrap();
        recorder.end_test();
    }
    assert_eq!(recorder.profile("T::a").unwrap().value(0, 0), Some(&Value::Int32(1)));
    assert_eq!(recorder.profile("T::b").unwrap().value(0, 0), Some(&Value::Int32(2)));

    // running a test again starts its profile over
    recorder.begin_test("T::a");
    recorder.end_test();
    assert!(recorder.profile("T::a").unwrap().is_empty());
    assert!(recorder.take_profile("T::b").is_some());
    assert!(recorder.profile("T::b").is_none());
}

#[test]
fn test_replay_serves_override_on_every_occurrence() {
    let sites = table();
    let mut recorder = Recorder::new(sites.clone());
    recorder.set_mode(Mode::Replay);
    recorder.install(0, Value::Int32(9)).unwrap();
    recorder.begin_test("T::a");

    for n in [5, 6, 7] {
        let out = recorder
            .on_value(&hook_site(&sites, 0), Value::Int32(n))
            .unwrap();
        assert_eq!(out, Value::Int32(9));
    }
    let other = recorder
        .on_value(&hook_site(&sites, 1), Value::Str("kept".into()))
        .unwrap();
    assert_eq!(other, Value::Str("kept".into()));

    // replay keeps the observed values, not the overrides
    let replay = recorder.replay_profile().unwrap();
    assert_eq!(replay.test(), "T::a");
    assert_eq!(replay.value(0, 2), Some(&Value::Int32(7)));
    assert!(recorder.profile("T::a").is_none());
}

#[test]
fn test_replay_without_override_passes_through() {
    let sites = table();
    let mut recorder = Recorder::new(sites.clone());
    recorder.set_mode(Mode::Replay);
    recorder.begin_test("T::a");
    let out = recorder
        .on_value(&hook_site(&sites, 0), Value::Int32(5))
        .unwrap();
    assert_eq!(out, Value::Int32(5));
}

#[test]
fn test_hook_outside_a_test_fails() {
    let sites = table();
    let mut recorder = Recorder::new(sites.clone());
    let err = hook_error(recorder.on_value(&hook_site(&sites, 0), Value::Int32(5)));
    assert_eq!(err, HookError::NoCurrentTest { site: 0 });
}

#[test]
fn test_unknown_site_fails() {
    let sites = table();
    let mut recorder = Recorder::new(sites.clone());
    recorder.begin_test("T::a");
    let mut site = hook_site(&sites, 0);
    site.id = 42;
    let err = hook_error(recorder.on_value(&site, Value::Int32(5)));
    assert_eq!(err, HookError::UnknownSite(42));
}

#[test]
fn test_hook_type_must_match_site_table() {
    let sites = table();
    let mut recorder = Recorder::new(sites.clone());
    recorder.begin_test("T::a");
    let site = HookSite {
        ty: ValueType::Int64,
        ..hook_site(&sites, 0)
    };
    let err = hook_error(recorder.on_value(&site, Value::Int64(5)));
    assert!(matches!(err, HookError::SiteType { site: 0, .. }));
}

#[test]
fn test_current_test_follows_begin_and_end() {
    let mut recorder = Recorder::new(table());
    assert_eq!(recorder.current_test(), None);
    recorder.begin_test("T::a");
    assert_eq!(recorder.current_test(), Some("T::a"));
    recorder.end_test();
    assert_eq!(recorder.current_test(), None);
}

#[test]
fn test_mistyped_value_is_rejected_not_recorded() {
    let sites = table();
    let mut recorder = Recorder::new(sites.clone());
    recorder.begin_test("T::a");
    // site 1 is a string field
    let err = hook_error(recorder.on_value(&hook_site(&sites, 1), Value::Int32(1)));
    assert_eq!(
        err,
        HookError::ValueType {
            site: 1,
            expected: ValueType::String,
            found: "int32".into(),
        }
    );
    assert!(recorder.profile("T::a").unwrap().is_empty());

    // null fits a reference site
    recorder
        .on_value(&hook_site(&sites, 1), Value::Null)
        .unwrap();
    assert_eq!(recorder.profile("T::a").unwrap().len(), 1);
}

#[test]
fn test_recorded_objects_are_detached() {
    let sites = SiteTable::from_iter([record(0, ValueType::Object("Box".into()), 10)]);
    let mut recorder = Recorder::new(sites.clone());
    recorder.begin_test("T::a");
    let object = Value::new_object("Box", BTreeMap::from([("n".to_string(), Value::Int32(9))]));
    let out = recorder
        .on_value(&hook_site(&sites, 0), object.clone())
        .unwrap();
    recorder.end_test();

    // the program keeps its own object
    assert_eq!(out, object);
    if let Value::Object(obj) = &out {
        obj.borrow_mut().fields.insert("n".into(), Value::Int32(0));
    }

    let Some(Value::Object(recorded)) = recorder.profile("T::a").unwrap().value(0, 0) else {
        panic!("expected a recorded object");
    };
    assert_eq!(recorded.borrow().fields["n"], Value::Int32(9));
}
