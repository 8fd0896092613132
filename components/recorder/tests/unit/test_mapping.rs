//! Tests for override installation

use core_types::{Value, ValueType};
use recorder::{HookError, Recorder, SubstitutionMapping};

use super::table;

#[test]
fn test_install_and_uninstall() {
    let sites = table();
    let mut mapping = SubstitutionMapping::new();
    mapping.install(&sites, 0, Value::Int32(9)).unwrap();
    assert_eq!(mapping.get(0), Some(&Value::Int32(9)));
    assert_eq!(mapping.len(), 1);
    assert_eq!(mapping.uninstall(0), Some(Value::Int32(9)));
    assert!(mapping.is_empty());
    assert_eq!(mapping.uninstall(0), None);
}

#[test]
fn test_install_rejects_wrong_type() {
    let sites = table();
    let mut mapping = SubstitutionMapping::new();
    let err = mapping
        .install(&sites, 0, Value::Str("nine".into()))
        .unwrap_err();
    assert_eq!(
        err,
        HookError::OverrideType {
            site: 0,
            expected: ValueType::Int32,
            found: "string".into(),
        }
    );
    assert!(mapping.is_empty());
}

#[test]
fn test_null_override_only_for_references() {
    let sites = table();
    let mut mapping = SubstitutionMapping::new();
    assert!(mapping.install(&sites, 1, Value::Null).is_ok());
    assert!(mapping.install(&sites, 0, Value::Null).is_err());
}

#[test]
fn test_install_unknown_site() {
    let sites = table();
    let mut mapping = SubstitutionMapping::new();
    assert_eq!(
        mapping.install(&sites, 5, Value::Int32(1)),
        Err(HookError::UnknownSite(5))
    );
}

#[test]
fn test_recorder_clears_overrides() {
    let mut recorder = Recorder::new(table());
    recorder.install(0, Value::Int32(3)).unwrap();
    recorder.install(1, Value::Str("y".into())).unwrap();
    assert_eq!(recorder.mapping().len(), 2);
    recorder.clear_overrides();
    assert!(recorder.mapping().is_empty());
}
