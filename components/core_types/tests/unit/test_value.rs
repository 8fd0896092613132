//! Unit tests for Value and ValueType

use core_types::{Value, ValueType};
use std::collections::BTreeMap;

#[cfg(test)]
mod value_type_tests {
    use super::*;

    #[test]
    fn test_primitive_types_are_value_types() {
        for ty in [
            ValueType::Int32,
            ValueType::Int64,
            ValueType::Float64,
            ValueType::Bool,
            ValueType::Char,
        ] {
            assert!(ty.is_value_type(), "{} should be a value type", ty);
        }
    }

    #[test]
    fn test_reference_types() {
        assert!(ValueType::String.is_reference_type());
        assert!(ValueType::Object("Account".to_string()).is_reference_type());
    }

    #[test]
    fn test_value_type_serde_json() {
        let ty = ValueType::Object("Account".to_string());
        let json = serde_json::to_string(&ty).unwrap();
        let back: ValueType = serde_json::from_str(&json).unwrap();
        assert_eq!(ty, back);
    }
}

#[cfg(test)]
mod value_tests {
    use super::*;

    #[test]
    fn test_null_assignability() {
        assert!(Value::Null.is_assignable_to(&ValueType::String));
        assert!(Value::Null.is_assignable_to(&ValueType::Object("A".to_string())));
        assert!(!Value::Null.is_assignable_to(&ValueType::Bool));
    }

    #[test]
    fn test_boxed_value_is_not_assignable_to_primitive() {
        let boxed = Value::Int32(3).boxed();
        assert!(!boxed.is_assignable_to(&ValueType::Int32));
        assert_eq!(boxed.describe(), "boxed int32");
    }

    #[test]
    fn test_object_fields_are_shared() {
        let obj = Value::new_object("Counter", BTreeMap::new());
        if let Value::Object(handle) = &obj {
            handle
                .borrow_mut()
                .fields
                .insert("count".to_string(), Value::Int32(7));
        }
        let alias = obj.clone();
        match alias {
            Value::Object(handle) => {
                assert_eq!(handle.borrow().fields.get("count"), Some(&Value::Int32(7)));
            }
            _ => panic!("Expected Object"),
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Int32(5).to_string(), "5");
        assert_eq!(Value::Int64(5).to_string(), "5L");
        assert_eq!(Value::Str("a".to_string()).to_string(), "\"a\"");
        assert_eq!(Value::Int32(5).boxed().to_string(), "box(5)");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Int32(0).is_truthy());
        assert!(Value::Int32(-1).is_truthy());
        assert!(!Value::Float64(f64::NAN).is_truthy());
        assert!(!Value::Null.is_truthy());
    }
}
