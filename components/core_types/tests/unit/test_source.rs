//! Unit tests for SourceLocation and StackFrame

use core_types::{SourceLocation, StackFrame, HIDDEN_LINE};

#[cfg(test)]
mod source_location_tests {
    use super::*;

    #[test]
    fn test_hidden_location_uses_reserved_line() {
        let loc = SourceLocation::hidden("file:///a.cs");
        assert_eq!(loc.start_line, HIDDEN_LINE);
        assert_eq!(loc.end_line, HIDDEN_LINE);
        assert!(loc.is_hidden());
    }

    #[test]
    fn test_source_location_json_roundtrip() {
        let loc = SourceLocation::new("file:///a.cs", 3, 4, 1, 20);
        let json = serde_json::to_string(&loc).unwrap();
        assert!(json.contains("\"start_line\":3"));
        let back: SourceLocation = serde_json::from_str(&json).unwrap();
        assert_eq!(loc, back);
    }
}

#[cfg(test)]
mod stack_frame_tests {
    use super::*;

    #[test]
    fn test_stack_frame_with_location() {
        let frame = StackFrame {
            method: "Calc::div".to_string(),
            instruction: 4,
            location: Some(SourceLocation::new("calc.cs", 12, 12, 9, 14)),
        };
        assert_eq!(frame.to_string(), "at Calc::div [4] (calc.cs:12:9-12:14)");
    }
}
