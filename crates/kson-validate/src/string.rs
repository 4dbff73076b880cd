//! String constraint validation (spec.md §4.J): `minLength`/`maxLength`
//! (counted in Unicode code points, not UTF-16 or byte units) and
//! `pattern`.
//!
//! Per spec.md §9's "Pattern-property regex compilation" design note, an
//! invalid `pattern` is swallowed during navigation but reported as a
//! validation error here during full validation.

use kson_diagnostics::Sink;
use kson_parser::ValueNode;
use kson_schema::StringConstraints;

use crate::{effective_string, emit};

pub(crate) fn validate(value: &ValueNode, constraints: &StringConstraints, sink: &mut Sink) {
    let Some(s) = effective_string(value) else {
        emit(sink, "expected a string", value.location);
        return;
    };
    let len = s.chars().count() as u64;
    if let Some(min) = constraints.min_length {
        if len < min {
            emit(sink, format!("string of length {len} is shorter than minLength {min}"), value.location);
        }
    }
    if let Some(max) = constraints.max_length {
        if len > max {
            emit(sink, format!("string of length {len} is longer than maxLength {max}"), value.location);
        }
    }
    if let Some(pattern) = &constraints.pattern {
        match regex::Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(s) {
                    emit(sink, format!("string does not match pattern `{pattern}`"), value.location);
                }
            }
            Err(_) => emit(sink, format!("pattern `{pattern}` is not a valid regular expression"), value.location),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_diagnostics::Sink;
    use kson_parser::{parse, ParseConfig};

    fn value(src: &str) -> ValueNode {
        parse(src, &ParseConfig::default()).document.root
    }

    #[test]
    fn rejects_non_string() {
        let mut sink = Sink::new();
        validate(&value("42"), &StringConstraints::default(), &mut sink);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn enforces_length_bounds_in_code_points() {
        let constraints = StringConstraints {
            min_length: Some(2),
            max_length: Some(2),
            ..StringConstraints::default()
        };
        let mut sink = Sink::new();
        validate(&value("\"\u{1F600}\u{1F600}\""), &constraints, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn rejects_string_below_min_length() {
        let constraints = StringConstraints {
            min_length: Some(5),
            ..StringConstraints::default()
        };
        let mut sink = Sink::new();
        validate(&value("\"hi\""), &constraints, &mut sink);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn enforces_pattern_match() {
        let constraints = StringConstraints {
            pattern: Some("^[a-z]+$".to_string()),
            ..StringConstraints::default()
        };
        assert!(validate_ok(&constraints, "\"abc\""));
        assert!(!validate_ok(&constraints, "\"ABC\""));
    }

    #[test]
    fn invalid_pattern_is_reported_as_a_validation_error() {
        let constraints = StringConstraints {
            pattern: Some("(".to_string()),
            ..StringConstraints::default()
        };
        let mut sink = Sink::new();
        validate(&value("\"abc\""), &constraints, &mut sink);
        assert_eq!(sink.len(), 1);
    }

    fn validate_ok(constraints: &StringConstraints, src: &str) -> bool {
        let mut sink = Sink::new();
        validate(&value(src), constraints, &mut sink);
        sink.is_empty()
    }
}
