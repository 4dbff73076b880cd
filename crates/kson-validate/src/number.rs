//! Numeric constraint validation (spec.md §4.J): `minimum`/`maximum`/
//! `exclusiveMinimum`/`exclusiveMaximum`/`multipleOf`, plus the
//! `type: number` / `type: integer` check itself.

use kson_diagnostics::Sink;
use kson_parser::ValueNode;
use kson_schema::NumberConstraints;

use crate::emit;

/// How close a quotient needs to be to its nearest integer to count as a
/// `multipleOf` match, absorbing `f64` rounding error.
const MULTIPLE_OF_EPSILON: f64 = 1e-9;

pub(crate) fn validate(value: &ValueNode, constraints: &NumberConstraints, is_integer: bool, sink: &mut Sink) {
    let Some(n) = value.as_number() else {
        emit(sink, if is_integer { "expected an integer" } else { "expected a number" }, value.location);
        return;
    };
    if is_integer && !n.is_integral() {
        emit(sink, "expected an integer", value.location);
        return;
    }
    let actual = n.as_f64();
    if let Some(min) = constraints.minimum {
        if actual < min {
            emit(sink, format!("{actual} is less than the minimum {min}"), value.location);
        }
    }
    if let Some(max) = constraints.maximum {
        if actual > max {
            emit(sink, format!("{actual} is greater than the maximum {max}"), value.location);
        }
    }
    if let Some(min) = constraints.exclusive_minimum {
        if actual <= min {
            emit(
                sink,
                format!("{actual} is not strictly greater than the exclusive minimum {min}"),
                value.location,
            );
        }
    }
    if let Some(max) = constraints.exclusive_maximum {
        if actual >= max {
            emit(
                sink,
                format!("{actual} is not strictly less than the exclusive maximum {max}"),
                value.location,
            );
        }
    }
    if let Some(m) = constraints.multiple_of {
        if m != 0.0 {
            let quotient = actual / m;
            if (quotient - quotient.round()).abs() > MULTIPLE_OF_EPSILON {
                emit(sink, format!("{actual} is not a multiple of {m}"), value.location);
            }
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
    fn rejects_non_number() {
        let mut sink = Sink::new();
        validate(&value("\"nope\""), &NumberConstraints::default(), false, &mut sink);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn rejects_fractional_value_as_integer() {
        let mut sink = Sink::new();
        validate(&value("1.5"), &NumberConstraints::default(), true, &mut sink);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn accepts_whole_decimal_as_integer() {
        let mut sink = Sink::new();
        validate(&value("1.0"), &NumberConstraints::default(), true, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn enforces_bounds() {
        let constraints = NumberConstraints {
            minimum: Some(0.0),
            maximum: Some(10.0),
            ..NumberConstraints::default()
        };
        let mut sink = Sink::new();
        validate(&value("-1"), &constraints, false, &mut sink);
        assert_eq!(sink.len(), 1);
        let mut sink = Sink::new();
        validate(&value("11"), &constraints, false, &mut sink);
        assert_eq!(sink.len(), 1);
        let mut sink = Sink::new();
        validate(&value("5"), &constraints, false, &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn exclusive_bounds_reject_the_boundary_itself() {
        let constraints = NumberConstraints {
            exclusive_minimum: Some(0.0),
            exclusive_maximum: Some(10.0),
            ..NumberConstraints::default()
        };
        let mut sink = Sink::new();
        validate(&value("0"), &constraints, false, &mut sink);
        assert_eq!(sink.len(), 1);
        let mut sink = Sink::new();
        validate(&value("10"), &constraints, false, &mut sink);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn multiple_of_checks_tolerate_float_error() {
        let constraints = NumberConstraints {
            multiple_of: Some(0.1),
            ..NumberConstraints::default()
        };
        let mut sink = Sink::new();
        validate(&value("0.3"), &constraints, false, &mut sink);
        assert!(sink.is_empty());
        let mut sink = Sink::new();
        validate(&value("0.25"), &constraints, false, &mut sink);
        assert_eq!(sink.len(), 1);
    }
}
