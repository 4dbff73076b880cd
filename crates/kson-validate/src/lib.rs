//! The schema validator (spec.md §4.J): a pure, recursive walk of a
//! value tree against a built [`kson_schema::SchemaNode`] tree, appending
//! diagnostics to a [`Sink`] rather than returning a pass/fail result.
//!
//! Combinator branches (`anyOf`/`oneOf`/`not`/`if`) validate into a
//! throwaway [`TempSink`] so a failed branch never pollutes the caller's
//! sink; only the combinator's own summary diagnostic (or the winning
//! branch's diagnostics, for `allOf`) reaches the real sink.
mod array;
mod number;
mod object;
mod string;

use kson_diagnostics::{DiagnosticKind, Location, Sink, TempSink};
use kson_parser::ValueNode;
use kson_resolve::IdIndex;
use kson_schema::{build_schema, value_to_json, PrimitiveType, SchemaKind, SchemaRef};
use serde_json::Value as JsonValue;

/// Message substring kson-nav's completion filter (§4.M) matches on to
/// drop "missing required property" diagnostics while keeping every
/// other validation failure.
pub const MISSING_REQUIRED_MARKER: &str = "missing required property";

pub(crate) fn emit(sink: &mut Sink, message: impl Into<String>, location: Location) {
    sink.emit(DiagnosticKind::SchemaValidationError, message, location);
}

/// Whether `a` and `b` are equal as JSON-Schema `enum`/`const` values
/// (spec.md §4.J): numbers compare by their `f64` projection, everything
/// else structurally. Mirrors [`kson_parser::values_equal`] but operates
/// on the `serde_json::Value` projection schemas carry their literals in.
#[must_use]
fn json_equal(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => true,
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x == y,
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64() == y.as_f64(),
        (JsonValue::String(x), JsonValue::String(y)) => x == y,
        (JsonValue::Array(x), JsonValue::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            x.len() == y.len() && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| json_equal(v, w)))
        }
        _ => false,
    }
}

/// The structural JSON-Schema type(s) `value` satisfies. A whole-number
/// satisfies both `number` and `integer` (spec.md §4.C: "`1.0` is
/// acceptable where `integer` is required"). An embed block projects to
/// the type its [`kson_schema::value_to_json`] representation would take
/// (a string, its bare content), matching the projection `const`/`enum`
/// already compare against.
fn structural_types(value: &ValueNode) -> Vec<PrimitiveType> {
    use kson_parser::ValueKind;
    match &value.kind {
        ValueKind::Null | ValueKind::Error => vec![PrimitiveType::Null],
        ValueKind::Bool(_) => vec![PrimitiveType::Boolean],
        ValueKind::Number(n) if n.is_integral() => vec![PrimitiveType::Number, PrimitiveType::Integer],
        ValueKind::Number(_) => vec![PrimitiveType::Number],
        ValueKind::String(_) | ValueKind::Embed(_) => vec![PrimitiveType::String],
        ValueKind::List(_) => vec![PrimitiveType::Array],
        ValueKind::Object(_) => vec![PrimitiveType::Object],
    }
}

/// The string content `value` validates string-typed keywords against:
/// a literal string's value, or an embed block's raw content (spec.md
/// §4.F's isomorphism collapses an embed to its content when it is
/// treated as a plain string, same as `value_to_json`).
pub(crate) fn effective_string(value: &ValueNode) -> Option<&str> {
    use kson_parser::ValueKind;
    match &value.kind {
        ValueKind::String(s) => Some(&s.value),
        ValueKind::Embed(e) => Some(&e.content),
        _ => None,
    }
}

/// Follow `$ref` chains starting at `(schema, base_uri)` until a
/// non-`Ref` node is reached, same recipe as
/// `kson_resolve::navigate_by_document_path`'s internal `deref` helper.
/// Returns the input unchanged if resolution fails.
fn deref(resolver: &IdIndex, schema: &SchemaRef, base_uri: &str) -> (SchemaRef, String) {
    let mut current = schema.clone();
    let mut current_base = base_uri.to_string();
    loop {
        let SchemaKind::Ref(reference) = &current.kind else {
            return (current, current_base);
        };
        let Some(resolved) = resolver.resolve_ref(reference, &current_base) else {
            return (current, current_base);
        };
        let (built, _diagnostics) = build_schema(&resolved.value);
        current = built;
        current_base = resolved.base_uri;
    }
}

/// Update the base URI in effect for `schema`'s own subtree: a `$id` on
/// the node rebinds it, exactly as `kson_resolve::IdIndex`'s index walk
/// does when building the index itself.
fn rebind_base(schema: &SchemaRef, base_uri: &str) -> String {
    match &schema.meta.id {
        Some(id) => kson_resolve::uri::resolve(id, base_uri).0,
        None => base_uri.to_string(),
    }
}

/// `validate(value, schema, sink)` (spec.md §4.J): append every
/// constraint violation found while checking `value` against `schema` to
/// `sink`. Never panics and never short-circuits on the first failure —
/// diagnostics are data, collected for the caller to do with as it
/// pleases (report them all, or filter a subset as `kson-nav`'s
/// completion path does).
#[tracing::instrument(skip(value, schema, resolver, sink))]
pub fn validate(value: &ValueNode, schema: &SchemaRef, resolver: &IdIndex, base_uri: &str, sink: &mut Sink) {
    let (schema, base_uri) = deref(resolver, schema, base_uri);
    let base_uri = rebind_base(&schema, &base_uri);
    validate_kind(value, &schema, resolver, &base_uri, sink);
}

#[allow(clippy::too_many_lines)]
fn validate_kind(value: &ValueNode, schema: &SchemaRef, resolver: &IdIndex, base_uri: &str, sink: &mut Sink) {
    match &schema.kind {
        SchemaKind::True | SchemaKind::Universal => {}
        SchemaKind::False => emit(sink, "no value satisfies a `false` schema", value.location),
        SchemaKind::Null => {
            if !value.is_null() {
                emit(sink, "expected null", value.location);
            }
        }
        SchemaKind::Boolean => {
            if value.as_bool().is_none() {
                emit(sink, "expected a boolean", value.location);
            }
        }
        SchemaKind::Number(c) => number::validate(value, c, false, sink),
        SchemaKind::Integer(c) => number::validate(value, c, true, sink),
        SchemaKind::String(c) => string::validate(value, c, sink),
        SchemaKind::Array(a) => array::validate(value, a, resolver, base_uri, sink),
        SchemaKind::Object(o) => object::validate(value, o, resolver, base_uri, sink),
        SchemaKind::Const(expected) => {
            if !json_equal(&value_to_json(value), expected) {
                emit(sink, format!("expected the literal value `{expected}`"), value.location);
            }
        }
        SchemaKind::Enum(options) => {
            let actual = value_to_json(value);
            if !options.iter().any(|o| json_equal(&actual, o)) {
                emit(sink, "value does not match any allowed enum member", value.location);
            }
        }
        SchemaKind::MultipleType(types) => {
            let actual = structural_types(value);
            if !types.iter().any(|t| actual.contains(t)) {
                let wanted: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
                emit(sink, format!("expected one of type: {}", wanted.join(", ")), value.location);
            }
        }
        SchemaKind::AllOf(subs) => {
            for sub in subs {
                validate(value, sub, resolver, base_uri, sink);
            }
        }
        SchemaKind::AnyOf(subs) => validate_any_of(value, subs, resolver, base_uri, schema.location, sink),
        SchemaKind::OneOf(subs) => validate_one_of(value, subs, resolver, base_uri, schema.location, sink),
        SchemaKind::Not(inner) => {
            let mut temp = TempSink::new();
            validate(value, inner, resolver, base_uri, &mut temp);
            if temp.succeeded() {
                emit(sink, "value must not match the `not` schema", value.location);
            }
        }
        SchemaKind::IfThenElse { if_, then, else_ } => {
            let mut probe = TempSink::new();
            validate(value, if_, resolver, base_uri, &mut probe);
            let branch = if probe.succeeded() { then.as_ref() } else { else_.as_ref() };
            if let Some(branch) = branch {
                validate(value, branch, resolver, base_uri, sink);
            }
        }
        SchemaKind::Ref(_) => unreachable!("validate() derefs before dispatching"),
        SchemaKind::Dependencies(entries) => validate_dependencies(value, entries, resolver, base_uri, sink),
        SchemaKind::PropertyNames(inner) => validate_property_names(value, inner, resolver, base_uri, sink),
    }
}

fn validate_any_of(
    value: &ValueNode,
    subs: &[SchemaRef],
    resolver: &IdIndex,
    base_uri: &str,
    location: Location,
    sink: &mut Sink,
) {
    let mut any_succeeded = false;
    for sub in subs {
        let mut temp = TempSink::new();
        validate(value, sub, resolver, base_uri, &mut temp);
        if temp.succeeded() {
            any_succeeded = true;
            temp.discard();
            break;
        }
        temp.discard();
    }
    if !any_succeeded {
        emit(sink, "value matches none of the `anyOf` branches", location);
    }
}

fn validate_one_of(
    value: &ValueNode,
    subs: &[SchemaRef],
    resolver: &IdIndex,
    base_uri: &str,
    location: Location,
    sink: &mut Sink,
) {
    let successes = subs
        .iter()
        .filter(|sub| {
            let mut temp = TempSink::new();
            validate(value, sub, resolver, base_uri, &mut temp);
            let ok = temp.succeeded();
            temp.discard();
            ok
        })
        .count();
    match successes {
        0 => emit(sink, "value matches none of the `oneOf` branches", location),
        1 => {}
        k => emit(sink, format!("value matches multiple `oneOf` branches ({k})"), location),
    }
}

fn validate_dependencies(
    value: &ValueNode,
    entries: &[(String, kson_schema::DependencyKind)],
    resolver: &IdIndex,
    base_uri: &str,
    sink: &mut Sink,
) {
    let Some(obj) = value.as_object() else {
        return;
    };
    for (key, kind) in entries {
        if obj.get(key).is_none() {
            continue;
        }
        match kind {
            kson_schema::DependencyKind::Property(required) => {
                for req in required {
                    if obj.get(req).is_none() {
                        emit(
                            sink,
                            format!("`{key}` requires sibling property `{req}`"),
                            value.location,
                        );
                    }
                }
            }
            kson_schema::DependencyKind::Schema(schema) => validate(value, schema, resolver, base_uri, sink),
        }
    }
}

fn validate_property_names(
    value: &ValueNode,
    inner: &SchemaRef,
    resolver: &IdIndex,
    base_uri: &str,
    sink: &mut Sink,
) {
    let Some(obj) = value.as_object() else {
        return;
    };
    for entry in &obj.entries {
        let key_node = ValueNode::new(
            entry.key_location,
            kson_parser::ValueKind::String(kson_parser::StringData {
                value: entry.key.clone(),
                quote: kson_parser::QuoteStyle::Unquoted,
            }),
        );
        validate(&key_node, inner, resolver, base_uri, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_parser::{parse, ParseConfig};
    use std::rc::Rc;

    fn check(schema_src: &str, value_src: &str) -> Sink {
        let schema_root = Rc::new(parse(schema_src, &ParseConfig::default()).document.root);
        let (schema, _) = build_schema(&schema_root);
        let index = IdIndex::build(Rc::clone(&schema_root), "");
        let value = parse(value_src, &ParseConfig::default()).document.root;
        let mut sink = Sink::new();
        validate(&value, &schema, &index, "", &mut sink);
        sink
    }

    #[test]
    fn accepts_matching_scalar() {
        assert!(check("type: string\nminLength: 2", "\"hi\"").is_empty());
    }

    #[test]
    fn rejects_type_mismatch() {
        assert_eq!(check("type: string", "42").len(), 1);
    }

    #[test]
    fn rejects_short_string() {
        let sink = check("type: string\nminLength: 5", "\"hi\"");
        assert_eq!(sink.len(), 1);
        assert!(sink.iter().next().unwrap().message.contains("length"));
    }

    #[test]
    fn reports_missing_required_with_marker() {
        let sink = check("properties: {name: {type: string}}\nrequired: [name]", "{}");
        assert_eq!(sink.len(), 1);
        assert!(sink.iter().next().unwrap().message.contains(MISSING_REQUIRED_MARKER));
    }

    #[test]
    fn any_of_succeeds_on_first_match() {
        assert!(check("anyOf: [{type: string}, {type: number}]", "42").is_empty());
    }

    #[test]
    fn any_of_fails_when_no_branch_matches() {
        assert_eq!(check("anyOf: [{type: string}, {type: number}]", "true").len(), 1);
    }

    #[test]
    fn one_of_rejects_multiple_matches() {
        let sink = check("oneOf: [{minimum: 0}, {maximum: 100}]", "50");
        assert_eq!(sink.len(), 1);
        assert!(sink.iter().next().unwrap().message.contains("multiple"));
    }

    #[test]
    fn not_rejects_matching_inner_schema() {
        assert_eq!(check("not: {type: string}", "\"nope\"").len(), 1);
        assert!(check("not: {type: string}", "42").is_empty());
    }

    #[test]
    fn if_then_else_applies_matching_branch() {
        let schema = "if: {type: string}\nthen: {minLength: 3}\nelse: {minimum: 10}";
        assert!(check(schema, "\"abc\"").is_empty());
        assert_eq!(check(schema, "\"a\"").len(), 1);
        assert!(check(schema, "20").is_empty());
        assert_eq!(check(schema, "1").len(), 1);
    }

    #[test]
    fn ref_is_followed_to_its_definition() {
        let schema = "$defs: {pos: {type: number, minimum: 0}}\n$ref: \"#/$defs/pos\"";
        assert!(check(schema, "5").is_empty());
        assert_eq!(check(schema, "-1").len(), 1);
    }

    #[test]
    fn const_uses_numeric_projection_equality() {
        assert!(check("const: 1", "1.0").is_empty());
    }

    #[test]
    fn unicode_length_counts_code_points_not_bytes() {
        assert!(check("type: string\nminLength: 2\nmaxLength: 2", "\"\u{1F600}\u{1F600}\"").is_empty());
    }
}
