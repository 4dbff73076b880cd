//! Converts the embedded draft-07 meta-schema (a `serde_json::Value`
//! constant in `kson-schema`) into a [`ValueNode`] so it can be indexed
//! and navigated the same way as a document-supplied schema. Every
//! synthesized node carries a zero-width location at the origin: the
//! meta-schema has no source text of its own.

use kson_diagnostics::{Location, Position};
use kson_parser::{
    ListElement, ListForm, ListValue, ObjectEntry, ObjectValue, QuoteStyle, StringData, ValueKind,
    ValueNode,
};
use serde_json::Value as JsonValue;

fn zero_location() -> Location {
    Location::point(Position::start())
}

fn leaf(kind: ValueKind) -> ValueNode {
    ValueNode::new(zero_location(), kind)
}

/// Convert an arbitrary JSON value into a [`ValueNode`], so it can flow
/// through the same ID-index and document-path-navigation code paths as
/// a schema parsed from KSON source.
#[must_use]
pub fn from_json(value: &JsonValue) -> ValueNode {
    match value {
        JsonValue::Null => leaf(ValueKind::Null),
        JsonValue::Bool(b) => leaf(ValueKind::Bool(*b)),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                leaf(ValueKind::Number(kson_parser::NumberValue::Integer(i)))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                leaf(ValueKind::Number(kson_parser::NumberValue::Decimal(f, n.to_string())))
            }
        }
        JsonValue::String(s) => leaf(ValueKind::String(StringData {
            value: s.clone(),
            quote: QuoteStyle::Double,
        })),
        JsonValue::Array(items) => leaf(ValueKind::List(ListValue {
            form: ListForm::Bracketed,
            elements: items
                .iter()
                .map(|v| ListElement {
                    value: from_json(v),
                    leading_comments: Vec::new(),
                    trailing_comments: Vec::new(),
                })
                .collect(),
        })),
        JsonValue::Object(map) => leaf(ValueKind::Object(ObjectValue {
            entries: map
                .iter()
                .map(|(k, v)| ObjectEntry {
                    key: k.clone(),
                    key_location: zero_location(),
                    value: from_json(v),
                    location: zero_location(),
                    leading_comments: Vec::new(),
                    trailing_comments: Vec::new(),
                })
                .collect(),
        })),
    }
}
