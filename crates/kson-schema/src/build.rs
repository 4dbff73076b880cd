//! The schema model & parser (spec.md §4.I): converts a value tree into
//! the typed schema tree.

use kson_diagnostics::{DiagnosticKind, Location, Sink};
use kson_parser::{ObjectValue, ValueKind, ValueNode};
use serde_json::Value as JsonValue;

use crate::tree::{
    AdditionalPolicy, ArraySchema, DependencyKind, NumberConstraints, ObjectSchema, PrimitiveType,
    SchemaKind, SchemaMeta, SchemaNode, SchemaRef, StringConstraints,
};

fn get<'a>(obj: &'a ObjectValue, key: &str) -> Option<&'a ValueNode> {
    obj.get(key)
}

fn get_str(obj: &ObjectValue, key: &str) -> Option<String> {
    get(obj, key).and_then(ValueNode::as_str).map(String::from)
}

fn get_bool(obj: &ObjectValue, key: &str) -> Option<bool> {
    get(obj, key).and_then(ValueNode::as_bool)
}

fn get_f64(obj: &ObjectValue, key: &str) -> Option<f64> {
    get(obj, key).and_then(ValueNode::as_number).map(kson_parser::NumberValue::as_f64)
}

fn get_u64(obj: &ObjectValue, key: &str) -> Option<u64> {
    get(obj, key)
        .and_then(ValueNode::as_number)
        .map(|n| n.as_f64())
        .map(|f| f.max(0.0) as u64)
}

fn get_list<'a>(obj: &'a ObjectValue, key: &str) -> Option<&'a kson_parser::ListValue> {
    get(obj, key).and_then(ValueNode::as_list)
}

/// Recursively convert a value-tree node into a `serde_json::Value`, for
/// the handful of schema fields (`const`, `enum`, `default`, `examples`)
/// that need to carry arbitrary JSON rather than a typed constraint.
#[must_use]
pub fn value_to_json(value: &ValueNode) -> JsonValue {
    match &value.kind {
        ValueKind::Null | ValueKind::Error => JsonValue::Null,
        ValueKind::Bool(b) => JsonValue::Bool(*b),
        ValueKind::Number(kson_parser::NumberValue::Integer(i)) => JsonValue::Number((*i).into()),
        ValueKind::Number(n) => serde_json::Number::from_f64(n.as_f64()).map_or(JsonValue::Null, JsonValue::Number),
        ValueKind::String(s) => JsonValue::String(s.value.clone()),
        ValueKind::Embed(e) => JsonValue::String(e.content.clone()),
        ValueKind::List(l) => JsonValue::Array(l.elements.iter().map(|e| value_to_json(&e.value)).collect()),
        ValueKind::Object(o) => {
            let mut map = serde_json::Map::new();
            for entry in &o.entries {
                map.entry(entry.key.clone()).or_insert_with(|| value_to_json(&entry.value));
            }
            JsonValue::Object(map)
        }
    }
}

struct ObjectKeywords<'a> {
    obj: &'a ObjectValue,
}

impl<'a> ObjectKeywords<'a> {
    fn has_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.obj.get(k).is_some())
    }

    fn has_object_keywords(&self) -> bool {
        self.has_any(&[
            "properties",
            "required",
            "additionalProperties",
            "patternProperties",
            "minProperties",
            "maxProperties",
        ])
    }

    fn has_array_keywords(&self) -> bool {
        self.has_any(&[
            "items",
            "additionalItems",
            "prefixItems",
            "contains",
            "minItems",
            "maxItems",
            "uniqueItems",
        ])
    }

    fn has_number_keywords(&self) -> bool {
        self.has_any(&["minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum", "multipleOf"])
    }

    fn has_string_keywords(&self) -> bool {
        self.has_any(&["minLength", "maxLength", "pattern"])
    }
}

fn extract_meta(obj: &ObjectValue, sink: &mut Sink) -> SchemaMeta {
    let definitions = get(obj, "$defs")
        .or_else(|| get(obj, "definitions"))
        .and_then(ValueNode::as_object)
        .map(|defs| {
            defs.entries
                .iter()
                .map(|e| (e.key.clone(), build_schema_with_sink(&e.value, sink)))
                .collect()
        })
        .unwrap_or_default();
    SchemaMeta {
        id: get_str(obj, "$id"),
        title: get_str(obj, "title"),
        description: get_str(obj, "description"),
        default: get(obj, "default").map(value_to_json),
        deprecated: get_bool(obj, "deprecated").unwrap_or(false),
        definitions,
    }
}

fn number_constraints(obj: &ObjectValue) -> NumberConstraints {
    NumberConstraints {
        minimum: get_f64(obj, "minimum"),
        maximum: get_f64(obj, "maximum"),
        exclusive_minimum: get_f64(obj, "exclusiveMinimum"),
        exclusive_maximum: get_f64(obj, "exclusiveMaximum"),
        multiple_of: get_f64(obj, "multipleOf"),
    }
}

fn string_constraints(obj: &ObjectValue) -> StringConstraints {
    StringConstraints {
        min_length: get_u64(obj, "minLength"),
        max_length: get_u64(obj, "maxLength"),
        pattern: get_str(obj, "pattern"),
    }
}

fn additional_policy(value: Option<&ValueNode>, sink: &mut Sink) -> AdditionalPolicy {
    match value {
        None => AdditionalPolicy::Allowed,
        Some(v) => match v.as_bool() {
            Some(true) => AdditionalPolicy::Allowed,
            Some(false) => AdditionalPolicy::Forbidden,
            None => AdditionalPolicy::Schema(build_schema_with_sink(v, sink)),
        },
    }
}

fn array_constraints(obj: &ObjectValue, enforce_type: bool, sink: &mut Sink) -> ArraySchema {
    let (items, prefix_items) = match get(obj, "items") {
        Some(v) => match &v.kind {
            ValueKind::List(l) => (
                None,
                l.elements.iter().map(|e| build_schema_with_sink(&e.value, sink)).collect(),
            ),
            _ => (Some(build_schema_with_sink(v, sink)), Vec::new()),
        },
        None => (None, Vec::new()),
    };
    let prefix_items = if prefix_items.is_empty() {
        get_list(obj, "prefixItems")
            .map(|l| l.elements.iter().map(|e| build_schema_with_sink(&e.value, sink)).collect())
            .unwrap_or_default()
    } else {
        prefix_items
    };
    ArraySchema {
        items,
        prefix_items,
        additional_items: additional_policy(get(obj, "additionalItems"), sink),
        contains: get(obj, "contains").map(|v| build_schema_with_sink(v, sink)),
        min_items: get_u64(obj, "minItems"),
        max_items: get_u64(obj, "maxItems"),
        unique_items: get_bool(obj, "uniqueItems").unwrap_or(false),
        enforce_type,
    }
}

fn object_constraints(obj: &ObjectValue, enforce_type: bool, sink: &mut Sink) -> ObjectSchema {
    let properties = get(obj, "properties")
        .and_then(ValueNode::as_object)
        .map(|props| {
            props
                .entries
                .iter()
                .map(|e| (e.key.clone(), build_schema_with_sink(&e.value, sink)))
                .collect()
        })
        .unwrap_or_default();
    let pattern_properties = get(obj, "patternProperties")
        .and_then(ValueNode::as_object)
        .map(|props| {
            props
                .entries
                .iter()
                .map(|e| (e.key.clone(), build_schema_with_sink(&e.value, sink)))
                .collect()
        })
        .unwrap_or_default();
    let required = get_list(obj, "required")
        .map(|l| l.elements.iter().filter_map(|e| e.value.as_str().map(String::from)).collect())
        .unwrap_or_default();
    ObjectSchema {
        properties,
        pattern_properties,
        required,
        additional_properties: additional_policy(get(obj, "additionalProperties"), sink),
        min_properties: get_u64(obj, "minProperties"),
        max_properties: get_u64(obj, "maxProperties"),
        enforce_type,
    }
}

fn schema_array(obj: &ObjectValue, key: &str, sink: &mut Sink) -> Vec<SchemaRef> {
    get_list(obj, key)
        .map(|l| l.elements.iter().map(|e| build_schema_with_sink(&e.value, sink)).collect())
        .unwrap_or_default()
}

/// Build the schema tree from a schema value node, reporting `InvalidSchema`
/// (spec.md §7) if the root is neither an object nor a boolean. An invalid
/// root degrades to [`SchemaKind::Universal`] so validation trivially
/// succeeds, per spec.md §7's recovery policy for schema-build errors.
#[must_use]
#[tracing::instrument(skip_all)]
pub fn build_schema(value: &ValueNode) -> (SchemaRef, Vec<kson_diagnostics::Diagnostic>) {
    let mut sink = Sink::new();
    let node = build_schema_with_sink(value, &mut sink);
    (node, sink.into_vec())
}

fn build_schema_with_sink(value: &ValueNode, sink: &mut Sink) -> SchemaRef {
    match &value.kind {
        ValueKind::Bool(true) => SchemaNode::new(value.location, SchemaMeta::default(), SchemaKind::True),
        ValueKind::Bool(false) => SchemaNode::new(value.location, SchemaMeta::default(), SchemaKind::False),
        ValueKind::Object(obj) => build_object(obj, value.location, sink),
        _ => {
            sink.emit(
                DiagnosticKind::InvalidSchema,
                "schema must be an object or a boolean",
                value.location,
            );
            SchemaNode::universal(value.location)
        }
    }
}

#[allow(clippy::too_many_lines)]
fn build_object(obj: &ObjectValue, location: Location, sink: &mut Sink) -> SchemaRef {
    let meta = extract_meta(obj, sink);

    if let Some(reference) = get_str(obj, "$ref") {
        return SchemaNode::new(location, meta, SchemaKind::Ref(reference));
    }

    let kw = ObjectKeywords { obj };
    let mut variants: Vec<SchemaKind> = Vec::new();

    if let Some(c) = get(obj, "const") {
        variants.push(SchemaKind::Const(value_to_json(c)));
    }
    if let Some(l) = get_list(obj, "enum") {
        variants.push(SchemaKind::Enum(l.elements.iter().map(|e| value_to_json(&e.value)).collect()));
    }
    if let Some(n) = get(obj, "not") {
        variants.push(SchemaKind::Not(build_schema_with_sink(n, sink)));
    }
    for (key, wrap) in [
        ("allOf", SchemaKind::AllOf as fn(Vec<SchemaRef>) -> SchemaKind),
        ("anyOf", SchemaKind::AnyOf),
        ("oneOf", SchemaKind::OneOf),
    ] {
        let subs = schema_array(obj, key, sink);
        if !subs.is_empty() {
            variants.push(wrap(subs));
        }
    }
    if let Some(if_value) = get(obj, "if") {
        variants.push(SchemaKind::IfThenElse {
            if_: build_schema_with_sink(if_value, sink),
            then: get(obj, "then").map(|v| build_schema_with_sink(v, sink)),
            else_: get(obj, "else").map(|v| build_schema_with_sink(v, sink)),
        });
    }
    if let Some(pn) = get(obj, "propertyNames") {
        variants.push(SchemaKind::PropertyNames(build_schema_with_sink(pn, sink)));
    }
    if let Some(deps) = get(obj, "dependencies").and_then(ValueNode::as_object) {
        let entries = deps
            .entries
            .iter()
            .map(|e| {
                let kind = match &e.value.kind {
                    ValueKind::List(l) => DependencyKind::Property(
                        l.elements.iter().filter_map(|el| el.value.as_str().map(String::from)).collect(),
                    ),
                    _ => DependencyKind::Schema(build_schema_with_sink(&e.value, sink)),
                };
                (e.key.clone(), kind)
            })
            .collect();
        variants.push(SchemaKind::Dependencies(entries));
    }

    let declared_types: Option<Vec<PrimitiveType>> = get(obj, "type").map(|t| match &t.kind {
        ValueKind::List(l) => l
            .elements
            .iter()
            .filter_map(|e| e.value.as_str().and_then(PrimitiveType::from_str))
            .collect(),
        _ => t
            .as_str()
            .and_then(PrimitiveType::from_str)
            .into_iter()
            .collect(),
    });

    match &declared_types {
        Some(types) if types.len() == 1 => {
            variants.push(typed_variant(types[0], obj, true, sink));
        }
        Some(types) if types.len() > 1 => {
            variants.push(SchemaKind::MultipleType(types.clone()));
            for t in types {
                if matches!(t, PrimitiveType::Object | PrimitiveType::Array | PrimitiveType::Number | PrimitiveType::Integer | PrimitiveType::String)
                {
                    variants.push(typed_variant(*t, obj, false, sink));
                }
            }
        }
        _ => {
            // Implicit object/array schemas (spec.md §4.I).
            if kw.has_object_keywords() {
                variants.push(SchemaKind::Object(object_constraints(obj, false, sink)));
            }
            if kw.has_array_keywords() {
                variants.push(SchemaKind::Array(array_constraints(obj, false, sink)));
            }
            if kw.has_number_keywords() {
                variants.push(SchemaKind::Number(number_constraints(obj)));
            }
            if kw.has_string_keywords() {
                variants.push(SchemaKind::String(string_constraints(obj)));
            }
        }
    }

    match variants.len() {
        0 => SchemaNode::new(location, meta, SchemaKind::Universal),
        1 => SchemaNode::new(location, meta, variants.into_iter().next().expect("len checked")),
        _ => {
            let subs = variants
                .into_iter()
                .map(|kind| SchemaNode::new(location, SchemaMeta::default(), kind))
                .collect();
            SchemaNode::new(location, meta, SchemaKind::AllOf(subs))
        }
    }
}

fn typed_variant(ty: PrimitiveType, obj: &ObjectValue, enforce_type: bool, sink: &mut Sink) -> SchemaKind {
    match ty {
        PrimitiveType::Null => SchemaKind::Null,
        PrimitiveType::Boolean => SchemaKind::Boolean,
        PrimitiveType::Number => SchemaKind::Number(number_constraints(obj)),
        PrimitiveType::Integer => SchemaKind::Integer(number_constraints(obj)),
        PrimitiveType::String => SchemaKind::String(string_constraints(obj)),
        PrimitiveType::Array => SchemaKind::Array(array_constraints(obj, enforce_type, sink)),
        PrimitiveType::Object => SchemaKind::Object(object_constraints(obj, enforce_type, sink)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_parser::{parse, ParseConfig};

    fn schema_from(src: &str) -> SchemaRef {
        let result = parse(src, &ParseConfig::default());
        build_schema(&result.document.root).0
    }

    #[test]
    fn boolean_schemas_build_directly() {
        assert!(matches!(schema_from("true").kind, SchemaKind::True));
        assert!(matches!(schema_from("false").kind, SchemaKind::False));
    }

    #[test]
    fn single_type_merges_constraints_and_enforces_type() {
        let schema = schema_from("type: string\nminLength: 2");
        match &schema.kind {
            SchemaKind::String(s) => assert_eq!(s.min_length, Some(2)),
            other => panic!("expected string schema, got {other:?}"),
        }
    }

    #[test]
    fn implicit_object_schema_has_enforce_type_false() {
        let schema = schema_from("properties: {name: {type: string}}");
        match &schema.kind {
            SchemaKind::Object(o) => {
                assert!(!o.enforce_type);
                assert!(o.property("name").is_some());
            }
            other => panic!("expected object schema, got {other:?}"),
        }
    }

    #[test]
    fn multiple_types_become_multiple_type_variant() {
        let schema = schema_from("type: [string, \"null\"]");
        assert!(matches!(schema.kind, SchemaKind::MultipleType(_)));
    }

    #[test]
    fn ref_siblings_are_ignored() {
        let schema = schema_from("$ref: \"#/$defs/Thing\"\ntitle: ignored");
        assert!(matches!(&schema.kind, SchemaKind::Ref(r) if r == "#/$defs/Thing"));
    }

    #[test]
    fn combinator_requires_non_empty_subschema_list() {
        let schema = schema_from("anyOf: [{type: string}, {type: number}]");
        match &schema.kind {
            SchemaKind::AnyOf(subs) => assert_eq!(subs.len(), 2),
            other => panic!("expected anyOf, got {other:?}"),
        }
    }
}
