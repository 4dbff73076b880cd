//! Object constraint validation (spec.md §4.J): `properties`/`required`/
//! `additionalProperties`/`patternProperties`/`minProperties`/
//! `maxProperties`.
//!
//! Per spec.md §9's "Pattern-property regex compilation" design note, an
//! invalid `patternProperties` key is swallowed during navigation but
//! reported as a validation error here during full validation.

use kson_diagnostics::Sink;
use kson_parser::ValueNode;
use kson_resolve::IdIndex;
use kson_schema::{AdditionalPolicy, ObjectSchema};

use crate::{emit, MISSING_REQUIRED_MARKER};

pub(crate) fn validate(value: &ValueNode, schema: &ObjectSchema, resolver: &IdIndex, base_uri: &str, sink: &mut Sink) {
    let Some(obj) = value.as_object() else {
        if schema.enforce_type {
            emit(sink, "expected an object", value.location);
        }
        return;
    };

    for name in &schema.required {
        if obj.get(name).is_none() {
            emit(sink, format!("{MISSING_REQUIRED_MARKER}: `{name}`"), value.location);
        }
    }

    for entry in &obj.entries {
        let mut matched = false;
        if let Some((_, prop_schema)) = schema.properties.iter().find(|(name, _)| name == &entry.key) {
            matched = true;
            crate::validate(&entry.value, prop_schema, resolver, base_uri, sink);
        }
        for (pattern, pattern_schema) in &schema.pattern_properties {
            match regex::Regex::new(pattern) {
                Ok(re) => {
                    if re.is_match(&entry.key) {
                        matched = true;
                        crate::validate(&entry.value, pattern_schema, resolver, base_uri, sink);
                    }
                }
                Err(_) => emit(
                    sink,
                    format!("patternProperties key `{pattern}` is not a valid regular expression"),
                    value.location,
                ),
            }
        }
        if matched {
            continue;
        }
        match &schema.additional_properties {
            AdditionalPolicy::Allowed => {}
            AdditionalPolicy::Forbidden => {
                emit(sink, format!("unexpected additional property `{}`", entry.key), entry.value.location);
            }
            AdditionalPolicy::Schema(additional_schema) => {
                crate::validate(&entry.value, additional_schema, resolver, base_uri, sink);
            }
        }
    }

    let len = obj.entries.len() as u64;
    if let Some(min) = schema.min_properties {
        if len < min {
            emit(sink, format!("object with {len} properties is below minProperties {min}"), value.location);
        }
    }
    if let Some(max) = schema.max_properties {
        if len > max {
            emit(sink, format!("object with {len} properties is above maxProperties {max}"), value.location);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_diagnostics::Sink;
    use kson_parser::{parse, ParseConfig};
    use kson_schema::build_schema;
    use std::rc::Rc;

    fn check(schema_src: &str, value_src: &str) -> Sink {
        let schema_root = Rc::new(parse(schema_src, &ParseConfig::default()).document.root);
        let (schema, _) = build_schema(&schema_root);
        let index = IdIndex::build(Rc::clone(&schema_root), "");
        let value = parse(value_src, &ParseConfig::default()).document.root;
        let mut sink = Sink::new();
        crate::validate(&value, &schema, &index, "", &mut sink);
        sink
    }

    #[test]
    fn vacuously_passes_non_object_when_type_not_enforced() {
        assert!(check("minProperties: 1", "\"nope\"").is_empty());
    }

    #[test]
    fn rejects_non_object_when_type_enforced() {
        assert_eq!(check("type: object", "\"nope\"").len(), 1);
    }

    #[test]
    fn reports_missing_required_with_marker() {
        let sink = check("required: [name]", "{}");
        assert_eq!(sink.len(), 1);
        assert!(sink.iter().next().unwrap().message.contains(MISSING_REQUIRED_MARKER));
    }

    #[test]
    fn validates_declared_properties() {
        let schema = "properties: {age: {type: number}}";
        assert!(check(schema, "{age: 5}").is_empty());
        assert_eq!(check(schema, "{age: \"nope\"}").len(), 1);
    }

    #[test]
    fn forbidden_additional_properties_rejects_unlisted_keys() {
        let schema = "properties: {age: {type: number}}\nadditionalProperties: false";
        assert!(check(schema, "{age: 5}").is_empty());
        assert_eq!(check(schema, "{age: 5, extra: true}").len(), 1);
    }

    #[test]
    fn pattern_properties_apply_to_matching_keys() {
        let schema = "patternProperties: {\"^x-\": {type: string}}";
        assert!(check(schema, "{\"x-foo\": \"bar\"}").is_empty());
        assert_eq!(check(schema, "{\"x-foo\": 1}").len(), 1);
    }

    #[test]
    fn invalid_pattern_properties_key_is_reported_as_a_validation_error() {
        let schema = "patternProperties: {\"(\": {type: string}}";
        assert_eq!(check(schema, "{foo: 1}").len(), 1);
    }

    #[test]
    fn enforces_property_count_bounds() {
        assert_eq!(check("minProperties: 2", "{a: 1}").len(), 1);
        assert_eq!(check("maxProperties: 1", "{a: 1, b: 2}").len(), 1);
    }
}
