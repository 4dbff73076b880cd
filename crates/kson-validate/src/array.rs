//! List constraint validation (spec.md §4.J): `items`/`prefixItems`,
//! `contains`, `minItems`/`maxItems`, and `uniqueItems`.

use kson_diagnostics::{Sink, TempSink};
use kson_parser::{values_equal, ValueNode};
use kson_resolve::IdIndex;
use kson_schema::{AdditionalPolicy, ArraySchema};

use crate::emit;

pub(crate) fn validate(value: &ValueNode, schema: &ArraySchema, resolver: &IdIndex, base_uri: &str, sink: &mut Sink) {
    let Some(list) = value.as_list() else {
        if schema.enforce_type {
            emit(sink, "expected an array", value.location);
        }
        return;
    };
    let elements: Vec<&ValueNode> = list.elements.iter().map(|e| &e.value).collect();

    for (element, prefix_schema) in elements.iter().zip(&schema.prefix_items) {
        crate::validate(element, prefix_schema, resolver, base_uri, sink);
    }
    let rest = &elements[schema.prefix_items.len().min(elements.len())..];
    match &schema.additional_items {
        AdditionalPolicy::Allowed => {
            if let Some(items_schema) = &schema.items {
                for element in rest {
                    crate::validate(element, items_schema, resolver, base_uri, sink);
                }
            }
        }
        AdditionalPolicy::Forbidden => {
            if schema.items.is_none() && !rest.is_empty() {
                emit(sink, "array has more items than `prefixItems` allows", value.location);
            } else if let Some(items_schema) = &schema.items {
                for element in rest {
                    crate::validate(element, items_schema, resolver, base_uri, sink);
                }
            }
        }
        AdditionalPolicy::Schema(additional_schema) => {
            for element in rest {
                crate::validate(element, additional_schema, resolver, base_uri, sink);
            }
        }
    }

    if let Some(contains_schema) = &schema.contains {
        let found = elements.iter().any(|element| {
            let mut temp = TempSink::new();
            crate::validate(element, contains_schema, resolver, base_uri, &mut temp);
            let ok = temp.succeeded();
            temp.discard();
            ok
        });
        if !found {
            emit(sink, "array does not contain a value matching `contains`", value.location);
        }
    }

    let len = elements.len() as u64;
    if let Some(min) = schema.min_items {
        if len < min {
            emit(sink, format!("array of length {len} is shorter than minItems {min}"), value.location);
        }
    }
    if let Some(max) = schema.max_items {
        if len > max {
            emit(sink, format!("array of length {len} is longer than maxItems {max}"), value.location);
        }
    }
    if schema.unique_items {
        for i in 0..elements.len() {
            for j in (i + 1)..elements.len() {
                if values_equal(elements[i], elements[j]) {
                    emit(sink, "array elements must be unique", value.location);
                    return;
                }
            }
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
    fn vacuously_passes_non_array_when_type_not_enforced() {
        assert!(check("minItems: 3", "\"nope\"").is_empty());
    }

    #[test]
    fn rejects_non_array_when_type_enforced() {
        assert_eq!(check("type: array", "\"nope\"").len(), 1);
    }

    #[test]
    fn enforces_item_count_bounds() {
        assert_eq!(check("minItems: 2", "[1]").len(), 1);
        assert_eq!(check("maxItems: 1", "[1, 2]").len(), 1);
        assert!(check("minItems: 1\nmaxItems: 2", "[1, 2]").is_empty());
    }

    #[test]
    fn validates_each_element_against_items_schema() {
        assert_eq!(check("items: {type: number}", "[1, \"nope\", 3]").len(), 1);
    }

    #[test]
    fn validates_prefix_items_positionally_then_falls_back_to_items() {
        let schema = "prefixItems: [{type: string}, {type: number}]\nitems: {type: boolean}";
        assert!(check(schema, "[\"a\", 1, true, false]").is_empty());
        assert_eq!(check(schema, "[\"a\", 1, \"oops\"]").len(), 1);
    }

    #[test]
    fn forbidden_additional_items_rejects_overflow() {
        let schema = "prefixItems: [{type: string}]\nadditionalItems: false";
        assert!(check(schema, "[\"a\"]").is_empty());
        assert_eq!(check(schema, "[\"a\", 1]").len(), 1);
    }

    #[test]
    fn contains_requires_at_least_one_match() {
        let schema = "contains: {type: number}";
        assert!(check(schema, "[\"a\", 1]").is_empty());
        assert_eq!(check(schema, "[\"a\", \"b\"]").len(), 1);
    }

    #[test]
    fn unique_items_rejects_numeric_projection_duplicates() {
        assert_eq!(check("uniqueItems: true", "[1, 1.0]").len(), 1);
        assert!(check("uniqueItems: true", "[1, 2]").is_empty());
    }
}
