//! `navigateByDocumentPath` (spec.md §4.K): walks a built schema tree
//! along the shape of a document, translating document tokens into
//! schema keywords and transparently following `$ref` at every step.

use kson_schema::{build_schema, ArraySchema, ObjectSchema, SchemaKind, SchemaRef};

use crate::index::IdIndex;

/// One step of a document path: a property name, or an array position
/// (the actual index is ignored per spec.md §4.K - every element of an
/// array shares the same `items` schema).
#[derive(Debug, Clone)]
pub enum DocumentPathToken {
    Property(String),
    Index(usize),
}

fn find_array(schema: &SchemaRef) -> Option<&ArraySchema> {
    match &schema.kind {
        SchemaKind::Array(a) => Some(a),
        SchemaKind::AllOf(subs) => subs.iter().find_map(find_array),
        _ => None,
    }
}

fn find_object(schema: &SchemaRef) -> Option<&ObjectSchema> {
    match &schema.kind {
        SchemaKind::Object(o) => Some(o),
        SchemaKind::AllOf(subs) => subs.iter().find_map(find_object),
        _ => None,
    }
}

/// Follow `$ref` chains starting at `(schema, base_uri)` until a
/// non-`Ref` node is reached, updating the base URI from the resolver at
/// each hop. Returns the input unchanged if it isn't a `$ref` or the ref
/// fails to resolve.
fn deref(resolver: &IdIndex, schema: SchemaRef, base_uri: String) -> (SchemaRef, String) {
    let mut current = schema;
    let mut current_base = base_uri;
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

/// Walk `schema` following `tokens`, descending into `items`/
/// `additionalItems` for numeric tokens and `properties`/
/// `patternProperties`/`additionalProperties` for string tokens,
/// transparently dereferencing `$ref` at each step. Returns `None` on
/// any mismatch.
#[must_use]
#[tracing::instrument(skip(resolver, schema))]
pub fn navigate_by_document_path(
    schema: SchemaRef,
    base_uri: &str,
    tokens: &[DocumentPathToken],
    resolver: &IdIndex,
) -> Option<(SchemaRef, String)> {
    let (mut current, mut current_base) = deref(resolver, schema, base_uri.to_string());
    for token in tokens {
        let next = match token {
            DocumentPathToken::Index(_) => {
                let array = find_array(&current)?;
                array.items.clone().or_else(|| match &array.additional_items {
                    kson_schema::AdditionalPolicy::Schema(s) => Some(s.clone()),
                    _ => None,
                })?
            }
            DocumentPathToken::Property(name) => {
                let object = find_object(&current)?;
                if let Some(property_schema) = object.property(name) {
                    property_schema.clone()
                } else if let Some((_, property_schema)) = object
                    .pattern_properties
                    .iter()
                    .find(|(pattern, _)| regex::Regex::new(pattern).is_ok_and(|re| re.is_match(name)))
                {
                    property_schema.clone()
                } else if let kson_schema::AdditionalPolicy::Schema(s) = &object.additional_properties {
                    s.clone()
                } else {
                    return None;
                }
            }
        };
        let (resolved, resolved_base) = deref(resolver, next, current_base);
        current = resolved;
        current_base = resolved_base;
    }
    Some((current, current_base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_parser::{parse, ParseConfig};
    use std::rc::Rc;

    fn schema_for(src: &str) -> (SchemaRef, Rc<kson_parser::ValueNode>) {
        let document = parse(src, &ParseConfig::default()).document;
        let (schema, _) = build_schema(&document.root);
        (schema, Rc::new(document.root))
    }

    #[test]
    fn navigates_into_object_property() {
        let (schema, root) = schema_for("properties: {name: {type: string}}");
        let index = IdIndex::build(root, "");
        let (found, _) = navigate_by_document_path(
            schema,
            "",
            &[DocumentPathToken::Property("name".into())],
            &index,
        )
        .expect("property should resolve");
        assert!(matches!(found.kind, SchemaKind::String(_)));
    }

    #[test]
    fn navigates_into_array_items_ignoring_index() {
        let (schema, root) = schema_for("items: {type: number}");
        let index = IdIndex::build(root, "");
        let (found, _) =
            navigate_by_document_path(schema, "", &[DocumentPathToken::Index(7)], &index)
                .expect("items should resolve regardless of index");
        assert!(matches!(found.kind, SchemaKind::Number(_)));
    }

    #[test]
    fn mismatched_token_returns_none() {
        let (schema, root) = schema_for("type: string");
        let index = IdIndex::build(root, "");
        assert!(navigate_by_document_path(
            schema,
            "",
            &[DocumentPathToken::Property("name".into())],
            &index
        )
        .is_none());
    }
}
