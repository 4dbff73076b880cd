//! `getCompletionsAtLocation` (spec.md §4.N).

use kson_parser::ValueNode;
use kson_resolve::IdIndex;
use kson_schema::{ObjectSchema, SchemaKind, SchemaRef};

use crate::shared::{brief_summary, expand_variants};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    Property,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    pub detail: Option<String>,
    pub documentation: Option<String>,
}

/// `getCompletionsAtLocation(doc, schema, line, col)` (spec.md §4.N):
/// resolve the schema at the cursor's path, filter combinators by
/// [`kson_nav::get_valid_schemas`], and emit either `PROPERTY` items (the
/// object schema's declared properties, minus keys already present in
/// the surrounding object) or `VALUE` items (literal members of an
/// `enum`/`const`/`boolean`/`null` schema), depending on what the cursor
/// sits inside.
#[must_use]
#[tracing::instrument(skip(document_root, schema, resolver))]
pub fn get_completions_at_location(
    document_root: &ValueNode,
    document_text: &str,
    schema: &SchemaRef,
    resolver: &IdIndex,
    schema_base_uri: &str,
    pos: kson_diagnostics::Position,
) -> Vec<CompletionItem> {
    let Some(path) = kson_nav::build_path_tokens(document_root, pos, false) else {
        return Vec::new();
    };
    let Some(node) = kson_nav::navigate_by_tokens(document_root, &path) else {
        return Vec::new();
    };
    let doc_tokens = kson_nav::to_document_path_tokens(&path);
    let Some((resolved, resolved_base)) =
        kson_resolve::navigate_by_document_path(schema.clone(), schema_base_uri, &doc_tokens, resolver)
    else {
        return Vec::new();
    };
    let variants = expand_variants(&resolved, document_text, &path, resolver, &resolved_base);

    if let Some(obj) = node.as_object() {
        property_completions(obj, &variants)
    } else if node.as_list().is_none() {
        value_completions(&variants)
    } else {
        Vec::new()
    }
}

fn property_completions(document_object: &kson_parser::ObjectValue, variants: &[SchemaRef]) -> Vec<CompletionItem> {
    let present: std::collections::HashSet<&str> =
        document_object.entries.iter().map(|e| e.key.as_str()).collect();

    let mut seen = std::collections::HashSet::new();
    let mut items = Vec::new();
    for variant in variants {
        let Some(object_schema) = object_view(variant) else {
            continue;
        };
        for (name, prop_schema) in &object_schema.properties {
            if present.contains(name.as_str()) || !seen.insert(name.clone()) {
                continue;
            }
            items.push(CompletionItem {
                label: name.clone(),
                kind: CompletionKind::Property,
                detail: Some(brief_summary(prop_schema)),
                documentation: describe(prop_schema),
            });
        }
    }
    items
}

/// An `Object` schema the node itself carries, or — per spec.md §4.I's
/// implicit-object-schema rule — one with no explicit `type` but
/// `properties` declared anyway.
fn object_view(schema: &SchemaRef) -> Option<&ObjectSchema> {
    match &schema.kind {
        SchemaKind::Object(o) => Some(o),
        _ => None,
    }
}

fn value_completions(variants: &[SchemaRef]) -> Vec<CompletionItem> {
    let mut items = Vec::new();
    for variant in variants {
        match &variant.kind {
            SchemaKind::Enum(options) => {
                for option in options {
                    items.push(CompletionItem {
                        label: option.to_string(),
                        kind: CompletionKind::Value,
                        detail: Some(brief_summary(variant)),
                        documentation: describe(variant),
                    });
                }
            }
            SchemaKind::Const(value) => items.push(CompletionItem {
                label: value.to_string(),
                kind: CompletionKind::Value,
                detail: Some(brief_summary(variant)),
                documentation: describe(variant),
            }),
            SchemaKind::Boolean => {
                for label in ["true", "false"] {
                    items.push(CompletionItem {
                        label: label.to_string(),
                        kind: CompletionKind::Value,
                        detail: Some(brief_summary(variant)),
                        documentation: describe(variant),
                    });
                }
            }
            SchemaKind::Null => items.push(CompletionItem {
                label: "null".to_string(),
                kind: CompletionKind::Value,
                detail: Some(brief_summary(variant)),
                documentation: describe(variant),
            }),
            _ => {}
        }
    }
    items
}

fn describe(schema: &SchemaRef) -> Option<String> {
    schema.meta.description.clone().or_else(|| schema.meta.title.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_parser::{parse, ParseConfig};
    use kson_schema::build_schema;
    use std::rc::Rc;

    fn setup(schema_src: &str) -> (SchemaRef, IdIndex) {
        let root = Rc::new(parse(schema_src, &ParseConfig::default()).document.root);
        let (schema, _) = build_schema(&root);
        let index = IdIndex::build(Rc::clone(&root), "");
        (schema, index)
    }

    fn pos_at(src: &str, needle: &str) -> kson_diagnostics::Position {
        let offset = src.find(needle).expect("needle present") as u32;
        let line = src[..offset as usize].matches('\n').count() as u32;
        let col = offset - src[..offset as usize].rfind('\n').map_or(0, |i| i as u32 + 1);
        kson_diagnostics::Position::new(line, col, offset)
    }

    /// spec.md §8 end-to-end scenario 2.
    #[test]
    fn discriminated_one_of_filters_property_completions() {
        let schema_src = "properties: {notification: {oneOf: [\
            {type: object, properties: {type: {const: email}, recipient: {type: string}, subject: {type: string}}}, \
            {type: object, properties: {type: {const: sms}, phoneNumber: {type: string}, message: {type: string}}}\
        ]}}";
        let (schema, index) = setup(schema_src);

        // The cursor sits on a not-yet-named property key being typed;
        // completion mode drops that trailing key token and offers the
        // enclosing `notification` object's still-missing properties.
        let doc_src = "notification:\n  type: email\n  x: 1\n";
        let doc = parse(doc_src, &ParseConfig::default()).document.root;
        let pos = pos_at(doc_src, "x: 1");

        let items = get_completions_at_location(&doc, doc_src, &schema, &index, "", pos);
        let labels: std::collections::HashSet<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert!(labels.contains("recipient"));
        assert!(labels.contains("subject"));
        assert!(!labels.contains("phoneNumber"));
        assert!(!labels.contains("message"));
        assert!(!labels.contains("type"));
    }

    #[test]
    fn value_completions_list_enum_members() {
        let (schema, index) = setup("properties: {color: {enum: [red, green, blue]}}");
        let doc_src = "color: red\n";
        let doc = parse(doc_src, &ParseConfig::default()).document.root;
        let pos = pos_at(doc_src, "red");
        let items = get_completions_at_location(&doc, doc_src, &schema, &index, "", pos);
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert!(labels.contains(&"\"red\""));
        assert!(labels.contains(&"\"green\""));
        assert!(labels.contains(&"\"blue\""));
    }
}
