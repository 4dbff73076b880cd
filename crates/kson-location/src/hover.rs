//! `getSchemaInfoAtLocation` (spec.md §4.N): markdown-ish hover text for
//! the schema at a document coordinate.

use kson_nav::PathToken;
use kson_parser::ValueNode;
use kson_resolve::IdIndex;
use kson_schema::{SchemaKind, SchemaRef};

use crate::shared::expand_variants;

/// `getSchemaInfoAtLocation(doc, schema, line, col)`: resolves the path
/// under the cursor, then renders markdown for the schema found there.
/// Combinators are handled per spec.md §4.N: `anyOf`/`oneOf` render each
/// validating branch and join them with `---`; `allOf` merges its
/// branches' metadata into one rendering rather than concatenating.
#[must_use]
#[tracing::instrument(skip(document_root, schema, resolver))]
pub fn get_schema_info_at_location(
    document_root: &ValueNode,
    document_text: &str,
    schema: &SchemaRef,
    resolver: &IdIndex,
    schema_base_uri: &str,
    pos: kson_diagnostics::Position,
) -> Option<String> {
    let path = kson_nav::build_path_tokens(document_root, pos, false)?;
    let doc_tokens = kson_nav::to_document_path_tokens(&path);
    let (resolved, resolved_base) =
        kson_resolve::navigate_by_document_path(schema.clone(), schema_base_uri, &doc_tokens, resolver)?;
    render_hover(&resolved, document_text, &path, resolver, &resolved_base)
}

fn render_hover(
    schema: &SchemaRef,
    document_text: &str,
    path: &[PathToken],
    resolver: &IdIndex,
    base_uri: &str,
) -> Option<String> {
    match &schema.kind {
        SchemaKind::AllOf(subs) => render_merged(schema, subs),
        SchemaKind::AnyOf(subs) | SchemaKind::OneOf(subs) => {
            let valid = kson_nav::get_valid_schemas(subs, document_text, path, resolver, base_uri);
            let candidates = if valid.is_empty() { subs.clone() } else { valid };
            let parts: Vec<String> = candidates
                .iter()
                .flat_map(|s| expand_variants(s, document_text, path, resolver, base_uri))
                .filter_map(|s| format_schema_markdown(&s))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("\n\n---\n\n"))
            }
        }
        _ => format_schema_markdown(schema),
    }
}

/// Merge an `allOf`'s branches into one rendering: title/description
/// from the first branch (or the combinator node itself) that has one,
/// declared types unioned across every branch.
fn render_merged(schema: &SchemaRef, subs: &[SchemaRef]) -> Option<String> {
    let title = schema
        .meta
        .title
        .clone()
        .or_else(|| subs.iter().find_map(|s| s.meta.title.clone()));
    let description = schema
        .meta
        .description
        .clone()
        .or_else(|| subs.iter().find_map(|s| s.meta.description.clone()));
    let mut types: Vec<&'static str> = subs.iter().flat_map(|s| s.type_names()).collect();
    types.dedup();

    let mut lines = Vec::new();
    if let Some(title) = &title {
        lines.push(format!("**{title}**"));
    }
    if let Some(description) = &description {
        lines.push(description.clone());
    }
    if !types.is_empty() {
        lines.push(format_type_line(&types));
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n\n"))
    }
}

fn format_type_line(types: &[&str]) -> String {
    if types.len() == 1 {
        format!("*Type:* `{}`", types[0])
    } else {
        format!("*Type:* {}", types.iter().map(|t| format!("`{t}`")).collect::<Vec<_>>().join(" | "))
    }
}

/// Render a single non-combinator schema node to markdown per spec.md
/// §4.N's field list. Returns `None` for an empty schema (`true`/`{}`
/// with no title, description, or constraints).
fn format_schema_markdown(schema: &SchemaRef) -> Option<String> {
    let mut lines = Vec::new();

    if let Some(title) = &schema.meta.title {
        lines.push(format!("**{title}**"));
    }
    if let Some(description) = &schema.meta.description {
        lines.push(description.clone());
    }

    let types = schema.type_names();
    if !types.is_empty() {
        lines.push(format_type_line(&types));
    }

    if let Some(default) = &schema.meta.default {
        lines.push(format!("*Default:* `{default}`"));
    }

    match &schema.kind {
        SchemaKind::Enum(options) => {
            let rendered: Vec<String> = options.iter().map(|v| format!("`{v}`")).collect();
            lines.push(format!("*Allowed values:* {}", rendered.join(" ")));
        }
        SchemaKind::Const(value) => {
            lines.push(format!("*Allowed values:* `{value}`"));
        }
        SchemaKind::String(c) => {
            if let Some(pattern) = &c.pattern {
                lines.push(format!("*Pattern:* `{pattern}`"));
            }
            if let Some(min) = c.min_length {
                lines.push(format!("*Min length:* {min}"));
            }
            if let Some(max) = c.max_length {
                lines.push(format!("*Max length:* {max}"));
            }
        }
        SchemaKind::Number(c) | SchemaKind::Integer(c) => {
            if let Some(min) = c.minimum.or(c.exclusive_minimum) {
                lines.push(format!("*Minimum:* {min}"));
            }
            if let Some(max) = c.maximum.or(c.exclusive_maximum) {
                lines.push(format!("*Maximum:* {max}"));
            }
        }
        SchemaKind::Array(a) => {
            if let Some(min) = a.min_items {
                lines.push(format!("*Min items:* {min}"));
            }
            if let Some(max) = a.max_items {
                lines.push(format!("*Max items:* {max}"));
            }
        }
        _ => {}
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n\n"))
    }
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

    #[test]
    fn renders_title_type_and_description() {
        let (schema, index) = setup(
            "properties: {age: {title: Age, description: \"years old\", type: integer, minimum: 0}}",
        );
        let doc = parse("age: 30\n", &ParseConfig::default()).document.root;
        let pos = pos_at("age: 30\n", "30");
        let info = get_schema_info_at_location(&doc, "age: 30\n", &schema, &index, "", pos)
            .expect("hover info for a constrained integer");
        assert!(info.contains("**Age**"));
        assert!(info.contains("years old"));
        assert!(info.contains("*Type:* `integer`"));
        assert!(info.contains("*Minimum:* 0"));
    }

    #[test]
    fn empty_schema_yields_no_hover() {
        let (schema, index) = setup("properties: {anything: {}}");
        let doc = parse("anything: 1\n", &ParseConfig::default()).document.root;
        let pos = pos_at("anything: 1\n", "1");
        assert!(get_schema_info_at_location(&doc, "anything: 1\n", &schema, &index, "", pos).is_none());
    }

    #[test]
    fn concatenates_validating_any_of_branches() {
        let (schema, index) = setup(
            "properties: {value: {anyOf: [{type: string, title: AsText}, {type: number, title: AsNumber}]}}",
        );
        let src = "value: 5\n";
        let doc = parse(src, &ParseConfig::default()).document.root;
        let pos = pos_at(src, "5");
        let info = get_schema_info_at_location(&doc, src, &schema, &index, "", pos).expect("hover info");
        assert!(info.contains("AsNumber"));
        assert!(!info.contains("AsText"));
    }
}
