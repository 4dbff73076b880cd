//! Jump to definition (spec.md §4.N): document→schema navigation and
//! intra-schema `$ref` following.

use kson_diagnostics::{Location, Position};
use kson_nav::PathToken;
use kson_parser::ValueNode;
use kson_resolve::IdIndex;
use kson_schema::{build_schema, AdditionalPolicy, SchemaKind, SchemaRef};

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

fn rebind_base(schema: &SchemaRef, base_uri: &str) -> String {
    match &schema.meta.id {
        Some(id) => kson_resolve::uri::resolve(id, base_uri).0,
        None => base_uri.to_string(),
    }
}

/// `getSchemaLocationAtLocation(doc, schema, line, col)` (spec.md §4.N
/// "Document -> schema"): resolve the document path under the cursor
/// against the schema tree, returning *every* location a combinator
/// branch defines that path at — `allOf` contributes every branch
/// unconditionally; `anyOf`/`oneOf` are first narrowed by
/// [`kson_nav::get_valid_schemas`] against what the document actually
/// has at each prefix of the path.
#[must_use]
#[tracing::instrument(skip(document_root, schema, resolver))]
pub fn get_schema_location_at_location(
    document_root: &ValueNode,
    document_text: &str,
    schema: &SchemaRef,
    resolver: &IdIndex,
    schema_base_uri: &str,
    pos: Position,
) -> Vec<Location> {
    let Some(path) = kson_nav::build_path_tokens(document_root, pos, true) else {
        return Vec::new();
    };
    let (schema, base_uri) = deref(resolver, schema, schema_base_uri);
    collect(&schema, &base_uri, &path, &mut Vec::new(), document_text, resolver)
}

fn collect(
    schema: &SchemaRef,
    base_uri: &str,
    remaining: &[PathToken],
    consumed: &mut Vec<PathToken>,
    document_text: &str,
    resolver: &IdIndex,
) -> Vec<Location> {
    let Some((token, rest)) = remaining.split_first() else {
        return vec![schema.location];
    };

    match &schema.kind {
        SchemaKind::AllOf(subs) => subs
            .iter()
            .flat_map(|s| {
                let (s, b) = deref(resolver, s, base_uri);
                collect(&s, &b, remaining, consumed, document_text, resolver)
            })
            .collect(),
        SchemaKind::AnyOf(subs) | SchemaKind::OneOf(subs) => {
            let valid = kson_nav::get_valid_schemas(subs, document_text, consumed, resolver, base_uri);
            let candidates = if valid.is_empty() { subs.clone() } else { valid };
            candidates
                .iter()
                .flat_map(|s| {
                    let (s, b) = deref(resolver, s, base_uri);
                    collect(&s, &b, remaining, consumed, document_text, resolver)
                })
                .collect()
        }
        SchemaKind::Object(object) => {
            let PathToken::Property(name) = token else {
                return Vec::new();
            };
            let next = if let Some(p) = object.property(name) {
                Some(p.clone())
            } else if let Some((_, p)) = object
                .pattern_properties
                .iter()
                .find(|(pattern, _)| regex::Regex::new(pattern).is_ok_and(|re| re.is_match(name)))
            {
                Some(p.clone())
            } else if let AdditionalPolicy::Schema(s) = &object.additional_properties {
                Some(s.clone())
            } else {
                None
            };
            let Some(next) = next else { return Vec::new() };
            let (next, next_base) = deref(resolver, &next, base_uri);
            let next_base = rebind_base(&next, &next_base);
            consumed.push(token.clone());
            let result = collect(&next, &next_base, rest, consumed, document_text, resolver);
            consumed.pop();
            result
        }
        SchemaKind::Array(array) => {
            let PathToken::Index(_) = token else {
                return Vec::new();
            };
            let next = array.items.clone().or_else(|| match &array.additional_items {
                AdditionalPolicy::Schema(s) => Some(s.clone()),
                _ => None,
            });
            let Some(next) = next else { return Vec::new() };
            let (next, next_base) = deref(resolver, &next, base_uri);
            let next_base = rebind_base(&next, &next_base);
            consumed.push(token.clone());
            let result = collect(&next, &next_base, rest, consumed, document_text, resolver);
            consumed.pop();
            result
        }
        _ => Vec::new(),
    }
}

/// `resolveRefAtLocation(schema, line, col)` (spec.md §4.N "Intra-schema
/// `$ref`"): when the cursor sits on the *value* of a `$ref` keyword,
/// return the range of the referenced schema node. A `$ref` that is
/// external (doesn't start with `#`) or fails to resolve yields no
/// locations.
#[must_use]
#[tracing::instrument(skip(schema_document_root, resolver))]
pub fn resolve_ref_at_location(
    schema_document_root: &ValueNode,
    resolver: &IdIndex,
    schema_base_uri: &str,
    pos: Position,
) -> Vec<Location> {
    let Some(hit) = kson_nav::find_at_coordinate(schema_document_root, pos) else {
        return Vec::new();
    };
    if hit.on_key {
        return Vec::new();
    }
    let is_ref_value = matches!(hit.path.last(), Some(PathToken::Property(key)) if key == "$ref");
    if !is_ref_value {
        return Vec::new();
    }
    let Some(reference) = hit.node.as_str() else {
        return Vec::new();
    };
    if !reference.starts_with('#') {
        return Vec::new();
    }

    let base = effective_base(schema_document_root, &hit.path, schema_base_uri);
    match resolver.resolve_ref(reference, &base) {
        Some(resolved) => vec![resolved.value.location],
        None => Vec::new(),
    }
}

/// The base URI in effect for the object directly containing the
/// property at `path`'s final segment: walk from `root`, applying each
/// object's own `$id` (if any) before moving on, same order
/// [`kson_resolve::IdIndex`]'s index-building walk uses.
fn effective_base(root: &ValueNode, path: &[PathToken], base_uri: &str) -> String {
    let mut current = root;
    let mut current_base = base_uri.to_string();
    apply_id(current, &mut current_base);

    let Some((_, prefix)) = path.split_last() else {
        return current_base;
    };
    for token in prefix {
        let next = match token {
            PathToken::Property(key) => current.as_object().and_then(|o| o.get(key)),
            PathToken::Index(i) => current.as_list().and_then(|l| l.elements.get(*i)).map(|e| &e.value),
        };
        let Some(next) = next else { return current_base };
        current = next;
        apply_id(current, &mut current_base);
    }
    current_base
}

fn apply_id(node: &ValueNode, base: &mut String) {
    if let Some(id) = node.as_object().and_then(|o| o.get("$id")).and_then(ValueNode::as_str) {
        *base = kson_resolve::uri::resolve(id, base).0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_parser::{parse, ParseConfig};
    use std::rc::Rc;

    fn pos_at(src: &str, needle: &str) -> Position {
        let offset = src.find(needle).expect("needle present") as u32;
        let line = src[..offset as usize].matches('\n').count() as u32;
        let col = offset - src[..offset as usize].rfind('\n').map_or(0, |i| i as u32 + 1);
        Position::new(line, col, offset)
    }

    /// spec.md §8 end-to-end scenario 3.
    #[test]
    fn jumps_from_ref_value_to_its_definition() {
        let schema_src = "user: {$ref: \"#/$defs/User\"}\n$defs: {User: {type: object}}";
        let root = Rc::new(parse(schema_src, &ParseConfig::default()).document.root);
        let index = IdIndex::build(Rc::clone(&root), "");
        let pos = pos_at(schema_src, "$defs/User");

        let locations = resolve_ref_at_location(&root, &index, "", pos);
        assert_eq!(locations.len(), 1);

        let expected = root
            .as_object()
            .unwrap()
            .get("$defs")
            .unwrap()
            .as_object()
            .unwrap()
            .get("User")
            .unwrap()
            .location;
        assert_eq!(locations[0], expected);
    }

    #[test]
    fn external_ref_yields_no_location() {
        let schema_src = "user: {$ref: \"http://example.com/other.json#/User\"}";
        let root = Rc::new(parse(schema_src, &ParseConfig::default()).document.root);
        let index = IdIndex::build(Rc::clone(&root), "");
        let pos = pos_at(schema_src, "http://example.com");
        assert!(resolve_ref_at_location(&root, &index, "", pos).is_empty());
    }

    #[test]
    fn document_to_schema_follows_object_property() {
        let schema_src = "properties: {name: {type: string}}";
        let schema_root = Rc::new(parse(schema_src, &ParseConfig::default()).document.root);
        let (schema, _) = build_schema(&schema_root);
        let index = IdIndex::build(Rc::clone(&schema_root), "");

        let doc_src = "name: Alice\n";
        let doc = parse(doc_src, &ParseConfig::default()).document.root;
        let pos = pos_at(doc_src, "Alice");

        let locations = get_schema_location_at_location(&doc, doc_src, &schema, &index, "", pos);
        assert_eq!(locations.len(), 1);
        let expected = schema_root.as_object().unwrap().get("properties").unwrap().as_object().unwrap().get("name").unwrap().location;
        assert_eq!(locations[0], expected);
    }

    #[test]
    fn all_of_returns_every_branch_location() {
        let schema_src =
            "allOf: [{properties: {name: {type: string, title: FromA}}}, {properties: {name: {type: string, title: FromB}}}]";
        let schema_root = Rc::new(parse(schema_src, &ParseConfig::default()).document.root);
        let (schema, _) = build_schema(&schema_root);
        let index = IdIndex::build(Rc::clone(&schema_root), "");

        let doc_src = "name: Alice\n";
        let doc = parse(doc_src, &ParseConfig::default()).document.root;
        let pos = pos_at(doc_src, "Alice");

        let locations = get_schema_location_at_location(&doc, doc_src, &schema, &index, "", pos);
        assert_eq!(locations.len(), 2);
    }

    #[test]
    fn one_of_narrows_to_the_validating_branch() {
        let schema_src = "properties: {kind: {oneOf: [\
            {properties: {type: {const: email}, recipient: {type: string}}}, \
            {properties: {type: {const: sms}, phoneNumber: {type: string}}}\
        ]}}";
        let schema_root = Rc::new(parse(schema_src, &ParseConfig::default()).document.root);
        let (schema, _) = build_schema(&schema_root);
        let index = IdIndex::build(Rc::clone(&schema_root), "");

        let doc_src = "kind:\n  type: email\n  recipient: bob\n";
        let doc = parse(doc_src, &ParseConfig::default()).document.root;
        let pos = pos_at(doc_src, "bob");

        let locations = get_schema_location_at_location(&doc, doc_src, &schema, &index, "", pos);
        assert_eq!(locations.len(), 1);
    }
}
