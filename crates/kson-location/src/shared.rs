//! Helpers shared by completion and hover (spec.md §4.N): expanding a
//! schema through its combinators down to the concrete variants that
//! apply at a document path, and rendering a short type summary.

use kson_nav::PathToken;
use kson_resolve::IdIndex;
use kson_schema::{build_schema, SchemaKind, SchemaRef};

/// Follow `$ref` chains starting at `schema` until a non-`Ref` node is
/// reached, same recipe `kson-resolve`/`kson-validate` already use.
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

/// Expand `schema` through `allOf` (flatten every branch) and
/// `anyOf`/`oneOf` (flatten every branch the document at `path` actually
/// validates against, via [`kson_nav::get_valid_schemas`]) down to the
/// concrete, non-combinator variants a completion or hover pass should
/// inspect directly.
#[must_use]
pub fn expand_variants(
    schema: &SchemaRef,
    document_text: &str,
    path: &[PathToken],
    resolver: &IdIndex,
    base_uri: &str,
) -> Vec<SchemaRef> {
    let (schema, base_uri) = deref(resolver, schema, base_uri);
    match &schema.kind {
        SchemaKind::AllOf(subs) => subs
            .iter()
            .flat_map(|s| expand_variants(s, document_text, path, resolver, &base_uri))
            .collect(),
        SchemaKind::AnyOf(subs) | SchemaKind::OneOf(subs) => {
            let valid = kson_nav::get_valid_schemas(subs, document_text, path, resolver, &base_uri);
            let candidates = if valid.is_empty() { subs.clone() } else { valid };
            candidates
                .iter()
                .flat_map(|s| expand_variants(s, document_text, path, resolver, &base_uri))
                .collect()
        }
        _ => vec![schema],
    }
}

/// A one-line summary for a completion item's `detail` field: the
/// schema's `title` if present, else its declared type name(s), else a
/// generic fallback.
#[must_use]
pub fn brief_summary(schema: &SchemaRef) -> String {
    if let Some(title) = &schema.meta.title {
        return title.clone();
    }
    let types = schema.type_names();
    if types.is_empty() {
        "schema".to_string()
    } else {
        types.join(" | ")
    }
}
