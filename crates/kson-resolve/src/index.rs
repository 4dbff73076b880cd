//! ID index construction and `$ref` resolution (spec.md §4.K).

use std::collections::HashMap;
use std::rc::Rc;

use kson_parser::ValueNode;
use once_cell::sync::Lazy;

use crate::json_value::from_json;
use crate::uri;

/// One step of a path from a document root to an indexed node: either a
/// property name or an array index, recorded so the node can be
/// re-navigated to on demand rather than cloned into the index.
#[derive(Debug, Clone)]
enum PathSeg {
    Key(String),
    Index(usize),
}

/// Which document a recorded path navigates: the caller's schema, or
/// the pre-seeded draft-07 meta-schema.
#[derive(Debug, Clone)]
enum Source {
    Document(Vec<PathSeg>),
    Meta(Vec<PathSeg>),
}

static META_SCHEMA_VALUE: Lazy<ValueNode> = Lazy::new(|| from_json(&kson_schema::DRAFT07_META_SCHEMA));

fn navigate_path<'a>(root: &'a ValueNode, path: &[PathSeg]) -> Option<&'a ValueNode> {
    let mut current = root;
    for seg in path {
        current = match seg {
            PathSeg::Key(key) => current.as_object()?.get(key)?,
            PathSeg::Index(i) => &current.as_list()?.elements.get(*i)?.value,
        };
    }
    Some(current)
}

/// The result of a successful `$ref` resolution: the referenced value
/// (cloned out of the index, so resolution doesn't entangle the
/// resolver's own lifetime with its callers') and the base URI it
/// should be interpreted under for further `$ref`s inside it.
#[derive(Debug, Clone)]
pub struct ResolvedRef {
    pub value: ValueNode,
    pub base_uri: String,
}

/// Maps fully-qualified URI to schema-value node (spec.md §5), built
/// once per schema document by a depth-first walk that resolves each
/// `$id` against its enclosing base URI. Always pre-seeded with the
/// draft-07 meta-schema at its canonical URI.
///
/// Owns its document root via `Rc` rather than borrowing it, so a
/// `Schema` facade can hold both the parsed document and its index
/// without running into self-referential-struct lifetimes.
pub struct IdIndex {
    root: Rc<ValueNode>,
    entries: HashMap<String, Source>,
}

impl IdIndex {
    /// Build the index for `root`, a parsed schema document, interpreted
    /// under `base_uri` (the document's own URI, or `""` if unknown).
    #[must_use]
    #[tracing::instrument(skip_all)]
    pub fn build(root: Rc<ValueNode>, base_uri: &str) -> Self {
        let mut index = Self {
            root,
            entries: HashMap::new(),
        };
        index.seed_meta_schema();
        let root = Rc::clone(&index.root);
        index.walk(&root, base_uri, Vec::new(), false);
        index
    }

    fn seed_meta_schema(&mut self) {
        self.entries.insert(
            kson_schema::DRAFT07_META_SCHEMA_URI.to_string(),
            Source::Meta(Vec::new()),
        );
        self.walk(&META_SCHEMA_VALUE, kson_schema::DRAFT07_META_SCHEMA_URI, Vec::new(), true);
    }

    fn walk(&mut self, node: &ValueNode, base_uri: &str, path: Vec<PathSeg>, is_meta: bool) {
        let mut current_base = base_uri.to_string();
        if let Some(obj) = node.as_object() {
            if let Some(id_value) = obj.get("$id").and_then(ValueNode::as_str) {
                let (resolved, fragment) = uri::resolve(id_value, &current_base);
                let full = uri::with_fragment(&resolved, &fragment);
                let source = if is_meta {
                    Source::Meta(path.clone())
                } else {
                    Source::Document(path.clone())
                };
                self.entries.insert(full, source);
                current_base = resolved;
            }
            for entry in &obj.entries {
                let mut child_path = path.clone();
                child_path.push(PathSeg::Key(entry.key.clone()));
                self.walk(&entry.value, &current_base, child_path, is_meta);
            }
        } else if let Some(list) = node.as_list() {
            for (i, element) in list.elements.iter().enumerate() {
                let mut child_path = path.clone();
                child_path.push(PathSeg::Index(i));
                self.walk(&element.value, &current_base, child_path, is_meta);
            }
        }
    }

    fn root_for(&self, source: &Source) -> &ValueNode {
        match source {
            Source::Document(_) => &self.root,
            Source::Meta(_) => &META_SCHEMA_VALUE,
        }
    }

    fn path_for(source: &Source) -> &[PathSeg] {
        match source {
            Source::Document(p) | Source::Meta(p) => p,
        }
    }

    fn lookup(&self, uri: &str) -> Option<ValueNode> {
        let source = self.entries.get(uri)?;
        navigate_path(self.root_for(source), Self::path_for(source)).cloned()
    }

    /// `resolveRef(ref, baseUri) -> ResolvedRef{value, baseUri}` (spec.md
    /// §4.K): direct lookup, then JSON-Pointer fragment navigation, then
    /// plain-name fragment lookup; `None` on failure.
    #[must_use]
    #[tracing::instrument(skip(self))]
    pub fn resolve_ref(&self, reference: &str, base_uri: &str) -> Option<ResolvedRef> {
        let (resolved_uri, fragment) = uri::resolve(reference, base_uri);
        let combined = uri::with_fragment(&resolved_uri, &fragment);

        if let Some(value) = self.lookup(&combined) {
            return Some(ResolvedRef {
                value,
                base_uri: resolved_uri,
            });
        }

        if let Some(pointer) = fragment.strip_prefix('/') {
            let base_value = self.lookup(&resolved_uri)?;
            let decoded = percent_decode(pointer);
            let value = navigate_pointer(&base_value, &decoded)?.clone();
            return Some(ResolvedRef {
                value,
                base_uri: resolved_uri,
            });
        }

        if !fragment.is_empty() {
            // Legacy draft-04/07 plain-name anchor: a bare `$id` without a
            // leading `#` is indexed as an ordinary relative URI (spec.md
            // §4.K's ID-index walk resolves it the same way), so look the
            // fragment name up as a relative reference against the resolved
            // URI rather than appending it as a `#fragment`.
            let (by_name, _) = uri::resolve(&fragment, &resolved_uri);
            if let Some(value) = self.lookup(&by_name) {
                return Some(ResolvedRef {
                    value,
                    base_uri: resolved_uri,
                });
            }
        }

        None
    }
}

/// Minimal percent-decoding for the handful of characters RFC 6901
/// fragments can carry (spec.md §4.K: "decode percent-escapes").
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                if let Ok(byte) = u8::from_str_radix(hex, 16) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| s.to_string())
}

/// Walk a decoded RFC-6901 JSON-Pointer (already percent-decoded) into
/// `root`: `~1`/`~0` segment escapes, with an array-index fallback when
/// the current node is a list.
fn navigate_pointer<'a>(root: &'a ValueNode, pointer: &str) -> Option<&'a ValueNode> {
    if pointer.is_empty() {
        return Some(root);
    }
    let mut current = root;
    for raw_segment in pointer.trim_start_matches('/').split('/') {
        let segment = kson_pointer::decode_segment(raw_segment);
        current = if let Some(obj) = current.as_object() {
            obj.get(&segment)?
        } else if let Some(list) = current.as_list() {
            let index: usize = segment.parse().ok()?;
            &list.elements.get(index)?.value
        } else {
            return None;
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_parser::{parse, ParseConfig};

    fn doc(src: &str) -> Rc<ValueNode> {
        Rc::new(parse(src, &ParseConfig::default()).document.root)
    }

    #[test]
    fn direct_id_lookup_resolves() {
        let root = doc("$id: \"http://example.com/root.json\"\n$defs: {thing: {$id: \"thing.json\", type: string}}");
        let index = IdIndex::build(Rc::clone(&root), "http://example.com/root.json");
        let resolved = index.resolve_ref("thing.json", "http://example.com/root.json");
        assert!(resolved.is_some());
        assert_eq!(resolved.unwrap().base_uri, "http://example.com/thing.json");
    }

    #[test]
    fn json_pointer_fragment_navigates_into_base() {
        let root = doc("$defs: {thing: {type: string}}");
        let index = IdIndex::build(Rc::clone(&root), "http://example.com/root.json");
        let resolved = index.resolve_ref("#/$defs/thing", "http://example.com/root.json");
        let value = resolved.expect("pointer should resolve").value;
        assert_eq!(value.as_object().unwrap().get("type").unwrap().as_str(), Some("string"));
    }

    #[test]
    fn meta_schema_is_preseeded() {
        let root = doc("type: object");
        let index = IdIndex::build(Rc::clone(&root), "");
        let resolved = index.resolve_ref(kson_schema::DRAFT07_META_SCHEMA_URI, "");
        assert!(resolved.is_some());
    }

    #[test]
    fn plain_name_id_without_fragment_hash_is_resolved_by_ref() {
        let root = doc("$id: \"http://example.com/root.json\"\n$defs: {thing: {$id: \"foo\", type: string}}");
        let index = IdIndex::build(Rc::clone(&root), "http://example.com/root.json");
        let resolved = index.resolve_ref("#foo", "http://example.com/root.json");
        let value = resolved.expect("plain-name anchor should resolve").value;
        assert_eq!(value.as_object().unwrap().get("type").unwrap().as_str(), Some("string"));
    }

    #[test]
    fn unknown_ref_resolves_to_none() {
        let root = doc("type: object");
        let index = IdIndex::build(Rc::clone(&root), "http://example.com/root.json");
        assert!(index.resolve_ref("#/nope", "http://example.com/root.json").is_none());
    }
}
