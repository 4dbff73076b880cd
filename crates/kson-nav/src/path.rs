//! Document path tokens and strict path navigation (spec.md §4.M).

use kson_parser::ValueNode;

/// One step of a path from a document root to a node: a property name,
/// or an array index. Unlike [`kson_resolve::DocumentPathToken`] (which
/// discards the concrete index because every array element shares one
/// `items` schema), navigation over the *document* needs the real index
/// to walk into the right element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    Property(String),
    Index(usize),
}

impl PathToken {
    /// Render as the string form used by the end-to-end path-at-cursor
    /// scenario (spec.md §8 #1: `["users","0","name"]`) — an index
    /// becomes its decimal string, same as a property name.
    #[must_use]
    pub fn as_string(&self) -> String {
        match self {
            PathToken::Property(s) => s.clone(),
            PathToken::Index(i) => i.to_string(),
        }
    }
}

/// Render a path as the plain-string tokens used in end-to-end
/// scenarios and most host-side APIs.
#[must_use]
pub fn path_to_strings(path: &[PathToken]) -> Vec<String> {
    path.iter().map(PathToken::as_string).collect()
}

/// Convert to `kson_resolve`'s document-path token type, which the
/// schema side of navigation consumes (indices are positionally
/// meaningless there: every element shares `items`).
#[must_use]
pub fn to_document_path_tokens(path: &[PathToken]) -> Vec<kson_resolve::DocumentPathToken> {
    path.iter()
        .map(|t| match t {
            PathToken::Property(s) => kson_resolve::DocumentPathToken::Property(s.clone()),
            PathToken::Index(i) => kson_resolve::DocumentPathToken::Index(*i),
        })
        .collect()
}

/// `navigateByTokens(root, tokens)` (spec.md §4.M): a strict path walk
/// that returns `None` on any mismatch — no fallback to
/// `patternProperties`/`additionalProperties`-style leniency, since this
/// walks the *document*, not a schema.
#[must_use]
pub fn navigate_by_tokens<'a>(root: &'a ValueNode, tokens: &[PathToken]) -> Option<&'a ValueNode> {
    let mut current = root;
    for token in tokens {
        current = match token {
            PathToken::Property(name) => current.as_object()?.get(name)?,
            PathToken::Index(i) => &current.as_list()?.elements.get(*i)?.value,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_parser::{parse, ParseConfig};

    fn doc(src: &str) -> ValueNode {
        parse(src, &ParseConfig::default()).document.root
    }

    #[test]
    fn navigates_nested_property_and_index() {
        let root = doc("users:\n  - name: Alice\n  - name: Bob\n");
        let found = navigate_by_tokens(
            &root,
            &[
                PathToken::Property("users".into()),
                PathToken::Index(1),
                PathToken::Property("name".into()),
            ],
        );
        assert_eq!(found.and_then(ValueNode::as_str), Some("Bob"));
    }

    #[test]
    fn mismatched_token_yields_none() {
        let root = doc("a: 1\n");
        assert!(navigate_by_tokens(&root, &[PathToken::Property("b".into())]).is_none());
    }

    #[test]
    fn string_rendering_matches_end_to_end_scenario() {
        let path = vec![
            PathToken::Property("users".into()),
            PathToken::Index(0),
            PathToken::Property("name".into()),
        ];
        assert_eq!(path_to_strings(&path), vec!["users", "0", "name"]);
    }
}
