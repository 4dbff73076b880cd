//! CST → value tree lowering (spec.md §4.E): a single pass that attaches
//! each comment to the most specific value node per the adjacency policy
//! described there.

use kson_diagnostics::Location;
use kson_lexer::{classify_number, TokenKind};

use crate::cst::{CstElement, CstKind, CstNode};
use crate::value::{
    Document, EmbedData, ListElement, ListForm, ListValue, ObjectEntry, ObjectValue, QuoteStyle,
    StringData, ValueKind, ValueNode,
};

fn comment_text(raw: &str) -> String {
    raw.trim_start_matches('#').trim().to_string()
}

/// Lower a `Root` CST node into a `Document`, splitting off any leading
/// comments (before the value) and trailing comments (after it, with no
/// following value — spec.md §4.E).
#[must_use]
pub fn lower_document(root: &CstNode, source: &str) -> Document {
    let mut leading_comments = Vec::new();
    let mut value_node = None;
    let mut trailing_comments = Vec::new();
    for child in &root.children {
        match child {
            CstElement::Token(t) if t.kind == TokenKind::Comment => {
                if value_node.is_none() {
                    leading_comments.push(comment_text(&t.text));
                } else {
                    trailing_comments.push(comment_text(&t.text));
                }
            }
            CstElement::Node(n) if value_node.is_none() => {
                value_node = Some(lower_value(n, source));
            }
            _ => {}
        }
    }
    let root_value = value_node.unwrap_or(ValueNode::new(root.range, ValueKind::Error));
    Document {
        leading_comments,
        root: root_value,
        trailing_comments,
    }
}

fn lower_value(node: &CstNode, source: &str) -> ValueNode {
    match node.kind {
        CstKind::Object => lower_object(node, source),
        CstKind::List => lower_list(node, source),
        CstKind::String => lower_string(node, source),
        CstKind::Ident => lower_ident(node),
        CstKind::Number => {
            let text = token_text(node);
            ValueNode::new(node.range, ValueKind::Number(classify_number(&text)))
        }
        CstKind::Bool => {
            let text = token_text(node);
            ValueNode::new(node.range, ValueKind::Bool(text == "true"))
        }
        CstKind::Null => ValueNode::new(node.range, ValueKind::Null),
        CstKind::Embed => lower_embed(node),
        CstKind::Error | CstKind::ObjectEntry | CstKind::ListElement | CstKind::Root => {
            ValueNode::new(node.range, ValueKind::Error)
        }
    }
}

fn token_text(node: &CstNode) -> String {
    node.children
        .iter()
        .find_map(|c| match c {
            CstElement::Token(t) => Some(t.text.clone()),
            CstElement::Node(_) => None,
        })
        .unwrap_or_default()
}

fn lower_string(node: &CstNode, source: &str) -> ValueNode {
    let text = token_text(node);
    let quote_char = source.as_bytes().get(node.range.start.offset as usize).copied();
    let quote = match quote_char {
        Some(b'\'') => QuoteStyle::Single,
        _ => QuoteStyle::Double,
    };
    ValueNode::new(
        node.range,
        ValueKind::String(StringData { value: text, quote }),
    )
}

fn lower_ident(node: &CstNode) -> ValueNode {
    let text = token_text(node);
    ValueNode::new(
        node.range,
        ValueKind::String(StringData {
            value: text,
            quote: QuoteStyle::Unquoted,
        }),
    )
}

fn lower_embed(node: &CstNode) -> ValueNode {
    let mut delimiter = '%';
    let mut tag = None;
    let mut metadata = None;
    let mut content = String::new();
    for child in &node.children {
        if let CstElement::Token(t) = child {
            match t.kind {
                TokenKind::EmbedOpenDelim => {
                    delimiter = t.text.chars().next().unwrap_or('%');
                }
                TokenKind::EmbedTag => tag = Some(t.text.clone()),
                TokenKind::EmbedMetadata => metadata = Some(t.text.clone()),
                TokenKind::EmbedContent => content = t.text.clone(),
                _ => {}
            }
        }
    }
    ValueNode::new(
        node.range,
        ValueKind::Embed(EmbedData {
            tag,
            metadata,
            content,
            delimiter,
        }),
    )
}

fn lower_object(node: &CstNode, source: &str) -> ValueNode {
    let mut entries = Vec::new();
    for child in &node.children {
        if let CstElement::Node(entry) = child {
            if entry.kind == CstKind::ObjectEntry {
                entries.push(lower_object_entry(entry, source));
            }
        }
    }
    ValueNode::new(node.range, ValueKind::Object(ObjectValue { entries }))
}

fn lower_object_entry(node: &CstNode, source: &str) -> ObjectEntry {
    let mut leading_comments = Vec::new();
    let mut trailing_comments = Vec::new();
    let mut key = String::new();
    let mut key_location = node.range;
    let mut value = None;
    let mut seen_key = false;
    for child in &node.children {
        match child {
            CstElement::Token(t) if t.kind == TokenKind::Comment => {
                if value.is_none() {
                    leading_comments.push(comment_text(&t.text));
                } else {
                    trailing_comments.push(comment_text(&t.text));
                }
            }
            CstElement::Token(t) if matches!(t.kind, TokenKind::Ident | TokenKind::String) && !seen_key => {
                key = t.text.clone();
                key_location = t.range;
                seen_key = true;
            }
            CstElement::Node(n) if value.is_none() => {
                value = Some(lower_value(n, source));
            }
            _ => {}
        }
    }
    let value = value.unwrap_or(ValueNode::new(node.range, ValueKind::Error));
    ObjectEntry {
        key,
        key_location,
        value,
        location: node.range,
        leading_comments,
        trailing_comments,
    }
}

fn list_form(node: &CstNode) -> ListForm {
    for child in &node.children {
        if let CstElement::Token(t) = child {
            match t.kind {
                TokenKind::BracketL => return ListForm::Bracketed,
                TokenKind::AngleL => return ListForm::Angled,
                _ => {}
            }
        }
    }
    ListForm::Dashed
}

fn lower_list(node: &CstNode, source: &str) -> ValueNode {
    let form = list_form(node);
    let mut elements = Vec::new();
    for child in &node.children {
        if let CstElement::Node(elem) = child {
            if elem.kind == CstKind::ListElement {
                elements.push(lower_list_element(elem, source));
            }
        }
    }
    ValueNode::new(node.range, ValueKind::List(ListValue { form, elements }))
}

fn lower_list_element(node: &CstNode, source: &str) -> ListElement {
    let mut leading_comments = Vec::new();
    let mut trailing_comments = Vec::new();
    let mut value = None;
    for child in &node.children {
        match child {
            CstElement::Token(t) if t.kind == TokenKind::Comment => {
                if value.is_none() {
                    leading_comments.push(comment_text(&t.text));
                } else {
                    trailing_comments.push(comment_text(&t.text));
                }
            }
            CstElement::Node(n) if value.is_none() => {
                value = Some(lower_value(n, source));
            }
            _ => {}
        }
    }
    let value = value.unwrap_or(ValueNode::new(node.range, ValueKind::Error));
    ListElement {
        value,
        leading_comments,
        trailing_comments,
    }
}

/// True if `loc` is strictly inside `parent` (spec.md §3 invariant).
#[must_use]
pub fn location_inside(loc: &Location, parent: &Location) -> bool {
    parent.start.offset <= loc.start.offset && loc.end.offset <= parent.end.offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_tokens, ParseConfig};
    use kson_lexer::lex;

    fn lower_src(src: &str) -> Document {
        let (tokens, _) = lex(src);
        let (cst, _) = parse_tokens(&tokens, &ParseConfig::default());
        lower_document(&cst, src)
    }

    #[test]
    fn lowers_scalar_entries() {
        let doc = lower_src("a: 1\nb: true");
        let obj = doc.root.as_object().unwrap();
        assert_eq!(obj.entries.len(), 2);
        assert_eq!(obj.entries[0].key, "a");
        assert_eq!(obj.entries[1].value.as_bool(), Some(true));
    }

    #[test]
    fn lowers_nested_dash_list_of_objects() {
        let doc = lower_src("users:\n  - name: Alice\n    age: 30\n  - name: Bob");
        let obj = doc.root.as_object().unwrap();
        let users = obj.get("users").unwrap().as_list().unwrap();
        assert_eq!(users.elements.len(), 2);
        let first = users.elements[0].value.as_object().unwrap();
        assert_eq!(first.get("name").unwrap().as_str(), Some("Alice"));
        assert_eq!(
            first.get("age").unwrap().as_number().unwrap().as_f64(),
            30.0
        );
    }

    #[test]
    fn attaches_leading_and_trailing_comments() {
        let doc = lower_src("# a\nkey: val # b\n");
        let obj = doc.root.as_object().unwrap();
        assert_eq!(obj.entries[0].leading_comments, vec!["a".to_string()]);
        assert_eq!(obj.entries[0].trailing_comments, vec!["b".to_string()]);
    }
}
