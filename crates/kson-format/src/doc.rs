//! Builds a [`wadler_lindig::Doc`] from a lowered [`kson_parser::Document`].
//!
//! Braced objects and bracketed lists use `Group`/`Line` so they
//! collapse to one line when they fit, while KSON's brace-free root
//! object, dash lists, and embed blocks are inherently multi-line and
//! are built from `Hardline` directly rather than through a `Group`.
use kson_parser::{Document, EmbedData, ListElement, ListForm, ListValue, ObjectEntry, ObjectValue, ValueKind, ValueNode};
use wadler_lindig::{print, Doc, PrintOptions};

use crate::config::FormatConfig;
use crate::quote::{format_number, format_string_value};

fn comment_doc(text: &str) -> Doc {
    if text.is_empty() {
        Doc::text("#")
    } else {
        Doc::text(format!("# {text}"))
    }
}

fn key_doc(key: &str) -> Doc {
    Doc::text(format_string_value(key))
}

/// Leading comments followed by same-line trailing comments, in that
/// order: trailing comments migrate to leading position whenever the
/// entry is rendered on its own line (spec.md §4.G), which every
/// context this formatter uses is.
fn comment_lines<'a>(leading: &'a [String], trailing: &'a [String], cfg: &FormatConfig) -> Vec<&'a str> {
    if !cfg.preserve_comments {
        return Vec::new();
    }
    leading.iter().chain(trailing.iter()).map(String::as_str).collect()
}

pub(crate) fn document_doc(document: &Document, cfg: &FormatConfig) -> Doc {
    let mut parts = Vec::new();
    for c in comment_lines(&document.leading_comments, &[], cfg) {
        parts.push(comment_doc(c));
        parts.push(Doc::Hardline);
    }
    parts.push(root_value_doc(&document.root, cfg));
    for c in comment_lines(&document.trailing_comments, &[], cfg) {
        parts.push(Doc::Hardline);
        parts.push(comment_doc(c));
    }
    Doc::concat(parts)
}

fn root_value_doc(value: &ValueNode, cfg: &FormatConfig) -> Doc {
    match &value.kind {
        ValueKind::Object(o) if !o.entries.is_empty() => brace_free_entries_doc(&o.entries, cfg),
        ValueKind::List(l) if !l.elements.is_empty() => list_doc(l, cfg),
        _ => value_doc(value, cfg),
    }
}

fn brace_free_entries_doc(entries: &[ObjectEntry], cfg: &FormatConfig) -> Doc {
    Doc::join(Doc::Hardline, entries.iter().map(|e| entry_doc_brace_free(e, cfg)))
}

/// `key: value`, except a list that falls back to dash form: that form
/// starts on its own indented line below the key rather than inline,
/// matching the canonical list-under-a-key layout (spec.md §8 scenario 1).
fn kv_doc(key: &str, value: &ValueNode, cfg: &FormatConfig) -> Doc {
    if let ValueKind::List(l) = &value.kind {
        if !l.elements.is_empty() && try_flat_bracket(l, cfg).is_none() {
            return Doc::concat([
                key_doc(key),
                Doc::text(":"),
                Doc::indent(Doc::concat([Doc::Hardline, dash_list_doc(l, cfg)])),
            ]);
        }
    }
    Doc::concat([key_doc(key), Doc::text(": "), value_doc(value, cfg)])
}

fn entry_doc_brace_free(entry: &ObjectEntry, cfg: &FormatConfig) -> Doc {
    let mut parts = Vec::new();
    for c in comment_lines(&entry.leading_comments, &entry.trailing_comments, cfg) {
        parts.push(comment_doc(c));
        parts.push(Doc::Hardline);
    }
    parts.push(kv_doc(&entry.key, &entry.value, cfg));
    Doc::concat(parts)
}

fn entry_doc_braced(entry: &ObjectEntry, cfg: &FormatConfig) -> Doc {
    let mut parts = Vec::new();
    let comments = comment_lines(&entry.leading_comments, &entry.trailing_comments, cfg);
    if !comments.is_empty() {
        parts.push(Doc::BreakParent);
    }
    for c in comments {
        parts.push(comment_doc(c));
        parts.push(Doc::Hardline);
    }
    parts.push(kv_doc(&entry.key, &entry.value, cfg));
    Doc::concat(parts)
}

fn braced_object_doc(obj: &ObjectValue, cfg: &FormatConfig) -> Doc {
    if obj.entries.is_empty() {
        return Doc::text("{}");
    }
    let items = obj.entries.iter().map(|e| entry_doc_braced(e, cfg));
    Doc::group(Doc::concat([
        Doc::text("{"),
        Doc::indent(Doc::concat([Doc::Line, Doc::join(Doc::concat([Doc::text(","), Doc::Line]), items)])),
        Doc::Line,
        Doc::text("}"),
    ]))
}

fn has_comments(elem: &ListElement) -> bool {
    !elem.leading_comments.is_empty() || !elem.trailing_comments.is_empty()
}

/// Render `list` as `[a, b, c]` if it has no comments and fits within
/// `cfg.print_width` on one line; `None` otherwise, meaning the caller
/// should fall back to dash form (spec.md §4.G: "bracketed form only if
/// the entire list fits one line").
fn try_flat_bracket(list: &ListValue, cfg: &FormatConfig) -> Option<String> {
    if list.elements.iter().any(has_comments) {
        return None;
    }
    let items = list.elements.iter().map(|e| value_doc(&e.value, cfg));
    let doc = Doc::concat([Doc::text("["), Doc::join(Doc::text(", "), items), Doc::text("]")]);
    let options = PrintOptions {
        print_width: usize::MAX / 2,
        ..cfg.print_options()
    };
    let rendered = print(&doc, &options);
    if rendered.contains('\n') {
        return None;
    }
    (rendered.chars().count() <= cfg.print_width).then_some(rendered)
}

fn list_doc(list: &ListValue, cfg: &FormatConfig) -> Doc {
    if list.elements.is_empty() {
        return Doc::text(if matches!(list.form, ListForm::Angled) { "<>" } else { "[]" });
    }
    if let Some(flat) = try_flat_bracket(list, cfg) {
        return Doc::text(flat);
    }
    dash_list_doc(list, cfg)
}

fn dash_list_doc(list: &ListValue, cfg: &FormatConfig) -> Doc {
    Doc::join(Doc::Hardline, list.elements.iter().map(|e| dash_element_doc(e, cfg)))
}

/// Wrap a dash list in `< >` when it appears as the value of another
/// dash element, where a bare nested run of dashes would be ambiguous
/// with its parent's own dashes (spec.md §4.G / §13).
fn angled_list_doc(list: &ListValue, cfg: &FormatConfig) -> Doc {
    Doc::concat([
        Doc::text("<"),
        Doc::indent(Doc::concat([Doc::Hardline, dash_list_doc(list, cfg)])),
        Doc::Hardline,
        Doc::text(">"),
    ])
}

fn dash_element_doc(elem: &ListElement, cfg: &FormatConfig) -> Doc {
    let mut parts = Vec::new();
    for c in comment_lines(&elem.leading_comments, &elem.trailing_comments, cfg) {
        parts.push(comment_doc(c));
        parts.push(Doc::Hardline);
    }
    parts.push(Doc::text("- "));
    match &elem.value.kind {
        ValueKind::Object(o) if !o.entries.is_empty() => {
            parts.push(Doc::Align(2, brace_free_entries_doc(&o.entries, cfg)));
        }
        ValueKind::List(inner) if !inner.elements.is_empty() && try_flat_bracket(inner, cfg).is_none() => {
            parts.push(angled_list_doc(inner, cfg));
        }
        _ => parts.push(value_doc(&elem.value, cfg)),
    }
    Doc::concat(parts)
}

fn embed_doc(embed: &EmbedData) -> Doc {
    let normalized = kson_embed::normalized_content(embed);
    let delimiter = kson_embed::choose_delimiter(&normalized);
    let mut header = String::new();
    header.push(delimiter);
    if let Some(tag) = &embed.tag {
        header.push_str(tag);
    }
    if let Some(metadata) = &embed.metadata {
        header.push_str(": ");
        header.push_str(metadata);
    }
    let close = delimiter.to_string().repeat(2);
    let encoded = kson_embed::encode_content(&normalized, delimiter, 2);
    let mut lines: Vec<&str> = encoded.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    let mut parts = vec![Doc::text(header)];
    for line in lines {
        parts.push(Doc::Hardline);
        parts.push(Doc::text(line.to_string()));
    }
    parts.push(Doc::Hardline);
    parts.push(Doc::text(close));
    Doc::concat(parts)
}

fn value_doc(value: &ValueNode, cfg: &FormatConfig) -> Doc {
    match &value.kind {
        ValueKind::Object(o) => braced_object_doc(o, cfg),
        ValueKind::List(l) => list_doc(l, cfg),
        ValueKind::String(s) => Doc::text(format_string_value(&s.value)),
        ValueKind::Number(n) => Doc::text(format_number(n)),
        ValueKind::Bool(b) => Doc::text(if *b { "true" } else { "false" }),
        ValueKind::Null => Doc::text("null"),
        ValueKind::Embed(e) => embed_doc(e),
        ValueKind::Error => Doc::text("null"),
    }
}
