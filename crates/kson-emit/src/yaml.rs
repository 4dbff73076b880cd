//! `toYaml` (spec.md §6): a minimal block-style YAML emitter over the
//! value tree. Follows established block-YAML conventions (a
//! sequence under a key indents two further than its key, a block
//! literal `|` carries embedded multi-line content) rather than an
//! AST/printer pipeline, which exists to re-flow parsed YAML rather
//! than project a foreign tree onto YAML syntax.
use kson_parser::{EmbedData, ListElement, NumberValue, ObjectEntry, ValueKind, ValueNode};

/// `retain_embed_tags`: when `true`, an embed block serializes as a
/// nested mapping `{embedTag, embedMetadata, embedContent}`; when
/// `false` (the default for YAML, since a block literal is the more
/// natural rendering of embedded text), it becomes a `|` block scalar
/// and the tag/metadata are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct YamlEmitConfig {
    pub retain_embed_tags: bool,
}

impl Default for YamlEmitConfig {
    fn default() -> Self {
        Self {
            retain_embed_tags: false,
        }
    }
}

const RESERVED_SCALARS: [&str; 9] = [
    "true", "false", "null", "~", "yes", "no", "Yes", "No",
];

fn needs_quoting(s: &str) -> bool {
    if s.is_empty() || RESERVED_SCALARS.contains(&s) || s.parse::<f64>().is_ok() {
        return true;
    }
    let first = s.chars().next().expect("non-empty checked above");
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) {
        return true;
    }
    if s.starts_with(' ') || s.ends_with(' ') || s.contains(": ") || s.contains(" #") || s.contains('\n') {
        return true;
    }
    false
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn yaml_string(s: &str) -> String {
    if needs_quoting(s) {
        quote(s)
    } else {
        s.to_string()
    }
}

fn yaml_number(n: &NumberValue) -> String {
    match n {
        NumberValue::Integer(i) => i.to_string(),
        NumberValue::Decimal(_, lexeme) => lexeme.to_lowercase(),
    }
}

/// A scalar rendering of `value`, or `None` if it needs block layout
/// (non-empty object/list, or an embed as a nested mapping).
fn inline_scalar(value: &ValueNode, config: &YamlEmitConfig) -> Option<String> {
    match &value.kind {
        ValueKind::Null | ValueKind::Error => Some("null".to_string()),
        ValueKind::Bool(b) => Some(b.to_string()),
        ValueKind::Number(n) => Some(yaml_number(n)),
        ValueKind::String(s) => Some(yaml_string(&s.value)),
        ValueKind::Object(o) if o.entries.is_empty() => Some("{}".to_string()),
        ValueKind::List(l) if l.elements.is_empty() => Some("[]".to_string()),
        ValueKind::Embed(_) if config.retain_embed_tags => None,
        _ => None,
    }
}

fn push_indent(out: &mut String, indent: usize) {
    out.push_str(&" ".repeat(indent));
}

fn emit_embed(embed: &EmbedData, indent: usize, out: &mut String) {
    out.push_str("|\n");
    let normalized = kson_embed::normalized_content(embed);
    let content_indent = indent + 2;
    for line in normalized.lines() {
        push_indent(out, content_indent);
        out.push_str(line);
        out.push('\n');
    }
}

fn emit_after_key(value: &ValueNode, indent: usize, config: &YamlEmitConfig, out: &mut String) {
    if let Some(scalar) = inline_scalar(value, config) {
        out.push(' ');
        out.push_str(&scalar);
        out.push('\n');
        return;
    }
    match &value.kind {
        ValueKind::Object(o) => {
            out.push('\n');
            emit_mapping(&o.entries, indent + 2, config, out);
        }
        ValueKind::List(l) => {
            out.push('\n');
            emit_sequence(&l.elements, indent + 2, config, out);
        }
        ValueKind::Embed(_) if config.retain_embed_tags => {
            out.push('\n');
            emit_mapping(&kson_embed::embed_to_object(value).as_object().expect("embed_to_object returns an object").entries, indent + 2, config, out);
        }
        ValueKind::Embed(e) => {
            out.push(' ');
            emit_embed(e, indent, out);
        }
        _ => unreachable!("inline_scalar handles every remaining case"),
    }
}

fn emit_mapping(entries: &[ObjectEntry], indent: usize, config: &YamlEmitConfig, out: &mut String) {
    for entry in entries {
        push_indent(out, indent);
        out.push_str(&yaml_string(&entry.key));
        out.push(':');
        emit_after_key(&entry.value, indent, config, out);
    }
}

fn emit_sequence(elements: &[ListElement], indent: usize, config: &YamlEmitConfig, out: &mut String) {
    for element in elements {
        push_indent(out, indent);
        out.push('-');
        match &element.value.kind {
            ValueKind::Object(o) if !o.entries.is_empty() => {
                out.push(' ');
                emit_mapping_inline_first(&o.entries, indent, config, out);
            }
            _ => emit_after_key_no_colon(&element.value, indent, config, out),
        }
    }
}

/// A sequence element whose value is an object renders its first entry
/// inline after the dash and the rest indented two past the dash, the
/// standard block-YAML rendering for a mapping nested in a sequence.
fn emit_mapping_inline_first(entries: &[ObjectEntry], indent: usize, config: &YamlEmitConfig, out: &mut String) {
    let (first, rest) = entries.split_first().expect("caller only invokes this for a non-empty object");
    out.push_str(&yaml_string(&first.key));
    out.push(':');
    emit_after_key(&first.value, indent + 2, config, out);
    emit_mapping(rest, indent + 2, config, out);
}

fn emit_after_key_no_colon(value: &ValueNode, indent: usize, config: &YamlEmitConfig, out: &mut String) {
    if let Some(scalar) = inline_scalar(value, config) {
        out.push(' ');
        out.push_str(&scalar);
        out.push('\n');
        return;
    }
    match &value.kind {
        ValueKind::List(l) => {
            out.push('\n');
            emit_sequence(&l.elements, indent + 2, config, out);
        }
        ValueKind::Embed(e) if !config.retain_embed_tags => {
            out.push(' ');
            emit_embed(e, indent, out);
        }
        ValueKind::Embed(_) => {
            out.push('\n');
            emit_mapping(&kson_embed::embed_to_object(value).as_object().expect("object").entries, indent + 2, config, out);
        }
        _ => unreachable!("inline_scalar handles every remaining case"),
    }
}

/// `toYaml` (spec.md §6): render `value` as block-style YAML.
#[must_use]
pub fn to_yaml(value: &ValueNode, config: &YamlEmitConfig) -> String {
    let mut out = String::new();
    match &value.kind {
        ValueKind::Object(o) if !o.entries.is_empty() => emit_mapping(&o.entries, 0, config, &mut out),
        ValueKind::List(l) if !l.elements.is_empty() => emit_sequence(&l.elements, 0, config, &mut out),
        _ => {
            out.push_str(&inline_scalar(value, config).unwrap_or_else(|| "null".to_string()));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_parser::{parse, ParseConfig};
    use pretty_assertions::assert_eq;

    fn root(src: &str) -> ValueNode {
        parse(src, &ParseConfig::default()).document.root
    }

    #[test]
    fn emits_simple_mapping() {
        let value = root("a: 1\nb: 2\n");
        assert_eq!(to_yaml(&value, &YamlEmitConfig::default()), "a: 1\nb: 2\n");
    }

    #[test]
    fn emits_nested_mapping_indented() {
        let value = root("key:\n  nested: value\n");
        assert_eq!(to_yaml(&value, &YamlEmitConfig::default()), "key:\n  nested: value\n");
    }

    #[test]
    fn emits_sequence_under_key_indented_by_two() {
        let value = root("f: [a, b, c]\n");
        assert_eq!(to_yaml(&value, &YamlEmitConfig::default()), "f:\n  - a\n  - b\n  - c\n");
    }

    #[test]
    fn emits_sequence_of_mappings() {
        let value = root("- a: b\n  c: d\n");
        assert_eq!(to_yaml(&value, &YamlEmitConfig::default()), "- a: b\n  c: d\n");
    }

    #[test]
    fn quotes_reserved_looking_scalars() {
        let value = root("a: \"true\"\nb: \"123\"\n");
        let out = to_yaml(&value, &YamlEmitConfig::default());
        assert_eq!(out, "a: \"true\"\nb: \"123\"\n");
    }

    #[test]
    fn embed_becomes_block_literal_by_default() {
        let value = root("q: %sql\n  select 1\n  %%");
        let out = to_yaml(&value, &YamlEmitConfig::default());
        assert_eq!(out, "q: |\n  select 1\n");
    }

    #[test]
    fn embed_becomes_nested_mapping_when_tags_retained() {
        let value = root("q: %sql\n  select 1\n  %%");
        let config = YamlEmitConfig {
            retain_embed_tags: true,
        };
        let out = to_yaml(&value, &config);
        assert!(out.contains("embedTag: sql"));
        assert!(out.contains("embedContent:"));
    }
}
