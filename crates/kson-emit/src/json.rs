//! `toJson` (spec.md §6): converts a lowered value tree to `serde_json`'s
//! `Value`, the same conversion `kson-schema` uses for `const`/`enum`
//! literals, here driven instead by `retain_embed_tags`.
use kson_parser::{NumberValue, ValueKind, ValueNode};
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// `retain_embed_tags`: when `true` (the default), an embed block
/// serializes to its isomorphic `{embedTag, embedMetadata,
/// embedContent}` object (spec.md §4.F); when `false`, it collapses to
/// its bare content string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsonEmitConfig {
    pub retain_embed_tags: bool,
    pub indent: usize,
}

impl Default for JsonEmitConfig {
    fn default() -> Self {
        Self {
            retain_embed_tags: true,
            indent: 2,
        }
    }
}

fn number_to_json(n: &NumberValue) -> Value {
    match n {
        NumberValue::Integer(i) => Value::Number(Number::from(*i)),
        NumberValue::Decimal(f, _) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
    }
}

/// Convert `value` to a `serde_json::Value`.
#[must_use]
pub fn to_json(value: &ValueNode, config: &JsonEmitConfig) -> Value {
    match &value.kind {
        ValueKind::Null | ValueKind::Error => Value::Null,
        ValueKind::Bool(b) => Value::Bool(*b),
        ValueKind::Number(n) => number_to_json(n),
        ValueKind::String(s) => Value::String(s.value.clone()),
        ValueKind::Embed(e) => {
            if config.retain_embed_tags {
                to_json(&kson_embed::embed_to_object(value), config)
            } else {
                Value::String(kson_embed::normalized_content(e))
            }
        }
        ValueKind::List(l) => Value::Array(l.elements.iter().map(|e| to_json(&e.value, config)).collect()),
        ValueKind::Object(o) => {
            let mut map = Map::new();
            for entry in &o.entries {
                map.insert(entry.key.clone(), to_json(&entry.value, config));
            }
            Value::Object(map)
        }
    }
}

/// `toJson` (spec.md §6): render `value` as a pretty-printed JSON
/// string, indented by `config.indent` spaces.
#[must_use]
pub fn to_json_string(value: &ValueNode, config: &JsonEmitConfig) -> String {
    let json = to_json(value, config);
    let indent = " ".repeat(config.indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    json.serialize(&mut ser).expect("serde_json::Value always serializes");
    let mut out = String::from_utf8(buf).expect("serde_json only emits valid UTF-8");
    out.push('\n');
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
    fn converts_scalars_and_nesting() {
        let value = root("a: 1\nb: [1, 2]\nc: true\nd: null\n");
        let json = to_json(&value, &JsonEmitConfig::default());
        assert_eq!(json["a"], 1);
        assert_eq!(json["b"], serde_json::json!([1, 2]));
        assert_eq!(json["c"], true);
        assert!(json["d"].is_null());
    }

    #[test]
    fn embed_retains_tag_by_default() {
        let value = root("q: %sql\n  select 1\n  %%");
        let json = to_json(&value, &JsonEmitConfig::default());
        assert_eq!(json["q"]["embedTag"], "sql");
        assert_eq!(json["q"]["embedContent"], "select 1\n");
    }

    #[test]
    fn embed_collapses_to_content_when_tags_dropped() {
        let value = root("q: %sql\n  select 1\n  %%");
        let config = JsonEmitConfig {
            retain_embed_tags: false,
            ..JsonEmitConfig::default()
        };
        let json = to_json(&value, &config);
        assert_eq!(json["q"], "select 1\n");
    }

    #[test]
    fn pretty_prints_with_configured_indent() {
        let value = root("a: 1\n");
        let config = JsonEmitConfig {
            indent: 4,
            ..JsonEmitConfig::default()
        };
        let out = to_json_string(&value, &config);
        assert!(out.starts_with("{\n    \"a\": 1\n}"));
    }
}
