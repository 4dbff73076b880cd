//! The public facade (spec.md §6): every conceptual entry point the
//! core exposes, composed from the single-purpose crates that implement
//! them. This crate owns no algorithms of its own — it threads inputs
//! between `kson-parser`, `kson-format`, `kson-emit`, `kson-schema`,
//! `kson-resolve`, `kson-validate`, and `kson-location`.

use std::rc::Rc;

pub use kson_diagnostics::{Diagnostic, DiagnosticKind, Location, Position};
pub use kson_format::{FormatConfig, IndentKind};
pub use kson_parser::{Document, ParseResult, ValueNode};

pub use kson_emit::{JsonEmitConfig, YamlEmitConfig};
pub use kson_location::{
    get_completions_at_location as completions_at_location, get_schema_info_at_location as schema_info_at_location,
    get_schema_location_at_location as schema_location_at_location, resolve_ref_at_location, CompletionItem,
    CompletionKind, PathToken,
};
pub use kson_schema::SchemaRef;

/// `parse(text, config)` (spec.md §6).
#[must_use]
pub fn parse(text: &str, config: &kson_parser::ParseConfig) -> ParseResult {
    kson_parser::parse(text, config)
}

/// `format(text, config)` (spec.md §6).
#[must_use]
pub fn format(text: &str, config: &FormatConfig) -> String {
    kson_format::format(text, config)
}

/// `toJson(text, config)` (spec.md §6).
#[must_use]
pub fn to_json(text: &str, config: &JsonEmitConfig) -> String {
    let document = kson_parser::parse(text, &kson_parser::ParseConfig::default()).document;
    kson_emit::to_json_string(&document.root, config)
}

/// `toYaml(text, config)` (spec.md §6).
#[must_use]
pub fn to_yaml(text: &str, config: &YamlEmitConfig) -> String {
    let document = kson_parser::parse(text, &kson_parser::ParseConfig::default()).document;
    kson_emit::to_yaml(&document.root, config)
}

/// A parsed JSON-Schema document: the built schema tree, its `$id`
/// index, the base URI it resolves relative references against, and any
/// diagnostics from the build pass (spec.md §4.I/§7 "Schema build"). The
/// raw value tree is retained too — `resolveRefAtLocation` needs to walk
/// the schema's *own* source positions, not just its built tree.
pub struct Schema {
    root: Rc<ValueNode>,
    node: SchemaRef,
    index: kson_resolve::IdIndex,
    base_uri: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// `parseSchema(text)` (spec.md §6): interpreted under the empty base
/// URI, i.e. "the document's own base" (spec.md §3 invariant).
#[must_use]
pub fn parse_schema(text: &str) -> Schema {
    parse_schema_with_base(text, "")
}

/// `parseSchema` under an explicit base URI, for hosts that know the
/// schema document's own identity (e.g. loaded from a known file path or
/// URL) ahead of time.
#[must_use]
pub fn parse_schema_with_base(text: &str, base_uri: &str) -> Schema {
    let root = Rc::new(kson_parser::parse(text, &kson_parser::ParseConfig::default()).document.root);
    let (node, diagnostics) = kson_schema::build_schema(&root);
    let index = kson_resolve::IdIndex::build(Rc::clone(&root), base_uri);
    Schema {
        root,
        node,
        index,
        base_uri: base_uri.to_string(),
        diagnostics,
    }
}

impl Schema {
    #[must_use]
    pub fn root_node(&self) -> &SchemaRef {
        &self.node
    }
}

/// `validate(value, schema)` (spec.md §6).
#[must_use]
pub fn validate(value: &ValueNode, schema: &Schema) -> Vec<Diagnostic> {
    let mut sink = kson_diagnostics::Sink::new();
    kson_validate::validate(value, &schema.node, &schema.index, &schema.base_uri, &mut sink);
    sink.into_vec()
}

/// A 0-based `(line, column)` coordinate (spec.md §6), converted to a
/// [`Position`] against a specific source text. `col` counts Unicode
/// scalar values within the line, matching the lexer's own column
/// accounting.
#[must_use]
pub fn position_at(text: &str, line: u32, col: u32) -> Position {
    let mut cur_line = 0u32;
    let mut cur_col = 0u32;
    for (byte_offset, ch) in text.char_indices() {
        if cur_line == line && cur_col == col {
            return Position::new(line, col, byte_offset as u32);
        }
        if ch == '\n' {
            cur_line += 1;
            cur_col = 0;
        } else {
            cur_col += 1;
        }
    }
    Position::new(cur_line, cur_col, text.len() as u32)
}

/// `getCompletionsAtLocation(doc, schema, line, col)` (spec.md §6).
#[must_use]
pub fn get_completions_at_location(document_text: &str, schema: &Schema, line: u32, col: u32) -> Vec<CompletionItem> {
    let document_root = kson_parser::parse(document_text, &kson_parser::ParseConfig::default()).document.root;
    let pos = position_at(document_text, line, col);
    completions_at_location(
        &document_root,
        document_text,
        &schema.node,
        &schema.index,
        &schema.base_uri,
        pos,
    )
}

/// `getSchemaInfoAtLocation(doc, schema, line, col)` (spec.md §6).
#[must_use]
pub fn get_schema_info_at_location(document_text: &str, schema: &Schema, line: u32, col: u32) -> Option<String> {
    let document_root = kson_parser::parse(document_text, &kson_parser::ParseConfig::default()).document.root;
    let pos = position_at(document_text, line, col);
    schema_info_at_location(
        &document_root,
        document_text,
        &schema.node,
        &schema.index,
        &schema.base_uri,
        pos,
    )
}

/// `getSchemaLocationAtLocation(doc, schema, line, col)` (spec.md §6).
#[must_use]
pub fn get_schema_location_at_location(document_text: &str, schema: &Schema, line: u32, col: u32) -> Vec<Location> {
    let document_root = kson_parser::parse(document_text, &kson_parser::ParseConfig::default()).document.root;
    let pos = position_at(document_text, line, col);
    schema_location_at_location(
        &document_root,
        document_text,
        &schema.node,
        &schema.index,
        &schema.base_uri,
        pos,
    )
}

/// `resolveRefAtLocation(schema, line, col)` (spec.md §6): the cursor
/// coordinate is interpreted against the schema's *own* source text.
#[must_use]
pub fn resolve_ref_at(schema_text: &str, schema: &Schema, line: u32, col: u32) -> Vec<Location> {
    let pos = position_at(schema_text, line, col);
    resolve_ref_at_location(&schema.root, &schema.index, &schema.base_uri, pos)
}

/// `buildPathToPosition(doc, coord, include_property_keys)` (spec.md §6).
#[must_use]
pub fn build_path_to_position(
    document_text: &str,
    line: u32,
    col: u32,
    include_property_keys: bool,
) -> Option<Vec<PathToken>> {
    let document_root = kson_parser::parse(document_text, &kson_parser::ParseConfig::default()).document.root;
    let pos = position_at(document_text, line, col);
    kson_location::build_path_to_position(&document_root, pos, include_property_keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_brace_free_object_with_unquoted_keys() {
        let result = parse("name: Alice\nage: 30\n", &kson_parser::ParseConfig::default());
        assert!(result.diagnostics.is_empty());
        let obj = result.document.root.as_object().unwrap();
        assert_eq!(obj.get("name").unwrap().as_str(), Some("Alice"));
    }

    #[test]
    fn formats_and_emits_json() {
        let src = "name: Alice\nage: 30\n";
        let formatted = format(src, &FormatConfig::default());
        assert_eq!(formatted, src);
        let json = to_json(src, &JsonEmitConfig::default());
        assert!(json.contains("\"name\": \"Alice\""));
    }

    #[test]
    fn validates_a_document_against_a_schema() {
        let schema = parse_schema("properties: {age: {type: integer, minimum: 0}}\nrequired: [age]");
        assert!(schema.diagnostics.is_empty());
        let value = parse("age: -1\n", &kson_parser::ParseConfig::default()).document.root;
        let diagnostics = validate(&value, &schema);
        assert_eq!(diagnostics.len(), 1);
    }

    /// spec.md §8 end-to-end scenario 1.
    #[test]
    fn builds_path_to_position_for_nested_array_scenario() {
        let src = "users:\n  - name: Alice\n    age: 30\n  - name: Bob\n";
        let line = src.lines().position(|l| l.contains("Alice")).unwrap() as u32;
        let col = src.lines().nth(line as usize).unwrap().find("Alice").unwrap() as u32;
        let path = build_path_to_position(src, line, col, false).expect("path found");
        assert_eq!(path_to_strings_for_test(&path), vec!["users", "0", "name"]);
    }

    fn path_to_strings_for_test(path: &[PathToken]) -> Vec<String> {
        kson_location::path_to_strings(path)
    }

    #[test]
    fn position_at_converts_line_col_to_byte_offset() {
        let text = "a: 1\nb: 2\n";
        let pos = position_at(text, 1, 3);
        assert_eq!(&text[pos.offset as usize..pos.offset as usize + 1], "2");
    }
}
