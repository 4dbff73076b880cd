//! Grammar-aware parsing (spec.md §4.D) and CST-to-value-tree lowering
//! (§4.E) for KSON source text.

mod cst;
mod lower;
mod parser;
mod value;

pub use cst::{CstElement, CstKind, CstNode};
pub use kson_diagnostics::{Diagnostic, DiagnosticKind, Location, Position, Sink};
pub use kson_lexer::NumberValue;
pub use lower::{location_inside, lower_document};
pub use parser::{parse_tokens, ParseConfig, DEFAULT_MAX_NESTING_LEVEL};
pub use value::{
    values_equal, Document, EmbedData, ListElement, ListForm, ListValue, ObjectEntry,
    ObjectValue, QuoteStyle, StringData, ValueKind, ValueNode,
};

/// The result of [`parse`]: the CST, the lowered document, and whatever
/// diagnostics either stage produced (spec.md §6: `ParseResult{ast,
/// value, diagnostics}`).
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub ast: CstNode,
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse `text` into a CST and a lowered value tree. Never panics on
/// malformed input: problems are reported as diagnostics (spec.md §7).
#[must_use]
pub fn parse(text: &str, config: &ParseConfig) -> ParseResult {
    let (tokens, mut sink) = kson_lexer::lex(text);
    let (ast, parse_sink) = parse_tokens(&tokens, config);
    sink.extend_from(parse_sink);
    let document = lower_document(&ast, text);
    ParseResult {
        ast,
        document,
        diagnostics: sink.into_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_simple_document() {
        let result = parse("name: Alice", &ParseConfig::default());
        assert!(result.diagnostics.is_empty());
        let obj = result.document.root.as_object().unwrap();
        assert_eq!(obj.get("name").unwrap().as_str(), Some("Alice"));
    }
}
