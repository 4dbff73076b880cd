//! The recursive-descent grammar parser (spec.md §4.D): builds a CST,
//! recovers from errors by synthesizing `Error` nodes and resyncing at
//! the next structural anchor, and enforces the nesting-depth guard.

use kson_diagnostics::{DiagnosticKind, Location, Sink};
use kson_lexer::{Token, TokenKind};

use crate::cst::{CstElement, CstKind, CstNode};

/// Default `max_nesting_level` per spec.md §6.
pub const DEFAULT_MAX_NESTING_LEVEL: u32 = 256;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseConfig {
    pub max_nesting_level: u32,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            max_nesting_level: DEFAULT_MAX_NESTING_LEVEL,
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: u32,
    max_depth: u32,
    bailed_this_branch: bool,
    sink: Sink,
}

enum ObjectTerminator {
    Eof,
    Dot,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], max_depth: u32) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
            bailed_this_branch: false,
            sink: Sink::new(),
        }
    }

    fn tok(&self, idx: usize) -> &Token {
        self.tokens.get(idx).unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn cur(&self) -> &Token {
        self.tok(self.pos)
    }

    fn cur_kind(&self) -> TokenKind {
        self.cur().kind
    }

    fn at_eof(&self) -> bool {
        self.cur_kind() == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let t = self.cur().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    /// Drain comment tokens starting at the current position into `buf`.
    fn drain_comments(&mut self, buf: &mut Vec<CstElement>) {
        while self.cur_kind() == TokenKind::Comment {
            buf.push(CstElement::Token(self.advance()));
        }
    }

    /// Peek past any comment tokens to find the next significant token's
    /// kind, without consuming anything.
    fn peek_significant_kind(&self, skip: usize) -> TokenKind {
        let mut i = self.pos;
        let mut skipped = 0;
        loop {
            if self.tok(i).kind != TokenKind::Comment {
                if skipped == skip {
                    return self.tok(i).kind;
                }
                skipped += 1;
            }
            if i >= self.tokens.len() - 1 {
                return self.tok(i).kind;
            }
            i += 1;
        }
    }

    fn looks_like_object_entry(&self) -> bool {
        matches!(self.peek_significant_kind(0), TokenKind::Ident | TokenKind::String)
            && self.peek_significant_kind(1) == TokenKind::Colon
    }

    fn enter_nesting(&mut self, range: Location) -> bool {
        self.depth += 1;
        if self.depth > self.max_depth {
            self.sink.emit(
                DiagnosticKind::MaxNestingLevelExceeded,
                format!("nesting exceeds max_nesting_level ({})", self.max_depth),
                range,
            );
            self.bailed_this_branch = true;
            false
        } else {
            true
        }
    }

    fn exit_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Consume tokens until a structural anchor (comma, close bracket,
    /// `.`, `=`, or EOF), per spec.md §4.D recovery policy.
    fn resync(&mut self) {
        while !self.at_eof() {
            match self.cur_kind() {
                TokenKind::Comma
                | TokenKind::BraceR
                | TokenKind::BracketR
                | TokenKind::AngleR
                | TokenKind::ObjectEndDot
                | TokenKind::DashListEndEq => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn error_node(&mut self, kind: DiagnosticKind, message: impl Into<String>) -> CstNode {
        let start = self.cur().range.start;
        let mut children = Vec::new();
        if !self.at_eof() {
            children.push(CstElement::Token(self.advance()));
        }
        let end = self.tok(self.pos.saturating_sub(1)).range.end;
        let range = Location::new(start, end);
        self.sink.emit(kind, message, range);
        self.resync();
        CstNode::new(CstKind::Error, range, children)
    }

    fn parse_value(&mut self) -> CstNode {
        if self.bailed_this_branch {
            return self.error_node(DiagnosticKind::ListInvalidElem, "abandoned after nesting overflow");
        }
        match self.cur_kind() {
            TokenKind::BraceL => self.parse_braced_object(),
            TokenKind::BracketL => self.parse_bracket_list(),
            TokenKind::AngleL => self.parse_angle_list(),
            TokenKind::ListDash => self.parse_dash_list(false),
            TokenKind::EmbedOpenDelim => self.parse_embed(),
            TokenKind::String | TokenKind::Ident if self.looks_like_object_entry() => {
                self.parse_brace_free_object(ObjectTerminator::Dot)
            }
            TokenKind::String => self.leaf(CstKind::String),
            TokenKind::Ident => self.leaf(CstKind::Ident),
            TokenKind::Number => self.leaf(CstKind::Number),
            TokenKind::True | TokenKind::False => self.leaf(CstKind::Bool),
            TokenKind::Null => self.leaf(CstKind::Null),
            TokenKind::Colon => self.error_node(DiagnosticKind::ListStrayColon, "unexpected ':'"),
            TokenKind::Comma => self.error_node(DiagnosticKind::EmptyCommas, "empty list/object element"),
            TokenKind::BraceR => self.error_node(DiagnosticKind::ObjectNoOpen, "unexpected '}' with no matching '{'"),
            TokenKind::BracketR => self.error_node(DiagnosticKind::ListNoOpen, "unexpected ']' with no matching '['"),
            TokenKind::AngleR => self.error_node(DiagnosticKind::ListNoOpen, "unexpected '>' with no matching '<'"),
            TokenKind::DashListEndEq => {
                self.sink.emit(
                    DiagnosticKind::IgnoredDashListEndDash,
                    "'=' with no open dash list",
                    self.cur().range,
                );
                self.advance();
                self.parse_value()
            }
            TokenKind::Eof => self.error_node(DiagnosticKind::ListInvalidElem, "expected a value, found end of input"),
            _ => self.error_node(DiagnosticKind::IllegalCharacters, "unexpected token"),
        }
    }

    fn leaf(&mut self, kind: CstKind) -> CstNode {
        let t = self.advance();
        let range = t.range;
        CstNode::new(kind, range, vec![CstElement::Token(t)])
    }

    fn parse_braced_object(&mut self) -> CstNode {
        let open = self.advance();
        if !self.enter_nesting(open.range) {
            self.exit_nesting();
            return CstNode::new(CstKind::Error, open.range, vec![CstElement::Token(open)]);
        }
        let mut children = vec![CstElement::Token(open.clone())];
        self.parse_members_into(&mut children, &ObjectTerminator::Eof, true);
        let end = if self.cur_kind() == TokenKind::BraceR {
            let close = self.advance();
            let end = close.range.end;
            children.push(CstElement::Token(close));
            end
        } else {
            self.sink.emit(
                DiagnosticKind::ObjectNoClose,
                "unclosed '{' object",
                open.range,
            );
            self.cur().range.end
        };
        self.exit_nesting();
        CstNode::new(CstKind::Object, Location::new(open.range.start, end), children)
    }

    fn parse_brace_free_object(&mut self, terminator: ObjectTerminator) -> CstNode {
        let start = self.cur().range.start;
        if !self.enter_nesting(self.cur().range) {
            self.exit_nesting();
            return CstNode::new(CstKind::Error, self.cur().range, vec![]);
        }
        let mut children = Vec::new();
        let dot_consumed = self.parse_members_into(&mut children, &terminator, false);
        let end = self.tok(self.pos.saturating_sub(1)).range.end;
        if matches!(terminator, ObjectTerminator::Dot) && !dot_consumed {
            self.sink.emit(
                DiagnosticKind::ObjectNoClose,
                "unclosed nested object (expected '.')",
                Location::new(start, end),
            );
        }
        self.exit_nesting();
        CstNode::new(CstKind::Object, Location::new(start, end), children)
    }

    /// Parses `key: value` members into `children`, stopping at the
    /// terminator. Returns whether an explicit `.` was consumed.
    fn parse_members_into(
        &mut self,
        children: &mut Vec<CstElement>,
        terminator: &ObjectTerminator,
        braced: bool,
    ) -> bool {
        loop {
            let mut entry_children = Vec::new();
            self.drain_comments(&mut entry_children);
            if braced && self.cur_kind() == TokenKind::BraceR {
                children.append(&mut entry_children);
                return false;
            }
            if matches!(terminator, ObjectTerminator::Dot) && self.cur_kind() == TokenKind::ObjectEndDot {
                children.append(&mut entry_children);
                self.advance();
                return true;
            }
            if self.cur_kind() == TokenKind::Comma {
                self.sink.emit(
                    DiagnosticKind::EmptyCommas,
                    "stray comma between members",
                    self.cur().range,
                );
                self.advance();
                continue;
            }
            if !self.looks_like_object_entry() {
                children.append(&mut entry_children);
                return false;
            }
            let entry_start = self.cur().range.start;
            let key_tok = self.advance();
            entry_children.push(CstElement::Token(key_tok.clone()));
            let colon = self.advance();
            entry_children.push(CstElement::Token(colon));
            let value_node = if matches!(
                self.cur_kind(),
                TokenKind::Comma | TokenKind::BraceR | TokenKind::ObjectEndDot | TokenKind::DashListEndEq | TokenKind::Eof
            ) {
                self.error_node(DiagnosticKind::ObjectKeyNoValue, "expected a value after ':'")
            } else {
                self.parse_value()
            };
            let value_end = value_node.range.end;
            entry_children.push(CstElement::Node(value_node));
            // Trailing same-line comment.
            if self.cur_kind() == TokenKind::Comment && self.cur().range.start.line == value_end.line {
                entry_children.push(CstElement::Token(self.advance()));
            }
            if self.cur_kind() == TokenKind::Comma {
                entry_children.push(CstElement::Token(self.advance()));
            }
            let entry_range = Location::new(entry_start, entry_children_end(&entry_children, value_end));
            children.push(CstElement::Node(CstNode::new(
                CstKind::ObjectEntry,
                entry_range,
                entry_children,
            )));
        }
    }

    fn parse_bracket_list(&mut self) -> CstNode {
        let open = self.advance();
        if !self.enter_nesting(open.range) {
            self.exit_nesting();
            return CstNode::new(CstKind::Error, open.range, vec![CstElement::Token(open)]);
        }
        let mut children = vec![CstElement::Token(open.clone())];
        loop {
            let mut elem_children = Vec::new();
            self.drain_comments(&mut elem_children);
            if self.cur_kind() == TokenKind::BracketR || self.at_eof() {
                children.append(&mut elem_children);
                break;
            }
            if self.cur_kind() == TokenKind::Comma {
                self.sink.emit(
                    DiagnosticKind::EmptyCommas,
                    "empty list element between commas",
                    self.cur().range,
                );
                self.advance();
                continue;
            }
            let value = self.parse_value();
            let value_end = value.range.end;
            elem_children.push(CstElement::Node(value));
            if self.cur_kind() == TokenKind::Comment && self.cur().range.start.line == value_end.line {
                elem_children.push(CstElement::Token(self.advance()));
            }
            if self.cur_kind() == TokenKind::Comma {
                elem_children.push(CstElement::Token(self.advance()));
            }
            let elem_start = elem_children
                .first()
                .map_or(value_end, |c| element_start(c));
            let elem_end = entry_children_end(&elem_children, value_end);
            children.push(CstElement::Node(CstNode::new(
                CstKind::ListElement,
                Location::new(elem_start, elem_end),
                elem_children,
            )));
        }
        let end = if self.cur_kind() == TokenKind::BracketR {
            let close = self.advance();
            let end = close.range.end;
            children.push(CstElement::Token(close));
            end
        } else {
            self.sink
                .emit(DiagnosticKind::ListNoClose, "unclosed '[' list", open.range);
            self.cur().range.end
        };
        self.exit_nesting();
        CstNode::new(CstKind::List, Location::new(open.range.start, end), children)
    }

    fn parse_angle_list(&mut self) -> CstNode {
        let open = self.advance();
        if !self.enter_nesting(open.range) {
            self.exit_nesting();
            return CstNode::new(CstKind::Error, open.range, vec![CstElement::Token(open)]);
        }
        let mut inner = self.parse_dash_list(true);
        let mut children = vec![CstElement::Token(open.clone())];
        children.append(&mut inner.children);
        let end = if self.cur_kind() == TokenKind::AngleR {
            let close = self.advance();
            let end = close.range.end;
            children.push(CstElement::Token(close));
            end
        } else {
            self.sink
                .emit(DiagnosticKind::ListNoClose, "unclosed '<' list", open.range);
            self.cur().range.end
        };
        self.exit_nesting();
        CstNode::new(CstKind::List, Location::new(open.range.start, end), children)
    }

    fn parse_dash_list(&mut self, angled: bool) -> CstNode {
        let start = self.cur().range.start;
        let mut children = Vec::new();
        loop {
            let mut elem_children = Vec::new();
            self.drain_comments(&mut elem_children);
            if self.cur_kind() != TokenKind::ListDash {
                children.append(&mut elem_children);
                break;
            }
            let dash = self.advance();
            elem_children.push(CstElement::Token(dash.clone()));
            if matches!(
                self.cur_kind(),
                TokenKind::Eof
                    | TokenKind::BracketR
                    | TokenKind::AngleR
                    | TokenKind::ObjectEndDot
                    | TokenKind::DashListEndEq
            ) {
                self.sink.emit(
                    DiagnosticKind::DanglingListDash,
                    "'-' with no following value",
                    dash.range,
                );
                children.append(&mut elem_children);
                continue;
            }
            let value = self.parse_value();
            let value_end = value.range.end;
            elem_children.push(CstElement::Node(value));
            if self.cur_kind() == TokenKind::Comment && self.cur().range.start.line == value_end.line {
                elem_children.push(CstElement::Token(self.advance()));
            }
            let elem_end = entry_children_end(&elem_children, value_end);
            children.push(CstElement::Node(CstNode::new(
                CstKind::ListElement,
                Location::new(dash.range.start, elem_end),
                elem_children,
            )));
            if self.cur_kind() == TokenKind::DashListEndEq {
                children.push(CstElement::Token(self.advance()));
                break;
            }
            if angled && self.cur_kind() == TokenKind::AngleR {
                break;
            }
        }
        let end = self
            .tok(self.pos.saturating_sub(1))
            .range
            .end
            .max(start);
        CstNode::new(CstKind::List, Location::new(start, end), children)
    }

    fn parse_embed(&mut self) -> CstNode {
        let open = self.advance();
        let mut children = vec![CstElement::Token(open.clone())];
        if self.cur_kind() == TokenKind::EmbedTag {
            children.push(CstElement::Token(self.advance()));
        }
        if self.cur_kind() == TokenKind::EmbedMetadata {
            children.push(CstElement::Token(self.advance()));
        }
        if self.cur_kind() == TokenKind::EmbedContent {
            children.push(CstElement::Token(self.advance()));
        }
        let end = if self.cur_kind() == TokenKind::EmbedCloseDelim {
            let close = self.advance();
            let end = close.range.end;
            children.push(CstElement::Token(close));
            end
        } else {
            // The lexer already emitted EMBED_BLOCK_NO_CLOSE.
            self.tok(self.pos.saturating_sub(1)).range.end
        };
        CstNode::new(CstKind::Embed, Location::new(open.range.start, end), children)
    }
}

fn element_start(c: &CstElement) -> kson_diagnostics::Position {
    match c {
        CstElement::Token(t) => t.range.start,
        CstElement::Node(n) => n.range.start,
    }
}

fn entry_children_end(children: &[CstElement], fallback: kson_diagnostics::Position) -> kson_diagnostics::Position {
    children
        .last()
        .map(|c| match c {
            CstElement::Token(t) => t.range.end,
            CstElement::Node(n) => n.range.end,
        })
        .unwrap_or(fallback)
}

/// Parse a complete token stream into a `Root` CST node plus diagnostics.
#[must_use]
pub fn parse_tokens(tokens: &[Token], config: &ParseConfig) -> (CstNode, Sink) {
    let mut p = Parser::new(tokens, config.max_nesting_level);
    let start = p.cur().range.start;
    let mut children = Vec::new();
    p.drain_comments(&mut children);
    if p.looks_like_object_entry() {
        children.push(CstElement::Node(p.parse_brace_free_object(ObjectTerminator::Eof)));
    } else if !p.at_eof() {
        children.push(CstElement::Node(p.parse_value()));
    }
    // Anything left before EOF is unexpected trailing content.
    let mut trailing = Vec::new();
    p.drain_comments(&mut trailing);
    if !p.at_eof() {
        let junk_start = p.cur().range.start;
        while !p.at_eof() {
            trailing.push(CstElement::Token(p.advance()));
        }
        let junk_end = p.tok(p.pos.saturating_sub(1)).range.end;
        p.sink.emit(
            DiagnosticKind::EofNotReached,
            "unexpected trailing content after the root value",
            Location::new(junk_start, junk_end),
        );
    }
    children.extend(trailing);
    let end = p.cur().range.end;
    let root = CstNode::new(CstKind::Root, Location::new(start, end), children);
    (root, p.sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_lexer::lex;

    fn parse(src: &str) -> (CstNode, Sink) {
        let (tokens, _) = lex(src);
        parse_tokens(&tokens, &ParseConfig::default())
    }

    #[test]
    fn parses_brace_free_root_object() {
        let (root, sink) = parse("a: 1\nb: 2");
        assert!(sink.is_empty());
        assert_eq!(root.child_nodes()[0].kind, CstKind::Object);
    }

    #[test]
    fn parses_bracket_list() {
        let (root, sink) = parse("key: [1, 2, 3]");
        assert!(sink.is_empty());
        let obj = root.child_nodes()[0];
        assert_eq!(obj.kind, CstKind::Object);
    }

    #[test]
    fn nesting_guard_fires_once() {
        let cfg = ParseConfig { max_nesting_level: 5 };
        let (tokens, _) = lex("[[[[[[1]]]]]]");
        let (_, sink) = parse_tokens(&tokens, &cfg);
        let count = sink
            .iter()
            .filter(|d| d.kind == DiagnosticKind::MaxNestingLevelExceeded)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn dangling_dash_emits_diagnostic() {
        let (_, sink) = parse("- a\n-");
        assert!(sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::DanglingListDash));
    }

    #[test]
    fn unclosed_bracket_emits_diagnostic() {
        let (_, sink) = parse("key: [1, 2");
        assert!(sink.iter().any(|d| d.kind == DiagnosticKind::ListNoClose));
    }

    #[test]
    fn key_with_no_value_emits_object_key_no_value() {
        let (_, sink) = parse("key:");
        assert!(sink.iter().any(|d| d.kind == DiagnosticKind::ObjectKeyNoValue));
    }

    #[test]
    fn stray_closing_bracket_emits_list_no_open() {
        let (_, sink) = parse("key: ]");
        assert!(sink.iter().any(|d| d.kind == DiagnosticKind::ListNoOpen));
    }

    #[test]
    fn stray_closing_brace_emits_object_no_open() {
        let (_, sink) = parse("key: }");
        assert!(sink.iter().any(|d| d.kind == DiagnosticKind::ObjectNoOpen));
    }
}
