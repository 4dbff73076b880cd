//! The concrete syntax tree (spec.md §4.D): every token the grammar
//! parser consumed, including comments, grouped into typed nodes so the
//! source structure (and every comment) can be walked before lowering.

use kson_diagnostics::Location;
use kson_lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CstKind {
    Root,
    Object,
    ObjectEntry,
    List,
    ListElement,
    Embed,
    String,
    Number,
    Bool,
    Null,
    Ident,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CstElement {
    Token(Token),
    Node(CstNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CstNode {
    pub kind: CstKind,
    pub range: Location,
    pub children: Vec<CstElement>,
}

impl CstNode {
    #[must_use]
    pub fn new(kind: CstKind, range: Location, children: Vec<CstElement>) -> Self {
        Self {
            kind,
            range,
            children,
        }
    }

    /// Every comment token directly owned by this node (not its
    /// descendants), in source order.
    pub fn own_comments(&self) -> impl Iterator<Item = &Token> {
        self.children.iter().filter_map(|c| match c {
            CstElement::Token(t) if t.kind == kson_lexer::TokenKind::Comment => Some(t),
            _ => None,
        })
    }

    #[must_use]
    pub fn child_nodes(&self) -> Vec<&CstNode> {
        self.children
            .iter()
            .filter_map(|c| match c {
                CstElement::Node(n) => Some(n),
                CstElement::Token(_) => None,
            })
            .collect()
    }
}
