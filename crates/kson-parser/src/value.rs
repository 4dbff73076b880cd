//! The typed value tree (spec.md §3): the trivia-preserving, lossy
//! representation that every downstream pass (formatter, emitters,
//! schema builder, navigation) actually consumes.

use std::collections::HashMap;

use kson_diagnostics::Location;
use kson_lexer::NumberValue;

/// Which quote character (if any) a string-like value was written with.
/// `Unquoted` covers bare identifiers used as string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    Single,
    Double,
    Unquoted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringData {
    pub value: String,
    pub quote: QuoteStyle,
}

/// `{tag, metadata, content, delimiter}` per spec.md §4.F.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedData {
    pub tag: Option<String>,
    pub metadata: Option<String>,
    pub content: String,
    pub delimiter: char,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectEntry {
    pub key: String,
    pub key_location: Location,
    pub value: ValueNode,
    pub location: Location,
    pub leading_comments: Vec<String>,
    pub trailing_comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    pub entries: Vec<ObjectEntry>,
}

impl ObjectValue {
    /// Map from key to the index of its *first* occurrence. Spec.md §3:
    /// "keys are not deduplicated at parse time; callers that require
    /// unique keys consult the optional `property_lookup`."
    #[must_use]
    pub fn property_lookup(&self) -> HashMap<&str, usize> {
        let mut map = HashMap::new();
        for (i, entry) in self.entries.iter().enumerate() {
            map.entry(entry.key.as_str()).or_insert(i);
        }
        map
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ValueNode> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }
}

/// Which bracketing form a list was written in; carried so the formatter
/// can prefer idempotent re-emission in the original form where valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListForm {
    Bracketed,
    Angled,
    Dashed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListElement {
    pub value: ValueNode,
    pub leading_comments: Vec<String>,
    pub trailing_comments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListValue {
    pub form: ListForm,
    pub elements: Vec<ListElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Object(ObjectValue),
    List(ListValue),
    String(StringData),
    Number(NumberValue),
    Bool(bool),
    Null,
    Embed(EmbedData),
    /// A synthesized placeholder for a subtree abandoned after a
    /// diagnostic (spec.md §7): the CST retains an `ERROR` node, and the
    /// value tree mirrors it so downstream passes don't panic.
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    pub location: Location,
    pub kind: ValueKind,
}

impl ValueNode {
    #[must_use]
    pub fn new(location: Location, kind: ValueKind) -> Self {
        Self { location, kind }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match &self.kind {
            ValueKind::Object(o) => Some(o),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&ListValue> {
        match &self.kind {
            ValueKind::List(l) => Some(l),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(&s.value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<&NumberValue> {
        match &self.kind {
            ValueKind::Number(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match &self.kind {
            ValueKind::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }
}

/// The parsed document: its root value plus any comments with no
/// following value (spec.md §4.E: "Document-end comments ... attach to
/// the root as trailing trivia").
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub leading_comments: Vec<String>,
    pub root: ValueNode,
    pub trailing_comments: Vec<String>,
}

/// Whether `a` and `b` are equal as JSON-Schema `enum`/`const` values:
/// integers and decimals compare by their `f64` projection (spec.md
/// §4.J), everything else structurally.
#[must_use]
pub fn values_equal(a: &ValueNode, b: &ValueNode) -> bool {
    match (&a.kind, &b.kind) {
        (ValueKind::Null, ValueKind::Null) => true,
        (ValueKind::Bool(x), ValueKind::Bool(y)) => x == y,
        (ValueKind::Number(x), ValueKind::Number(y)) => x.as_f64() == y.as_f64(),
        (ValueKind::String(x), ValueKind::String(y)) => x.value == y.value,
        (ValueKind::Embed(x), ValueKind::Embed(y)) => {
            x.tag == y.tag && x.metadata == y.metadata && x.content == y.content
        }
        (ValueKind::List(x), ValueKind::List(y)) => {
            x.elements.len() == y.elements.len()
                && x.elements
                    .iter()
                    .zip(&y.elements)
                    .all(|(e1, e2)| values_equal(&e1.value, &e2.value))
        }
        (ValueKind::Object(x), ValueKind::Object(y)) => {
            if x.entries.len() != y.entries.len() {
                return false;
            }
            let ylookup = y.property_lookup();
            x.property_lookup().iter().all(|(k, &i)| {
                ylookup
                    .get(k)
                    .is_some_and(|&j| values_equal(&x.entries[i].value, &y.entries[j].value))
            })
        }
        _ => false,
    }
}
