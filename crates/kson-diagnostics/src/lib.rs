//! Source ranges and the diagnostics sink shared by every KSON pass.
//!
//! Diagnostics are data, never exceptions: a phase appends to a [`Sink`]
//! and keeps going. Combinator validation additionally uses [`TempSink`],
//! a throwaway collector that the caller decides whether to keep.

use std::fmt;

/// A 0-based line/column coordinate, paired with its absolute byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub col: u32,
    pub offset: u32,
}

impl Position {
    pub const fn new(line: u32, col: u32, offset: u32) -> Self {
        Self { line, col, offset }
    }

    pub const fn start() -> Self {
        Self::new(0, 0, 0)
    }
}

/// A half-open source range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A zero-width location at `pos`.
    pub const fn point(pos: Position) -> Self {
        Self::new(pos, pos)
    }

    /// Whether `pos` falls inside this range, per the open question
    /// decision recorded in SPEC_FULL.md §13: a coordinate exactly on the
    /// boundary belongs to the range that *starts* there, so the lower
    /// bound is inclusive and the upper bound exclusive.
    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        self.start.offset <= pos.offset && pos.offset < self.end.offset
    }

    /// Whether `pos` falls inside this range, treating a zero-width range
    /// as containing the point at its boundary (needed for cursor-at-EOF
    /// and empty-node cases).
    #[must_use]
    pub fn contains_inclusive(&self, pos: Position) -> bool {
        self.start.offset <= pos.offset && pos.offset <= self.end.offset
    }

    #[must_use]
    pub fn overlaps(&self, other: &Location) -> bool {
        self.start.offset < other.end.offset && other.start.offset < self.end.offset
    }

    #[must_use]
    pub fn len(&self) -> u32 {
        self.end.offset.saturating_sub(self.start.offset)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The full taxonomy of diagnostic kinds from spec.md §4.D/§7, plus
/// schema-build and validation kinds from §4.I/§4.J.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DiagnosticKind {
    // Lexical
    IllegalCharacters,
    IllegalMinusSign,
    StringNoClose,
    StringBadEscape,
    StringBadUnicodeEscape,
    StringControlCharacter,
    DanglingExpIndicator,
    EmbedBlockNoClose,
    // Syntactic
    BlankSource,
    EofNotReached,
    EmptyCommas,
    DanglingListDash,
    ListNoOpen,
    ListNoClose,
    ListInvalidElem,
    ListStrayColon,
    ObjectNoOpen,
    ObjectNoClose,
    ObjectKeyNoValue,
    IgnoredDashListEndDash,
    // Resource-bound
    MaxNestingLevelExceeded,
    // Schema build
    InvalidSchema,
    // Validation
    SchemaValidationError,
}

impl DiagnosticKind {
    /// The stable identifier used for test assertions and IDE filtering.
    #[must_use]
    pub fn stable_id(self) -> &'static str {
        match self {
            Self::IllegalCharacters => "ILLEGAL_CHARACTERS",
            Self::IllegalMinusSign => "ILLEGAL_MINUS_SIGN",
            Self::StringNoClose => "STRING_NO_CLOSE",
            Self::StringBadEscape => "STRING_BAD_ESCAPE",
            Self::StringBadUnicodeEscape => "STRING_BAD_UNICODE_ESCAPE",
            Self::StringControlCharacter => "STRING_CONTROL_CHARACTER",
            Self::DanglingExpIndicator => "DANGLING_EXP_INDICATOR",
            Self::EmbedBlockNoClose => "EMBED_BLOCK_NO_CLOSE",
            Self::BlankSource => "BLANK_SOURCE",
            Self::EofNotReached => "EOF_NOT_REACHED",
            Self::EmptyCommas => "EMPTY_COMMAS",
            Self::DanglingListDash => "DANGLING_LIST_DASH",
            Self::ListNoOpen => "LIST_NO_OPEN",
            Self::ListNoClose => "LIST_NO_CLOSE",
            Self::ListInvalidElem => "LIST_INVALID_ELEM",
            Self::ListStrayColon => "LIST_STRAY_COLON",
            Self::ObjectNoOpen => "OBJECT_NO_OPEN",
            Self::ObjectNoClose => "OBJECT_NO_CLOSE",
            Self::ObjectKeyNoValue => "OBJECT_KEY_NO_VALUE",
            Self::IgnoredDashListEndDash => "IGNORED_DASH_LIST_END_DASH",
            Self::MaxNestingLevelExceeded => "MAX_NESTING_LEVEL_EXCEEDED",
            Self::InvalidSchema => "InvalidSchema",
            Self::SchemaValidationError => "SCHEMA_VALIDATION_ERROR",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stable_id())
    }
}

/// A single structured diagnostic: `{kind, message, range}` per spec.md §6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub range: Location,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, range: Location) -> Self {
        Self {
            kind,
            message: message.into(),
            range,
        }
    }
}

/// An append-only diagnostics collector threaded through the lexer,
/// parser, and validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sink {
    diagnostics: Vec<Diagnostic>,
}

impl Sink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn emit(&mut self, kind: DiagnosticKind, message: impl Into<String>, range: Location) {
        self.push(Diagnostic::new(kind, message, range));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Append every diagnostic from `other` into `self`.
    pub fn extend_from(&mut self, other: Sink) {
        self.diagnostics.extend(other.diagnostics);
    }
}

impl IntoIterator for Sink {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

/// A throwaway collector for combinator validation (spec.md §9): each
/// branch of `anyOf`/`oneOf`/`if-then-else` validates into its own
/// `TempSink`, which the combinator then either discards, merges into
/// the real sink, or summarizes into a single diagnostic.
#[derive(Debug, Clone, Default)]
pub struct TempSink {
    sink: Sink,
}

impl TempSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, kind: DiagnosticKind, message: impl Into<String>, range: Location) {
        self.sink.emit(kind, message, range);
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.sink.is_empty()
    }

    /// Consume the temporary sink, appending every diagnostic into `dest`.
    pub fn merge_into(self, dest: &mut Sink) {
        dest.extend_from(self.sink);
    }

    /// Consume the temporary sink, discarding its diagnostics.
    pub fn discard(self) {}

    #[must_use]
    pub fn into_sink(self) -> Sink {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(offset: u32) -> Position {
        Position::new(0, offset, offset)
    }

    #[test]
    fn location_contains_is_half_open_on_the_end() {
        let loc = Location::new(pos(2), pos(5));
        assert!(!loc.contains(pos(1)));
        assert!(loc.contains(pos(2)));
        assert!(loc.contains(pos(4)));
        assert!(!loc.contains(pos(5)));
    }

    #[test]
    fn location_overlaps_detects_shared_range() {
        let a = Location::new(pos(0), pos(3));
        let b = Location::new(pos(2), pos(4));
        let c = Location::new(pos(3), pos(5));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn sink_accumulates_and_reports_stable_ids() {
        let mut sink = Sink::new();
        sink.emit(
            DiagnosticKind::StringNoClose,
            "unterminated string",
            Location::point(pos(0)),
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.iter().next().unwrap().kind.stable_id(), "STRING_NO_CLOSE");
    }

    #[test]
    fn temp_sink_discard_does_not_affect_real_sink() {
        let mut real = Sink::new();
        let mut temp = TempSink::new();
        temp.emit(
            DiagnosticKind::SchemaValidationError,
            "nope",
            Location::point(pos(0)),
        );
        assert!(!temp.succeeded());
        temp.discard();
        assert!(real.is_empty());
        real.emit(
            DiagnosticKind::SchemaValidationError,
            "kept",
            Location::point(pos(0)),
        );
        assert_eq!(real.len(), 1);
    }

    #[test]
    fn temp_sink_merge_appends_into_real_sink() {
        let mut real = Sink::new();
        let mut temp = TempSink::new();
        temp.emit(
            DiagnosticKind::SchemaValidationError,
            "merged",
            Location::point(pos(0)),
        );
        temp.merge_into(&mut real);
        assert_eq!(real.len(), 1);
    }
}
