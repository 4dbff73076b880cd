//! The KSON lexer (spec.md §4.B) and number classifier (§4.C).
//!
//! `lex` never fails: malformed input becomes an `Error` token carrying
//! the offending slice, and scanning continues from the next plausible
//! token boundary, the same recovery posture the grammar parser built on
//! top of this crate uses for syntactic errors.

use kson_diagnostics::{Diagnostic, DiagnosticKind, Location, Position, Sink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ident,
    String,
    Number,
    True,
    False,
    Null,
    Colon,
    Comma,
    BraceL,
    BraceR,
    BracketL,
    BracketR,
    AngleL,
    AngleR,
    ListDash,
    ObjectEndDot,
    DashListEndEq,
    EmbedOpenDelim,
    EmbedTag,
    EmbedMetadata,
    EmbedContent,
    EmbedCloseDelim,
    Comment,
    NewlineTrivia,
    Eof,
    /// Not in spec.md's token-kind list verbatim, but required by its own
    /// contract ("errors become tokens of kind `ERROR`").
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub range: Location,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, text: impl Into<String>, range: Location) -> Self {
        Self {
            kind,
            text: text.into(),
            range,
        }
    }
}

/// The classified numeric value of a `NUMBER` token lexeme (§4.C).
#[derive(Debug, Clone, PartialEq)]
pub enum NumberValue {
    Integer(i64),
    Decimal(f64, String),
}

/// Classify a number lexeme already recognized by the lexer.
///
/// A lexeme with no fractional/exponent part parses as `Integer`; a
/// lexeme with a fractional part whose digits are all zero also
/// satisfies integer constraints per spec.md §4.C ("`1.0` is acceptable
/// where `integer` is required") and is still returned as `Decimal` here
/// — callers that need the "satisfies integer constraints" predicate use
/// [`NumberValue::is_integral`].
#[must_use]
pub fn classify_number(lexeme: &str) -> NumberValue {
    let has_fraction_or_exp = lexeme.contains('.') || lexeme.contains('e') || lexeme.contains('E');
    if !has_fraction_or_exp {
        if let Ok(i) = lexeme.parse::<i64>() {
            return NumberValue::Integer(i);
        }
    }
    let value = lexeme.parse::<f64>().unwrap_or(f64::NAN);
    NumberValue::Decimal(value, lexeme.to_string())
}

impl NumberValue {
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(i) => *i as f64,
            Self::Decimal(d, _) => *d,
        }
    }

    #[must_use]
    pub fn is_integral(&self) -> bool {
        match self {
            Self::Integer(_) => true,
            Self::Decimal(d, _) => d.fract() == 0.0 && d.is_finite(),
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    chars: Vec<(usize, char)>,
    idx: usize,
    line: u32,
    col: u32,
    tokens: Vec<Token>,
    sink: Sink,
}

fn is_reserved_punct(c: char) -> bool {
    matches!(
        c,
        ':' | ',' | '{' | '}' | '[' | ']' | '<' | '>' | '.' | '=' | '"' | '\'' | '#'
    )
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        let chars: Vec<(usize, char)> = src.char_indices().collect();
        Self {
            src,
            bytes: src.as_bytes(),
            chars,
            idx: 0,
            line: 0,
            col: 0,
            tokens: Vec::new(),
            sink: Sink::new(),
        }
    }

    fn pos(&self) -> Position {
        let offset = self.chars.get(self.idx).map_or(self.bytes.len(), |(o, _)| *o);
        Position::new(self.line, self.col, offset as u32)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).map(|&(_, c)| c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.idx + ahead).map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn slice_from(&self, start_idx: usize) -> &'a str {
        let start_off = self.chars.get(start_idx).map_or(self.bytes.len(), |(o, _)| *o);
        let end_off = self.chars.get(self.idx).map_or(self.bytes.len(), |(o, _)| *o);
        &self.src[start_off..end_off]
    }

    fn run(mut self) -> (Vec<Token>, Sink) {
        if self.src.trim().is_empty() {
            self.sink.emit(
                DiagnosticKind::BlankSource,
                "source text is blank",
                Location::point(Position::start()),
            );
        }
        loop {
            self.skip_whitespace();
            let start_idx = self.idx;
            let start = self.pos();
            let Some(c) = self.peek() else {
                let end = self.pos();
                self.tokens
                    .push(Token::new(TokenKind::Eof, "", Location::new(end, end)));
                break;
            };
            match c {
                '#' => self.lex_comment(start),
                '{' => self.single(TokenKind::BraceL, start),
                '}' => self.single(TokenKind::BraceR, start),
                '[' => self.single(TokenKind::BracketL, start),
                ']' => self.single(TokenKind::BracketR, start),
                '<' => self.single(TokenKind::AngleL, start),
                '>' => self.single(TokenKind::AngleR, start),
                ':' => self.single(TokenKind::Colon, start),
                ',' => self.single(TokenKind::Comma, start),
                '.' => self.single(TokenKind::ObjectEndDot, start),
                '=' => self.single(TokenKind::DashListEndEq, start),
                '\'' | '"' => self.lex_string(c, start),
                '%' | '$' if self.at_delimiter_run(c) => self.lex_embed(c, start),
                '-' if self.peek_at(1).is_none_or(char::is_whitespace) => {
                    self.single(TokenKind::ListDash, start);
                }
                _ if c.is_ascii_digit() || (c == '-' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) => {
                    self.lex_number(start_idx, start);
                }
                _ if !c.is_whitespace() => self.lex_ident(start_idx, start),
                _ => {
                    self.bump();
                }
            }
        }
        (self.tokens, self.sink)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn single(&mut self, kind: TokenKind, start: Position) {
        let c = self.bump().expect("caller checked peek");
        let end = self.pos();
        self.tokens
            .push(Token::new(kind, c.to_string(), Location::new(start, end)));
    }

    fn lex_comment(&mut self, start: Position) {
        let start_idx = self.idx;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        let text = self.slice_from(start_idx).to_string();
        let end = self.pos();
        self.tokens
            .push(Token::new(TokenKind::Comment, text, Location::new(start, end)));
    }

    fn lex_ident(&mut self, start_idx: usize, start: Position) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() || is_reserved_punct(c) {
                break;
            }
            self.bump();
        }
        let text = self.slice_from(start_idx);
        let kind = match text {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => TokenKind::Ident,
        };
        let end = self.pos();
        self.tokens
            .push(Token::new(kind, text.to_string(), Location::new(start, end)));
    }

    fn lex_number(&mut self, start_idx: usize, start: Position) {
        if self.peek() == Some('-') {
            self.bump();
        }
        let mut saw_digit = false;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            saw_digit = true;
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let exp_start = self.idx;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            let mut exp_digits = false;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
                exp_digits = true;
            }
            if !exp_digits {
                let end = self.pos();
                self.sink.emit(
                    DiagnosticKind::DanglingExpIndicator,
                    "exponent indicator with no digits",
                    Location::new(
                        Position::new(self.line, self.col, exp_start as u32),
                        end,
                    ),
                );
            }
        }
        let text = self.slice_from(start_idx);
        if !saw_digit {
            let end = self.pos();
            self.sink.emit(
                DiagnosticKind::IllegalMinusSign,
                "minus sign not followed by digits",
                Location::new(start, end),
            );
            self.tokens
                .push(Token::new(TokenKind::Error, text.to_string(), Location::new(start, end)));
            return;
        }
        let end = self.pos();
        self.tokens
            .push(Token::new(TokenKind::Number, text.to_string(), Location::new(start, end)));
    }

    fn lex_string(&mut self, quote: char, start: Position) {
        self.bump();
        let mut value = String::new();
        let mut closed = false;
        loop {
            match self.peek() {
                None => break,
                Some(c) if c == quote => {
                    self.bump();
                    closed = true;
                    break;
                }
                Some('\\') => {
                    let esc_start = self.pos();
                    self.bump();
                    match self.peek() {
                        Some('n') => {
                            value.push('\n');
                            self.bump();
                        }
                        Some('r') => {
                            value.push('\r');
                            self.bump();
                        }
                        Some('t') => {
                            value.push('\t');
                            self.bump();
                        }
                        Some('b') => {
                            value.push('\u{8}');
                            self.bump();
                        }
                        Some('f') => {
                            value.push('\u{c}');
                            self.bump();
                        }
                        Some('\\') => {
                            value.push('\\');
                            self.bump();
                        }
                        Some('\'') => {
                            value.push('\'');
                            self.bump();
                        }
                        Some('"') => {
                            value.push('"');
                            self.bump();
                        }
                        Some('/') => {
                            value.push('/');
                            self.bump();
                        }
                        Some('u') => {
                            self.bump();
                            let mut hex = String::new();
                            for _ in 0..4 {
                                if let Some(h) = self.peek().filter(char::is_ascii_hexdigit) {
                                    hex.push(h);
                                    self.bump();
                                } else {
                                    break;
                                }
                            }
                            let end = self.pos();
                            if hex.len() == 4 {
                                if let Some(ch) = u32::from_str_radix(&hex, 16)
                                    .ok()
                                    .and_then(char::from_u32)
                                {
                                    value.push(ch);
                                } else {
                                    self.sink.emit(
                                        DiagnosticKind::StringBadUnicodeEscape,
                                        format!("invalid unicode escape \\u{hex}"),
                                        Location::new(esc_start, end),
                                    );
                                }
                            } else {
                                self.sink.emit(
                                    DiagnosticKind::StringBadUnicodeEscape,
                                    "incomplete unicode escape",
                                    Location::new(esc_start, end),
                                );
                            }
                        }
                        other => {
                            let end = self.pos();
                            self.sink.emit(
                                DiagnosticKind::StringBadEscape,
                                format!("unknown escape {:?}", other.unwrap_or('\0')),
                                Location::new(esc_start, end),
                            );
                            if other.is_some() {
                                self.bump();
                            }
                        }
                    }
                }
                Some(c) if (c as u32) < 0x20 && c != '\n' => {
                    let cstart = self.pos();
                    self.bump();
                    let end = self.pos();
                    self.sink.emit(
                        DiagnosticKind::StringControlCharacter,
                        "unescaped control character in string",
                        Location::new(cstart, end),
                    );
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
        let end = self.pos();
        let range = Location::new(start, end);
        if !closed {
            self.sink
                .emit(DiagnosticKind::StringNoClose, "unterminated string", range);
        }
        self.tokens.push(Token::new(TokenKind::String, value, range));
    }

    /// Whether the current position starts a run of `c` long enough to be
    /// taken as an embed-open delimiter rather than, e.g., a lone `%`
    /// identifier character. Per spec.md §4.F any run length `N >= 1` at
    /// token position opens a block, so this only distinguishes the
    /// delimiter characters from ordinary identifier text.
    fn at_delimiter_run(&self, c: char) -> bool {
        self.peek() == Some(c)
    }

    fn lex_embed(&mut self, delim: char, start: Position) {
        let open_start_idx = self.idx;
        let mut run_len = 0usize;
        while self.peek() == Some(delim) {
            self.bump();
            run_len += 1;
        }
        let open_text = self.slice_from(open_start_idx).to_string();
        let open_end = self.pos();
        self.tokens.push(Token::new(
            TokenKind::EmbedOpenDelim,
            open_text,
            Location::new(start, open_end),
        ));

        // Optional tag and `: metadata` on the same line.
        while self.peek().is_some_and(|c| c == ' ' || c == '\t') {
            self.bump();
        }
        if let Some(c) = self.peek() {
            if c != '\n' {
                let tag_start_idx = self.idx;
                let tag_start = self.pos();
                while let Some(c) = self.peek() {
                    if c == '\n' || c == ':' {
                        break;
                    }
                    self.bump();
                }
                let tag_text = self.slice_from(tag_start_idx).trim_end().to_string();
                let tag_end = self.pos();
                if !tag_text.is_empty() {
                    self.tokens.push(Token::new(
                        TokenKind::EmbedTag,
                        tag_text,
                        Location::new(tag_start, tag_end),
                    ));
                }
                if self.peek() == Some(':') {
                    self.bump();
                    let meta_start_idx = self.idx;
                    let meta_start = self.pos();
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                    let meta_text = self.slice_from(meta_start_idx).trim().to_string();
                    let meta_end = self.pos();
                    self.tokens.push(Token::new(
                        TokenKind::EmbedMetadata,
                        meta_text,
                        Location::new(meta_start, meta_end),
                    ));
                }
            }
        }
        if self.peek() == Some('\n') {
            self.bump();
        }

        let close_run = delim.to_string().repeat(run_len + 1);
        let content_start_idx = self.idx;
        let content_start = self.pos();
        let mut closed = false;
        let mut close_start_idx = self.idx;
        loop {
            if self.at_line_start_with(&close_run) {
                // Content stops before the close line's own indentation,
                // not before the delimiter run itself.
                close_start_idx = self.line_start_idx(self.idx);
                closed = true;
                break;
            }
            if self.bump().is_none() {
                break;
            }
        }
        let content_text = self.src[self
            .chars
            .get(content_start_idx)
            .map_or(self.bytes.len(), |(o, _)| *o)
            ..self.chars.get(close_start_idx).map_or(self.bytes.len(), |(o, _)| *o)]
            .to_string();
        let content_end = self.pos();
        self.tokens.push(Token::new(
            TokenKind::EmbedContent,
            content_text,
            Location::new(content_start, content_end),
        ));

        if closed {
            let close_start = self.pos();
            for _ in 0..=run_len {
                self.bump();
            }
            let close_end = self.pos();
            self.tokens.push(Token::new(
                TokenKind::EmbedCloseDelim,
                close_run,
                Location::new(close_start, close_end),
            ));
        } else {
            self.sink.emit(
                DiagnosticKind::EmbedBlockNoClose,
                "embed block was never closed",
                Location::new(start, content_end),
            );
        }
    }

    /// Whether, starting at the current position, the source (allowing
    /// leading indentation on the line) matches `needle` exactly.
    fn at_line_start_with(&self, needle: &str) -> bool {
        let at_bol = self.col == 0 || self.preceding_is_only_indent();
        if !at_bol {
            return false;
        }
        let needle_chars: Vec<char> = needle.chars().collect();
        for (i, nc) in needle_chars.iter().enumerate() {
            if self.peek_at(i) != Some(*nc) {
                return false;
            }
        }
        true
    }

    fn preceding_is_only_indent(&self) -> bool {
        let mut j = self.idx;
        while j > 0 {
            j -= 1;
            let (_, c) = self.chars[j];
            if c == '\n' {
                return true;
            }
            if c != ' ' && c != '\t' {
                return false;
            }
        }
        true
    }

    /// The char index at which the line containing `idx` begins, i.e.
    /// just past the previous newline (or 0), skipping any indentation
    /// that precedes `idx` on that line.
    fn line_start_idx(&self, idx: usize) -> usize {
        let mut j = idx;
        while j > 0 {
            let (_, c) = self.chars[j - 1];
            if c == '\n' {
                break;
            }
            if c != ' ' && c != '\t' {
                return idx;
            }
            j -= 1;
        }
        j
    }
}

/// Produce the token stream for `text`, terminated by `EOF`, plus any
/// lexical diagnostics. Never panics on malformed input.
#[must_use]
pub fn lex(text: &str) -> (Vec<Token>, Sink) {
    Lexer::new(text).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        lex(text).0.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_braces_and_colon() {
        assert_eq!(
            kinds("{a: 1}"),
            vec![
                TokenKind::BraceL,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::BraceR,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_dash_list_marker() {
        let (tokens, _) = lex("- a\n- b");
        assert_eq!(tokens[0].kind, TokenKind::ListDash);
    }

    #[test]
    fn classifies_integer_and_decimal() {
        assert_eq!(classify_number("42"), NumberValue::Integer(42));
        match classify_number("1.0") {
            NumberValue::Decimal(v, lexeme) => {
                assert_eq!(v, 1.0);
                assert_eq!(lexeme, "1.0");
            }
            NumberValue::Integer(_) => panic!("expected decimal"),
        }
        assert!(classify_number("1.0").is_integral());
        assert!(!classify_number("1.5").is_integral());
    }

    #[test]
    fn dangling_exponent_emits_diagnostic() {
        let (_, sink) = lex("1e");
        assert!(sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::DanglingExpIndicator));
    }

    #[test]
    fn unterminated_string_emits_diagnostic() {
        let (tokens, sink) = lex("\"abc");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert!(sink.iter().any(|d| d.kind == DiagnosticKind::StringNoClose));
    }

    #[test]
    fn string_escapes_decode() {
        let (tokens, sink) = lex(r#""a\nbA""#);
        assert_eq!(tokens[0].text, "a\nbA");
        assert!(sink.is_empty());
    }

    #[test]
    fn embed_block_round_trips_tag_and_content() {
        let (tokens, sink) = lex("%sql\n  select 1\n%%");
        assert!(sink.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::EmbedOpenDelim);
        assert_eq!(tokens[1].kind, TokenKind::EmbedTag);
        assert_eq!(tokens[1].text, "sql");
        assert_eq!(tokens[2].kind, TokenKind::EmbedContent);
        assert_eq!(tokens[2].text, "  select 1\n");
        assert_eq!(tokens[3].kind, TokenKind::EmbedCloseDelim);
    }

    #[test]
    fn unclosed_embed_block_emits_diagnostic() {
        let (_, sink) = lex("%tag\ncontent without close");
        assert!(sink
            .iter()
            .any(|d| d.kind == DiagnosticKind::EmbedBlockNoClose));
    }

    #[test]
    fn blank_source_emits_diagnostic() {
        let (_, sink) = lex("   \n  \n");
        assert!(sink.iter().any(|d| d.kind == DiagnosticKind::BlankSource));
    }
}
