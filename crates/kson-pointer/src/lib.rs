//! JSON-Pointer-plus tokenizing and glob matching (spec.md §4.L).
//!
//! A pointer is a `/`-separated sequence of tokens. Each token is decoded
//! per RFC 6901 (`~1` -> `/`, `~0` -> `~`) and then classified: the single
//! character `*` is a wildcard that matches any property name or array
//! index; a token containing an unescaped `*` or `?` is a glob pattern
//! (`\*`, `\?`, `\\` escape the literal character); anything else is a
//! plain literal token.

use regex::Regex;

/// One token of a parsed JSON-Pointer-plus path.
#[derive(Debug, Clone)]
pub enum PointerToken {
    Literal(String),
    /// The bare `*` token: matches any property name or array index.
    Wildcard,
    /// A token containing `*`/`?` glob metacharacters, pre-compiled to an
    /// anchored regex.
    Glob { raw: String, regex: Regex },
}

impl PartialEq for PointerToken {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Wildcard, Self::Wildcard) => true,
            (Self::Glob { raw: a, .. }, Self::Glob { raw: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl PointerToken {
    /// Whether this token matches a concrete property name / array-index
    /// string `name`.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            PointerToken::Literal(s) => s == name,
            PointerToken::Wildcard => true,
            PointerToken::Glob { regex, .. } => regex.is_match(name),
        }
    }
}

/// Decode a single RFC 6901 pointer segment: `~1` -> `/` must be applied
/// before `~0` -> `~` so that a literal `~01` in the source decodes to
/// `~1`, not `/` (RFC 6901 §4).
#[must_use]
pub fn decode_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Encode a literal property name as an RFC 6901 pointer segment: `~` ->
/// `~0` must be applied before `/` -> `~1`.
#[must_use]
pub fn encode_segment(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}

/// Whether `raw` (a single decoded pointer segment) contains an unescaped
/// glob metacharacter.
fn is_glob(raw: &str) -> bool {
    let chars: Vec<char> = raw.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            '*' | '?' => return true,
            _ => i += 1,
        }
    }
    false
}

/// Convert a `*`/`?` glob segment into an anchored regex source: literal
/// runs are escaped, `*` becomes `.*`, `?` becomes `.`, and `\*`, `\?`,
/// `\\` escape the literal character (spec.md §4.L).
#[must_use]
pub fn glob_to_regex_source(pattern: &str) -> String {
    let mut out = String::from("^");
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() && matches!(chars[i + 1], '*' | '?' | '\\') => {
                out.push_str(&regex::escape(&chars[i + 1].to_string()));
                i += 2;
            }
            '*' => {
                out.push_str(".*");
                i += 1;
            }
            '?' => {
                out.push('.');
                i += 1;
            }
            c => {
                out.push_str(&regex::escape(&c.to_string()));
                i += 1;
            }
        }
    }
    out.push('$');
    out
}

/// Parse a token (already RFC-6901-decoded) into a [`PointerToken`].
#[must_use]
pub fn classify_token(decoded: &str) -> PointerToken {
    if decoded == "*" {
        return PointerToken::Wildcard;
    }
    if is_glob(decoded) {
        let source = glob_to_regex_source(decoded);
        // An invalid regex can't arise from `glob_to_regex_source`'s own
        // escaping, but `Regex::new` is still fallible in principle;
        // fall back to a never-matching pattern rather than panic.
        let regex = Regex::new(&source).unwrap_or_else(|_| Regex::new("$^").expect("trivial regex"));
        return PointerToken::Glob {
            raw: decoded.to_string(),
            regex,
        };
    }
    PointerToken::Literal(decoded.to_string())
}

/// Split a JSON-Pointer-plus string into tokens, decoding each segment
/// and classifying it. A pointer of `""` or `"/"` yields no tokens (the
/// root); a leading `/` is required for any non-empty pointer, matching
/// RFC 6901.
#[must_use]
pub fn parse_pointer(pointer: &str) -> Vec<PointerToken> {
    let trimmed = pointer.strip_prefix('/').unwrap_or(pointer);
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed
        .split('/')
        .map(|seg| classify_token(&decode_segment(seg)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tilde_escapes_in_order() {
        assert_eq!(decode_segment("a~1b"), "a/b");
        assert_eq!(decode_segment("a~0b"), "a~b");
        assert_eq!(decode_segment("a~01b"), "a~1b");
    }

    #[test]
    fn encode_round_trips_decode() {
        let name = "a/b~c";
        let encoded = encode_segment(name);
        assert_eq!(decode_segment(&encoded), name);
    }

    #[test]
    fn empty_and_root_pointer_yield_no_tokens() {
        assert!(parse_pointer("").is_empty());
        assert!(parse_pointer("/").is_empty());
    }

    #[test]
    fn plain_segments_are_literal() {
        let tokens = parse_pointer("/properties/name");
        assert_eq!(
            tokens,
            vec![
                PointerToken::Literal("properties".into()),
                PointerToken::Literal("name".into()),
            ]
        );
    }

    #[test]
    fn bare_star_is_wildcard() {
        let tokens = parse_pointer("/items/*");
        assert!(matches!(tokens[1], PointerToken::Wildcard));
        assert!(tokens[1].matches("anything"));
    }

    #[test]
    fn glob_pattern_matches_prefix() {
        let tokens = parse_pointer("/user*");
        assert!(tokens[0].matches("userName"));
        assert!(!tokens[0].matches("name"));
    }

    #[test]
    fn escaped_glob_chars_are_literal() {
        let tokens = parse_pointer(r"/what\?");
        assert!(tokens[0].matches("what?"));
        assert!(!tokens[0].matches("whatever"));
    }

    #[test]
    fn glob_question_mark_matches_single_char() {
        let tokens = parse_pointer("/a?c");
        assert!(tokens[0].matches("abc"));
        assert!(!tokens[0].matches("ac"));
        assert!(!tokens[0].matches("abbc"));
    }
}
