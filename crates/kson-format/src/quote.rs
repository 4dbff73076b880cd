//! Quote-style selection and literal re-escaping, tuned to KSON's
//! reserved-punctuation set (spec.md §4.C) rather than JSON5's.
use kson_parser::NumberValue;

const RESERVED_PUNCT: [char; 11] = [':', ',', '{', '}', '[', ']', '<', '>', '"', '\'', '#'];

/// Whether `s` can be written as a bare (unquoted) identifier: no
/// whitespace, none of KSON's reserved punctuation, not a literal
/// keyword, and not itself shaped like a number (which would round-trip
/// back as the wrong type).
#[must_use]
pub fn is_plain_identifier(s: &str) -> bool {
    if s.is_empty() || matches!(s, "true" | "false" | "null") {
        return false;
    }
    if s.chars().any(|c| c.is_whitespace() || RESERVED_PUNCT.contains(&c) || c == '.' || c == '=') {
        return false;
    }
    let first = s.chars().next().expect("non-empty");
    if first == '-' || first.is_ascii_digit() {
        return false;
    }
    true
}

/// Pick `'` or `"` for `value`, minimizing how many escapes the chosen
/// quote needs; ties favor `"` (spec.md §4.C default quote is double).
#[must_use]
pub fn choose_quote(value: &str) -> char {
    let singles = value.chars().filter(|&c| c == '\'').count();
    let doubles = value.chars().filter(|&c| c == '"').count();
    if singles < doubles {
        '\''
    } else {
        '"'
    }
}

/// Escape `value` for storage between `quote` characters.
#[must_use]
pub fn escape_string(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == quote {
            out.push('\\');
            out.push(ch);
        } else {
            match ch {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                '\u{08}' => out.push_str("\\b"),
                '\u{0C}' => out.push_str("\\f"),
                c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
        }
    }
    out
}

/// Re-emit `value` in its canonical textual form: bare if it qualifies
/// as a plain identifier, otherwise quoted with whichever quote
/// character needs fewer escapes.
#[must_use]
pub fn format_string_value(value: &str) -> String {
    if is_plain_identifier(value) {
        return value.to_string();
    }
    let quote = choose_quote(value);
    format!("{quote}{}{quote}", escape_string(value, quote))
}

/// Re-emit a number lexeme in canonical form: exponent markers
/// lowercased, redundant leading zeros in the integer part stripped.
#[must_use]
pub fn format_number(value: &NumberValue) -> String {
    match value {
        NumberValue::Integer(i) => i.to_string(),
        NumberValue::Decimal(_, lexeme) => normalize_decimal_lexeme(lexeme),
    }
}

fn normalize_decimal_lexeme(lexeme: &str) -> String {
    let lower = lexeme.to_lowercase();
    let (sign, rest) = if let Some(r) = lower.strip_prefix('-') {
        ("-", r)
    } else if let Some(r) = lower.strip_prefix('+') {
        ("", r)
    } else {
        ("", lower.as_str())
    };
    let split_idx = rest.find(['.', 'e']).unwrap_or(rest.len());
    let (int_part, tail) = rest.split_at(split_idx);
    let trimmed = int_part.trim_start_matches('0');
    let int_part = if trimmed.is_empty() { "0" } else { trimmed };
    format!("{sign}{int_part}{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_words_are_unquoted() {
        assert_eq!(format_string_value("hello"), "hello");
        assert_eq!(format_string_value("snake_case"), "snake_case");
    }

    #[test]
    fn strings_needing_escapes_pick_fewer_escapes_quote() {
        assert_eq!(format_string_value("it's"), "\"it's\"");
        assert_eq!(format_string_value("she said \"hi\""), "'she said \"hi\"'");
    }

    #[test]
    fn keywords_and_number_like_values_are_quoted() {
        assert_eq!(format_string_value("true"), "\"true\"");
        assert_eq!(format_string_value("42"), "\"42\"");
    }

    #[test]
    fn normalizes_exponent_case_and_leading_zeros() {
        assert_eq!(normalize_decimal_lexeme("1.5E10"), "1.5e10");
        assert_eq!(normalize_decimal_lexeme("007.5"), "7.5");
    }
}
