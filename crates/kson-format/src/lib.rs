//! The comment-preserving, idempotent formatter (spec.md §4.G).
mod config;
mod doc;
mod quote;

pub use config::{FormatConfig, IndentKind};

use kson_parser::{parse, ParseConfig};
use wadler_lindig::{force_group_break, print, trim_trailing_whitespace};

/// Format `text`, re-emitting it in canonical layout while preserving
/// every comment (unless `config.preserve_comments` is `false`).
///
/// Malformed input is never rejected: parsing never fails (spec.md §7),
/// so this always returns a formatted string, built from whatever value
/// tree the parser recovered.
#[must_use]
pub fn format(text: &str, config: &FormatConfig) -> String {
    let result = parse(text, &ParseConfig::default());
    let has_leading_comments = config.preserve_comments && !result.document.leading_comments.is_empty();
    let mut built = doc::document_doc(&result.document, config);
    if has_leading_comments {
        built = force_group_break(built);
    }
    let printed = print(&built, &config.print_options());
    let trimmed = trim_trailing_whitespace(&printed);
    if trimmed.ends_with('\n') {
        trimmed
    } else {
        format!("{trimmed}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fmt(src: &str) -> String {
        format(src, &FormatConfig::default())
    }

    #[test]
    fn trailing_comment_migrates_to_leading_position() {
        // spec.md §8 scenario 5.
        assert_eq!(fmt("# a\nkey: val # b\n"), "# a\n# b\nkey: val\n");
    }

    #[test]
    fn formatting_is_idempotent() {
        let src = "# a\nusers:\n  - name: Alice\n    age: 30\n  - name: Bob\nactive: true\n";
        let once = fmt(src);
        let twice = format(&once, &FormatConfig::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn short_lists_collapse_to_bracket_form() {
        assert_eq!(fmt("nums: [1, 2, 3]\n"), "nums: [1, 2, 3]\n");
    }

    #[test]
    fn long_lists_fall_back_to_dash_form() {
        let src = "items: - \"a much too long first string value here\" - \"another long second string value\" - \"a third one that is also long\"\n";
        let out = fmt(src);
        assert!(out.contains("items:\n  - "));
        assert!(!out.contains('['));
    }

    #[test]
    fn nested_dash_list_uses_angle_brackets() {
        let src = "- <\n  - 1\n  - 2\n>\n- <\n  - 3\n  - 4\n>\n";
        let out = fmt(src);
        assert!(out.contains('<'));
        assert!(out.contains('>'));
        let original = parse(src, &ParseConfig::default());
        let reparsed = parse(&out, &ParseConfig::default());
        assert!(kson_parser::values_equal(&reparsed.document.root, &original.document.root));
    }

    #[test]
    fn round_trips_embed_block() {
        let src = "query: %sql\n  select 1\n  %%\n";
        let out = fmt(src);
        let reparsed = parse(&out, &ParseConfig::default());
        let original = parse(src, &ParseConfig::default());
        assert!(kson_parser::values_equal(&reparsed.document.root, &original.document.root));
    }

    #[test]
    fn disabling_comment_preservation_drops_comments() {
        let cfg = FormatConfig {
            preserve_comments: false,
            ..FormatConfig::default()
        };
        let out = format("# a\nkey: val # b\n", &cfg);
        assert_eq!(out, "key: val\n");
    }

    #[test]
    fn identifiers_and_special_strings_quote_correctly() {
        assert_eq!(fmt("a: hello\n"), "a: hello\n");
        assert_eq!(fmt("a: \"true\"\n"), "a: \"true\"\n");
    }
}
