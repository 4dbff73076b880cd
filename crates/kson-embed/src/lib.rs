//! The embed-block codec (spec.md §4.F): delimiter sniffing, escape
//! handling, indentation normalization, and the isomorphism between an
//! embed block and its equivalent `{embedTag, embedMetadata,
//! embedContent}` object.

use kson_parser::{
    EmbedData, ListElement, ListForm, ListValue, Location, ObjectEntry, ObjectValue, QuoteStyle,
    StringData, ValueKind, ValueNode,
};

const EMBED_TAG_KEY: &str = "embedTag";
const EMBED_METADATA_KEY: &str = "embedMetadata";
const EMBED_CONTENT_KEY: &str = "embedContent";

/// Decode the raw (still-escaped) text the lexer captured between an
/// embed block's delimiters into literal content.
///
/// Per spec.md §4.F: `c\c…c` (the delimiter char, a backslash, then a
/// repeat of the delimiter) represents a literal delimiter run; `\` not
/// followed by the delimiter char is itself literal.
#[must_use]
pub fn decode_content(raw: &str, delimiter: char) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == delimiter && chars.get(i + 1) == Some(&'\\') && chars.get(i + 2) == Some(&delimiter) {
            out.push(delimiter);
            i += 2;
            while chars.get(i) == Some(&delimiter) {
                out.push(delimiter);
                i += 1;
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}

/// Encode literal content for storage between an embed block's
/// delimiters, escaping any line that would otherwise look like a
/// closing run (`close_run_len` or more repeats of `delimiter` at the
/// start of a line, modulo indent).
#[must_use]
pub fn encode_content(content: &str, delimiter: char, close_run_len: usize) -> String {
    content
        .split_inclusive('\n')
        .map(|line| encode_line(line, delimiter, close_run_len))
        .collect()
}

fn encode_line(line: &str, delimiter: char, close_run_len: usize) -> String {
    let trimmed = line.trim_start_matches([' ', '\t']);
    let indent_len = line.len() - trimmed.len();
    let run_len = trimmed.chars().take_while(|&c| c == delimiter).count();
    let rest: &str = &trimmed[run_len..];
    let line_is_pure_run = run_len >= close_run_len && (rest.is_empty() || rest == "\n");
    if !line_is_pure_run {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + 1);
    out.push_str(&line[..indent_len]);
    out.push(delimiter);
    out.push('\\');
    for _ in 1..run_len {
        out.push(delimiter);
    }
    out.push_str(rest);
    out
}

/// Count how many lines of `content` would need escaping under
/// `delimiter` with the minimal close-run length of 2 (open run length
/// 1), used to pick the delimiter that minimizes escapes.
fn escapes_needed(content: &str, delimiter: char) -> usize {
    content
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start_matches([' ', '\t']);
            trimmed.len() >= 2 && trimmed.chars().all(|c| c == delimiter)
        })
        .count()
}

/// Pick the delimiter character that minimizes escapes for `content`;
/// ties favor `%` (spec.md §4.F).
#[must_use]
pub fn choose_delimiter(content: &str) -> char {
    let percent = escapes_needed(content, '%');
    let dollar = escapes_needed(content, '$');
    if dollar < percent {
        '$'
    } else {
        '%'
    }
}

/// Remove the common leading indent from every non-blank line of
/// `content`, returning the dedented text and the indent width removed.
#[must_use]
pub fn strip_common_indent(content: &str) -> (String, usize) {
    let min_indent = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);
    if min_indent == 0 {
        return (content.to_string(), 0);
    }
    let stripped: String = content
        .split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                let strip = min_indent.min(line.len());
                line[strip..].to_string()
            }
        })
        .collect();
    (stripped, min_indent)
}

/// Reapply `indent` spaces of leading indentation to every non-blank
/// line of `content`, the inverse of [`strip_common_indent`].
#[must_use]
pub fn reapply_indent(content: &str, indent: usize) -> String {
    if indent == 0 {
        return content.to_string();
    }
    let pad = " ".repeat(indent);
    content
        .split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect()
}

/// Decode and dedent an embed block's raw, lexer-captured content into
/// its normalized textual form (spec.md §4.F: escape decoding, then
/// common-indent stripping).
#[must_use]
pub fn normalized_content(data: &EmbedData) -> String {
    let decoded = decode_content(&data.content, data.delimiter);
    strip_common_indent(&decoded).0
}

/// Build the object form `{embedTag, embedMetadata, embedContent}`
/// equivalent to `embed` (spec.md §4.F isomorphism). Every synthesized
/// node reuses `embed`'s own location, since there is no literal source
/// text for the synthesized keys.
#[must_use]
pub fn embed_to_object(embed: &ValueNode) -> ValueNode {
    let ValueKind::Embed(data) = &embed.kind else {
        return embed.clone();
    };
    let loc = embed.location;
    let mut entries = Vec::new();
    if let Some(tag) = &data.tag {
        entries.push(string_entry(EMBED_TAG_KEY, tag, loc));
    }
    if let Some(metadata) = &data.metadata {
        entries.push(string_entry(EMBED_METADATA_KEY, metadata, loc));
    }
    entries.push(string_entry(EMBED_CONTENT_KEY, &normalized_content(data), loc));
    ValueNode::new(loc, ValueKind::Object(ObjectValue { entries }))
}

fn string_entry(key: &str, value: &str, loc: Location) -> ObjectEntry {
    ObjectEntry {
        key: key.to_string(),
        key_location: loc,
        value: ValueNode::new(
            loc,
            ValueKind::String(StringData {
                value: value.to_string(),
                quote: QuoteStyle::Double,
            }),
        ),
        location: loc,
        leading_comments: Vec::new(),
        trailing_comments: Vec::new(),
    }
}

const EMBED_OBJECT_KEYS: [&str; 3] = [EMBED_TAG_KEY, EMBED_METADATA_KEY, EMBED_CONTENT_KEY];

/// If `obj` has only keys from `{embedTag, embedMetadata, embedContent}`
/// and carries `embedContent`, return the equivalent embed block
/// (spec.md §4.F isomorphism), using `%` as the default delimiter since
/// the object form carries none of its own.
#[must_use]
pub fn object_as_embed(obj: &ObjectValue) -> Option<EmbedData> {
    if obj.entries.is_empty()
        || !obj
            .entries
            .iter()
            .all(|e| EMBED_OBJECT_KEYS.contains(&e.key.as_str()))
    {
        return None;
    }
    let content = obj.get(EMBED_CONTENT_KEY)?.as_str()?.to_string();
    let tag = obj.get(EMBED_TAG_KEY).and_then(ValueNode::as_str).map(String::from);
    let metadata = obj
        .get(EMBED_METADATA_KEY)
        .and_then(ValueNode::as_str)
        .map(String::from);
    Some(EmbedData {
        tag,
        metadata,
        content,
        delimiter: '%',
    })
}

/// Whether `list` is a bracketed or dashed list, used by the formatter
/// and emitters to decide layout around embeds inside lists; re-exported
/// here since embed-aware emission needs to recurse into lists that may
/// themselves contain embeds or embed-equivalent objects.
#[must_use]
pub fn list_contains_embeds(list: &ListValue) -> bool {
    list.elements.iter().any(|e: &ListElement| {
        matches!(e.value.kind, ValueKind::Embed(_))
            || matches!(&e.value.kind, ValueKind::Object(o) if object_as_embed(o).is_some())
    })
}

#[must_use]
pub fn is_dashed(list: &ListValue) -> bool {
    matches!(list.form, ListForm::Dashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_parser::{parse, ParseConfig};

    #[test]
    fn decodes_escaped_delimiter_run() {
        assert_eq!(decode_content("%\\%%", '%'), "%%%");
        assert_eq!(decode_content("plain text", '%'), "plain text");
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let content = "%%\nordinary\n";
        let encoded = encode_content(content, '%', 2);
        let decoded = decode_content(&encoded, '%');
        assert_eq!(decoded, content);
    }

    #[test]
    fn choose_delimiter_prefers_fewer_escapes() {
        assert_eq!(choose_delimiter("no delimiters here"), '%');
        assert_eq!(choose_delimiter("%%\n%%\n"), '$');
    }

    #[test]
    fn strip_and_reapply_indent_round_trip() {
        let content = "  select 1\n  select 2\n";
        let (stripped, indent) = strip_common_indent(content);
        assert_eq!(stripped, "select 1\nselect 2\n");
        assert_eq!(reapply_indent(&stripped, indent), content);
    }

    #[test]
    fn embed_isomorphism_matches_scenario_four() {
        let result = parse("embedBlock: %sql\n  select 1\n  %%", &ParseConfig::default());
        let obj = result.document.root.as_object().unwrap();
        let embed_val = obj.get("embedBlock").unwrap();
        let as_object = embed_to_object(embed_val);
        let as_object = as_object.as_object().unwrap();
        assert_eq!(as_object.get("embedTag").unwrap().as_str(), Some("sql"));
        assert_eq!(
            as_object.get("embedContent").unwrap().as_str(),
            Some("select 1\n")
        );

        let other = parse(
            r#"embedBlock: {embedTag: "sql", embedContent: "select 1\n"}"#,
            &ParseConfig::default(),
        );
        let other_obj = other.document.root.as_object().unwrap();
        let roundtrip = object_as_embed(other_obj.get("embedBlock").unwrap().as_object().unwrap())
            .unwrap();
        assert_eq!(roundtrip.tag.as_deref(), Some("sql"));
        assert_eq!(roundtrip.content, "select 1\n");
    }

    #[test]
    fn non_embed_object_returns_none() {
        let result = parse("a: 1\nb: 2", &ParseConfig::default());
        let obj = result.document.root.as_object().unwrap();
        assert!(object_as_embed(obj).is_none());
    }
}
