//! `getValidSchemas` (spec.md §4.M): filters a list of candidate
//! sub-schemas (typically a combinator's branches) down to the ones the
//! document actually satisfies at a given path, ignoring "missing
//! required property" failures so completion can still offer properties
//! on a not-yet-finished object.

use kson_diagnostics::Sink;
use kson_parser::{parse, ParseConfig};
use kson_resolve::IdIndex;
use kson_schema::SchemaRef;

use crate::path::{navigate_by_tokens, PathToken};

/// `getValidSchemas(candidates, document, path)` (spec.md §4.M):
/// re-parses `document_text`, navigates to `path`, and validates that
/// node against each candidate (dropping "missing required property"
/// diagnostics per `kson_validate::MISSING_REQUIRED_MARKER`). On
/// navigation failure — the spec's "document parse failure" — every
/// candidate is returned unfiltered: a failure here must never make
/// completion/hover/jump-to-definition *more* restrictive than not
/// calling this filter at all.
#[must_use]
#[tracing::instrument(skip(candidates, resolver))]
pub fn get_valid_schemas(
    candidates: &[SchemaRef],
    document_text: &str,
    path: &[PathToken],
    resolver: &IdIndex,
    base_uri: &str,
) -> Vec<SchemaRef> {
    let reparsed = parse(document_text, &ParseConfig::default());
    let Some(node) = navigate_by_tokens(&reparsed.document.root, path) else {
        return candidates.to_vec();
    };

    candidates
        .iter()
        .filter(|candidate| {
            let mut sink = Sink::new();
            kson_validate::validate(node, candidate, resolver, base_uri, &mut sink);
            sink.iter()
                .all(|d| d.message.contains(kson_validate::MISSING_REQUIRED_MARKER))
        })
        .cloned()
        .collect()
}
