//! IDE-grade location services built on `kson-nav` (spec.md §4.N):
//! completion, hover info, and jump-to-definition (both document→schema
//! and intra-schema `$ref`).

mod completion;
mod definition;
mod hover;
mod shared;

pub use completion::{get_completions_at_location, CompletionItem, CompletionKind};
pub use definition::{get_schema_location_at_location, resolve_ref_at_location};
pub use hover::get_schema_info_at_location;

/// `buildPathToPosition(doc, coord, include_property_keys)` (spec.md
/// §6): re-exported from `kson-nav` directly — path-at-cursor is the
/// same walk completion and hover already build on.
pub use kson_nav::{build_path_tokens as build_path_to_position, path_to_strings, PathToken};
