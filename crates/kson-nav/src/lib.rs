//! Value-tree navigation and coordinate lookup (spec.md §4.M):
//! `walkTree`, `navigateByTokens`, `findAtCoordinate`, `buildPathTokens`,
//! `getValidSchemas`. `kson-location` builds the IDE-facing services
//! (completion, hover, jump-to-definition) on top of this layer.

mod coordinate;
mod path;
mod valid_schemas;

pub use coordinate::{build_path_tokens, find_at_coordinate, walk_tree, CoordinateHit};
pub use path::{navigate_by_tokens, path_to_strings, to_document_path_tokens, PathToken};
pub use valid_schemas::get_valid_schemas;
