//! Ref resolver and ID index (spec.md §4.K): URI base tracking,
//! JSON-Pointer navigation into the raw value tree, `$ref` chasing, and
//! document-shaped schema navigation over the built schema tree.

mod docpath;
mod index;
mod json_value;
pub mod uri;

pub use docpath::{navigate_by_document_path, DocumentPathToken};
pub use index::{IdIndex, ResolvedRef};
pub use json_value::from_json;
