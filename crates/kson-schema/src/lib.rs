//! The JSON-Schema-draft-07 schema model and parser (spec.md §4.I).
//!
//! A schema value tree (as produced by [`kson_parser::parse`]) is built
//! into a [`SchemaNode`] tree by [`build_schema`]. `$ref` keywords are
//! kept unresolved here — resolving them against an ID index and
//! document base URI is `kson-resolve`'s job, not this crate's.

mod build;
mod meta;
mod tree;

pub use build::{build_schema, value_to_json};
pub use meta::{DRAFT07_META_SCHEMA, DRAFT07_META_SCHEMA_URI};
pub use tree::{
    AdditionalPolicy, ArraySchema, DependencyKind, NumberConstraints, ObjectSchema, PrimitiveType,
    SchemaKind, SchemaMeta, SchemaNode, SchemaRef, StringConstraints,
};
