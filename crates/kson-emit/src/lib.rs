//! `toJson`/`toYaml` (spec.md §6): serialize a lowered KSON value tree
//! to JSON or YAML text.
mod json;
mod yaml;

pub use json::{to_json, to_json_string, JsonEmitConfig};
pub use yaml::{to_yaml, YamlEmitConfig};
