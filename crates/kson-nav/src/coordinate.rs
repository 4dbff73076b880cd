//! `walkTree` and `findAtCoordinate` (spec.md §4.M).

use kson_diagnostics::Position;
use kson_parser::ValueNode;

use crate::path::PathToken;

/// Depth-first pre-order walk, visiting `(node, parent, depth)` for every
/// node reachable from `root` (including `root` itself, at depth 0 with
/// no parent).
pub fn walk_tree<'a, F>(root: &'a ValueNode, visit: &mut F)
where
    F: FnMut(&'a ValueNode, Option<&'a ValueNode>, usize),
{
    walk_inner(root, None, 0, visit);
}

fn walk_inner<'a, F>(node: &'a ValueNode, parent: Option<&'a ValueNode>, depth: usize, visit: &mut F)
where
    F: FnMut(&'a ValueNode, Option<&'a ValueNode>, usize),
{
    visit(node, parent, depth);
    if let Some(obj) = node.as_object() {
        for entry in &obj.entries {
            walk_inner(&entry.value, Some(node), depth + 1, visit);
        }
    } else if let Some(list) = node.as_list() {
        for element in &list.elements {
            walk_inner(&element.value, Some(node), depth + 1, visit);
        }
    }
}

/// The result of [`find_at_coordinate`]: the most specific node whose
/// range contains the coordinate, the path tokens leading to it from the
/// root, and whether the coordinate landed on a property *key* rather
/// than its value.
#[derive(Debug, Clone)]
pub struct CoordinateHit<'a> {
    pub node: &'a ValueNode,
    pub path: Vec<PathToken>,
    pub on_key: bool,
}

/// `findAtCoordinate(root, line, col)` (spec.md §4.M): the most specific
/// node whose range contains `pos`, with the path from root. Ties are
/// impossible in well-formed trees (spec.md §3 invariant: sibling ranges
/// never overlap), so "smallest range" tie-breaking falls out of simply
/// descending into whichever child contains the point, deepest first.
#[must_use]
pub fn find_at_coordinate(root: &ValueNode, pos: Position) -> Option<CoordinateHit<'_>> {
    if !root.location.contains_inclusive(pos) {
        return None;
    }
    Some(descend(root, pos, Vec::new()))
}

fn descend(node: &ValueNode, pos: Position, path: Vec<PathToken>) -> CoordinateHit<'_> {
    if let Some(obj) = node.as_object() {
        for entry in &obj.entries {
            if entry.key_location.contains(pos) {
                let mut key_path = path.clone();
                key_path.push(PathToken::Property(entry.key.clone()));
                return CoordinateHit {
                    node: &entry.value,
                    path: key_path,
                    on_key: true,
                };
            }
            if entry.value.location.contains(pos) {
                let mut child_path = path;
                child_path.push(PathToken::Property(entry.key.clone()));
                return descend(&entry.value, pos, child_path);
            }
        }
    } else if let Some(list) = node.as_list() {
        for (i, element) in list.elements.iter().enumerate() {
            if element.value.location.contains(pos) {
                let mut child_path = path;
                child_path.push(PathToken::Index(i));
                return descend(&element.value, pos, child_path);
            }
        }
    }
    CoordinateHit {
        node,
        path,
        on_key: false,
    }
}

/// `buildPathTokens(root, coord, include_property_keys)` (spec.md
/// §4.M): the path tokens from root to the node at `coord`. When the
/// coordinate lands on a property key and `include_property_keys` is
/// `false` (completion mode: the caller wants the *parent's* schema),
/// the trailing key token is dropped; when `true` (definition mode) it
/// is kept.
#[must_use]
pub fn build_path_tokens(root: &ValueNode, pos: Position, include_property_keys: bool) -> Option<Vec<PathToken>> {
    let hit = find_at_coordinate(root, pos)?;
    let mut path = hit.path;
    if hit.on_key && !include_property_keys {
        path.pop();
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kson_parser::{parse, ParseConfig};

    fn doc(src: &str) -> ValueNode {
        parse(src, &ParseConfig::default()).document.root
    }

    fn pos_at(src: &str, needle: &str) -> Position {
        let offset = src.find(needle).expect("needle present") as u32;
        let line = src[..offset as usize].matches('\n').count() as u32;
        let col = offset - src[..offset as usize].rfind('\n').map_or(0, |i| i as u32 + 1);
        Position::new(line, col, offset)
    }

    #[test]
    fn finds_nested_array_value_per_end_to_end_scenario() {
        let src = "users:\n  - name: Alice\n    age: 30\n  - name: Bob\n";
        let root = doc(src);
        let pos = pos_at(src, "Alice");
        let hit = find_at_coordinate(&root, pos).expect("coordinate inside document");
        assert_eq!(hit.node.as_str(), Some("Alice"));
        assert_eq!(
            crate::path::path_to_strings(&hit.path),
            vec!["users", "0", "name"]
        );
        assert!(!hit.on_key);
    }

    #[test]
    fn on_key_flag_set_when_cursor_sits_on_property_name() {
        let src = "name: Alice\n";
        let root = doc(src);
        let pos = pos_at(src, "name");
        let hit = find_at_coordinate(&root, pos).expect("coordinate inside document");
        assert!(hit.on_key);
    }

    #[test]
    fn completion_mode_drops_trailing_key_token() {
        let src = "name: Alice\n";
        let root = doc(src);
        let pos = pos_at(src, "name");
        let path = build_path_tokens(&root, pos, false).expect("path found");
        assert!(path.is_empty());
    }

    #[test]
    fn definition_mode_keeps_trailing_key_token() {
        let src = "name: Alice\n";
        let root = doc(src);
        let pos = pos_at(src, "name");
        let path = build_path_tokens(&root, pos, true).expect("path found");
        assert_eq!(crate::path::path_to_strings(&path), vec!["name"]);
    }

    #[test]
    fn walk_tree_visits_every_node_with_correct_depth() {
        let root = doc("a: [1, 2]\n");
        let mut depths = Vec::new();
        walk_tree(&root, &mut |_node, _parent, depth| depths.push(depth));
        // root, list, 1, 2
        assert_eq!(depths, vec![0, 1, 2, 2]);
    }
}
