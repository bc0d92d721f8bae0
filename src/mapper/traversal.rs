//! Breadth-first construction of per-shape traversal maps

use std::collections::{HashMap, VecDeque};

use tracing::trace;

use super::MappingError;
use crate::value::Schema;

/// Every reachable dotted path of one shape, mapped to its field index chain
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalMap {
    shape: String,
    paths: HashMap<String, Vec<usize>>,
}

impl TraversalMap {
    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn index(&self, path: &str) -> Option<&[usize]> {
        self.paths.get(path).map(Vec::as_slice)
    }

    /// All mapped paths in sorted order
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.paths.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// A record-typed field discovered during the walk
struct FieldInfo {
    shape: String,
    index: Vec<usize>,
    path: String,
    parent: Option<usize>,
}

struct Pending {
    info: usize,
    prefix: String,
}

pub(crate) fn build(schema: &Schema, root: &str) -> Result<TraversalMap, MappingError> {
    let mut paths: HashMap<String, Vec<usize>> = HashMap::new();
    let mut arena = vec![FieldInfo {
        shape: root.to_string(),
        index: Vec::new(),
        path: String::new(),
        parent: None,
    }];
    let mut queue = VecDeque::from([Pending {
        info: 0,
        prefix: String::new(),
    }]);

    while let Some(pending) = queue.pop_front() {
        if let Some(chain) = cycle_chain(&arena, pending.info) {
            return Err(MappingError::cycle(root, &arena[pending.info].path, chain));
        }
        let shape_name = arena[pending.info].shape.clone();
        let base_index = arena[pending.info].index.clone();
        let shape = schema
            .get(&shape_name)
            .ok_or_else(|| MappingError::unknown_shape(root, &shape_name))?;

        for (position, field) in shape.fields().iter().enumerate() {
            if !field.public && !field.embedded {
                continue;
            }
            let path = format!("{}{}", pending.prefix, field.name);
            let mut index = base_index.clone();
            index.push(position);
            // own fields are visited before promoted ones, so they win
            paths.entry(path.clone()).or_insert_with(|| index.clone());

            let Some(child) = field.kind.record_shape() else {
                continue;
            };
            arena.push(FieldInfo {
                shape: child.to_string(),
                index,
                path: path.clone(),
                parent: Some(pending.info),
            });
            let id = arena.len() - 1;
            queue.push_back(Pending {
                info: id,
                prefix: format!("{path}."),
            });
            if field.embedded {
                queue.push_back(Pending {
                    info: id,
                    prefix: pending.prefix.clone(),
                });
            }
        }
    }

    trace!(shape = root, paths = paths.len(), "built traversal map");
    Ok(TraversalMap {
        shape: root.to_string(),
        paths,
    })
}

/// Shape chain from the root to `id` if `id` repeats an ancestor's shape
fn cycle_chain(arena: &[FieldInfo], id: usize) -> Option<Vec<String>> {
    let shape = &arena[id].shape;
    let mut ancestors = Vec::new();
    let mut cursor = arena[id].parent;
    while let Some(parent) = cursor {
        ancestors.push(arena[parent].shape.clone());
        cursor = arena[parent].parent;
    }
    if !ancestors.contains(shape) {
        return None;
    }
    ancestors.reverse();
    ancestors.push(shape.clone());
    Some(ancestors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FieldDef, FieldKind, Shape};

    #[test]
    fn test_private_fields_skipped_unless_embedded() {
        let schema = Schema::new()
            .with_shape(Shape::new("Inner").field("Deep", FieldKind::Int))
            .and_then(|s| {
                s.with_shape(
                    Shape::new("Outer")
                        .with_field(FieldDef::new("hidden", FieldKind::Int).private())
                        .with_field(
                            FieldDef::new("inner", FieldKind::record("Inner"))
                                .private()
                                .embedded(),
                        ),
                )
            })
            .unwrap();
        let map = build(&schema, "Outer").expect("Should build");
        assert_eq!(map.paths(), vec!["Deep", "inner", "inner.Deep"]);
        assert_eq!(map.index("Deep"), Some(&[1, 0][..]));
    }

    #[test]
    fn test_cycle_reports_chain() {
        let schema = Schema::new()
            .with_shape(Shape::new("A").field("B", FieldKind::ptr(FieldKind::record("B"))))
            .and_then(|s| s.with_shape(Shape::new("B").field("A", FieldKind::record("A"))))
            .unwrap();
        let err = build(&schema, "A").unwrap_err();
        assert_eq!(
            err,
            MappingError::cycle("A", "B.A", vec!["A".into(), "B".into(), "A".into()])
        );
    }

    #[test]
    fn test_unknown_shape() {
        let schema = Schema::new()
            .with_shape(Shape::new("A").field("X", FieldKind::record("Ghost")))
            .unwrap();
        assert_eq!(
            build(&schema, "A").unwrap_err(),
            MappingError::unknown_shape("A", "Ghost")
        );
    }
}
