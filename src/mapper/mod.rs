//! Path mapper: resolves dotted and bracketed paths into component data
//!
//! Paths look like `Todo.Title`, `Items[2].Done` or `Labels["urgent"]`. Bare
//! identifiers are looked up in a per-shape [`TraversalMap`] built once from
//! the shape descriptors, which also promotes the fields of embedded records.
//! Bracket accessors index lists and maps.

mod error;
mod path;
mod traversal;

pub use error::MappingError;
pub use path::{Location, Step};
pub use traversal::TraversalMap;

pub(crate) use path::split_head;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::value::{Schema, Value};

/// Resolves paths against values of the shapes in one [`Schema`]
///
/// Traversal maps are built lazily and cached for the mapper's lifetime.
#[derive(Debug)]
pub struct PathMapper {
    schema: Arc<Schema>,
    cache: Mutex<HashMap<String, Arc<TraversalMap>>>,
}

impl PathMapper {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// The traversal map of `shape`, building and caching it on first use
    pub fn mapping(&self, shape: &str) -> Result<Arc<TraversalMap>, MappingError> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(map) = cache.get(shape) {
            return Ok(Arc::clone(map));
        }
        let map = Arc::new(traversal::build(&self.schema, shape)?);
        cache.insert(shape.to_string(), Arc::clone(&map));
        Ok(map)
    }

    /// Resolve `path` to a [`Location`] inside `root`
    ///
    /// `Ok(None)` means the path does not lead anywhere: unknown field,
    /// out-of-range index, missing key, nil pointer, wrong container kind or
    /// malformed brackets.
    pub fn resolve(&self, root: &Value, path: &str) -> Result<Option<Location>, MappingError> {
        let mut steps = Vec::new();
        Ok(self
            .walk(root, path, &mut steps)?
            .map(|_| Location::new(steps)))
    }

    pub fn get<'v>(&self, root: &'v Value, path: &str) -> Result<Option<&'v Value>, MappingError> {
        self.walk(root, path, &mut Vec::new())
    }

    pub fn get_mut<'v>(
        &self,
        root: &'v mut Value,
        path: &str,
    ) -> Result<Option<&'v mut Value>, MappingError> {
        Ok(match self.resolve(root, path)? {
            Some(location) => location.get_mut(root),
            None => None,
        })
    }

    fn walk<'v>(
        &self,
        value: &'v Value,
        path: &str,
        steps: &mut Vec<Step>,
    ) -> Result<Option<&'v Value>, MappingError> {
        let value = value.indirect();
        if path.is_empty() {
            return Ok(Some(value));
        }

        if let Some(bracketed) = path::split_bracket(path) {
            let Some(parent) = self.walk(value, bracketed.parent, steps)? else {
                return Ok(None);
            };
            let Some(accessor) = bracketed.accessor else {
                return Ok(None);
            };
            let step = accessor.into_step();
            let Some(child) = step.apply(parent.indirect()) else {
                return Ok(None);
            };
            steps.push(step);
            return self.walk(child, bracketed.rest, steps);
        }

        // untyped data: dotted segments are map keys
        if let Value::Map(_) = value {
            let (head, rest) = split_head(path);
            let step = Step::Key(head.to_string());
            let Some(child) = step.apply(value) else {
                return Ok(None);
            };
            steps.push(step);
            return self.walk(child, rest, steps);
        }

        let Value::Record(record) = value else {
            return Ok(None);
        };
        let mapping = self.mapping(record.shape().name())?;
        let Some(index) = mapping.index(path) else {
            return Ok(None);
        };
        let mut current = value;
        for &position in index {
            let Value::Record(record) = current.indirect() else {
                return Ok(None);
            };
            let Some(field) = record.field(position) else {
                return Ok(None);
            };
            steps.push(Step::Field(position));
            current = field;
        }
        Ok(Some(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FieldDef, FieldKind, Shape};
    use pretty_assertions::assert_eq;

    // Grand embeds Child privately; Child is embedded in Node
    fn schema() -> Arc<Schema> {
        let mut schema = Schema::new();
        schema
            .register(
                Shape::new("Grand")
                    .field("G", FieldKind::Str)
                    .field("Ptr", FieldKind::ptr(FieldKind::Int)),
            )
            .unwrap();
        schema
            .register(
                Shape::new("Child")
                    .field("C", FieldKind::Str)
                    .with_field(
                        FieldDef::new("grand", FieldKind::record("Grand"))
                            .private()
                            .embedded(),
                    ),
            )
            .unwrap();
        schema
            .register(
                Shape::new("Node")
                    .field("N", FieldKind::Str)
                    .embed("Child")
                    .with_field(FieldDef::new("priv", FieldKind::Str).private())
                    .field("Direct", FieldKind::record("Grand"))
                    .field("Pointer", FieldKind::ptr(FieldKind::record("Child")))
                    .field("Slice", FieldKind::list(FieldKind::Int))
                    .field("M", FieldKind::map(FieldKind::Str)),
            )
            .unwrap();
        Arc::new(schema)
    }

    fn node(schema: &Schema) -> Value {
        let grand = schema
            .record("Grand", [("G", Value::from("g")), ("Ptr", Value::ptr(7))])
            .unwrap();
        let child = |c: &str| {
            schema
                .record("Child", [("C", Value::from(c)), ("grand", grand.clone())])
                .unwrap()
        };
        let mut m = std::collections::BTreeMap::new();
        m.insert("k".to_string(), Value::from("v"));
        schema
            .record(
                "Node",
                [
                    ("N", Value::from("n")),
                    ("Child", child("c")),
                    ("priv", Value::from("p")),
                    ("Direct", grand.clone()),
                    ("Pointer", Value::ptr(child("pc"))),
                    ("Slice", Value::from(vec![Value::from(1), Value::from(2)])),
                    ("M", Value::Map(m)),
                ],
            )
            .unwrap()
    }

    #[test]
    fn test_promoted_and_direct_paths() {
        let schema = schema();
        let mapper = PathMapper::new(Arc::clone(&schema));
        let data = node(&schema);

        let get = |path: &str| mapper.get(&data, path).expect("Should map").cloned();
        assert_eq!(get("N"), Some(Value::from("n")));
        assert_eq!(get("C"), Some(Value::from("c")));
        assert_eq!(get("Child.C"), Some(Value::from("c")));
        assert_eq!(get("G"), Some(Value::from("g")));
        assert_eq!(get("Child.G"), Some(Value::from("g")));
        assert_eq!(get("Direct.G"), Some(Value::from("g")));
        assert_eq!(get("Pointer.C"), Some(Value::from("pc")));
        assert_eq!(get("Pointer.G"), Some(Value::from("g")));
        assert_eq!(get("Ptr"), Some(Value::ptr(7)));
    }

    #[test]
    fn test_private_fields_unreachable() {
        let schema = schema();
        let mapper = PathMapper::new(Arc::clone(&schema));
        let data = node(&schema);
        assert_eq!(mapper.get(&data, "priv").unwrap(), None);
        assert_eq!(mapper.get(&data, "Missing").unwrap(), None);
    }

    #[test]
    fn test_bracket_accessors() {
        let schema = schema();
        let mapper = PathMapper::new(Arc::clone(&schema));
        let data = node(&schema);
        assert_eq!(mapper.get(&data, "Slice[1]").unwrap(), Some(&Value::Int(2)));
        assert_eq!(mapper.get(&data, "Slice[2]").unwrap(), None);
        assert_eq!(mapper.get(&data, "Slice[x]").unwrap(), None);
        assert_eq!(mapper.get(&data, r#"M["k"]"#).unwrap(), Some(&Value::from("v")));
        assert_eq!(mapper.get(&data, r#"M["missing"]"#).unwrap(), None);
        assert_eq!(mapper.get(&data, "M[0]").unwrap(), None);
    }

    #[test]
    fn test_nil_pointer_is_invalid() {
        let schema = schema();
        let mapper = PathMapper::new(Arc::clone(&schema));
        let data = schema.instantiate("Node").unwrap();
        assert_eq!(mapper.get(&data, "Pointer.C").unwrap(), None);
        assert_eq!(mapper.get(&data, "Pointer").unwrap(), Some(&Value::Ptr(None)));
    }

    #[test]
    fn test_get_mut_writes_through_pointers() {
        let schema = schema();
        let mapper = PathMapper::new(Arc::clone(&schema));
        let mut data = node(&schema);
        *mapper.get_mut(&mut data, "Pointer.C").unwrap().unwrap() = Value::from("changed");
        assert_eq!(mapper.get(&data, "Pointer.C").unwrap(), Some(&Value::from("changed")));
        assert_eq!(mapper.get(&data, "C").unwrap(), Some(&Value::from("c")));
    }

    #[test]
    fn test_mapping_is_cached() {
        let mapper = PathMapper::new(schema());
        let first = mapper.mapping("Node").unwrap();
        let second = mapper.mapping("Node").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.shape(), "Node");
    }

    #[test]
    fn test_bare_identifier_on_list_is_invalid() {
        let mapper = PathMapper::new(schema());
        let data = Value::from(vec![Value::from(1)]);
        assert_eq!(mapper.get(&data, "Len").unwrap(), None);
        assert_eq!(mapper.get(&data, "[0]").unwrap(), Some(&Value::Int(1)));
    }

    #[test]
    fn test_dotted_keys_on_untyped_maps() {
        let mapper = PathMapper::new(schema());
        let mut inner = std::collections::BTreeMap::new();
        inner.insert("Title".to_string(), Value::from("A"));
        let mut outer = std::collections::BTreeMap::new();
        outer.insert("Todo".to_string(), Value::from(inner));
        outer.insert("Tags".to_string(), Value::from(vec![Value::from("x")]));
        let data = Value::from(outer);

        assert_eq!(mapper.get(&data, "Todo.Title").unwrap(), Some(&Value::from("A")));
        assert_eq!(mapper.get(&data, "Tags[0]").unwrap(), Some(&Value::from("x")));
        assert_eq!(mapper.get(&data, "Todo.Missing").unwrap(), None);
        let location = mapper.resolve(&data, "Todo.Title").unwrap().unwrap();
        assert_eq!(
            location.steps(),
            &[Step::Key("Todo".into()), Step::Key("Title".into())]
        );
    }
}
