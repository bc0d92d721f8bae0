//! Shape descriptors and the schema registry

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use super::{Record, Value};

/// Errors raised while declaring shapes or building records
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("unknown shape: {name}")]
    UnknownShape { name: String },

    #[error("duplicate shape registration: {name}")]
    DuplicateShape { name: String },

    #[error("shape {shape} has no field named {field}")]
    UnknownField { shape: String, field: String },

    #[error("field {shape}.{field} expects {expected}, found {found}")]
    KindMismatch {
        shape: String,
        field: String,
        expected: String,
        found: &'static str,
    },

    #[error("shape {shape} has {expected} fields, {found} values given")]
    Arity {
        shape: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid field type: {spec}")]
    InvalidKind { spec: String },
}

impl SchemaError {
    pub fn unknown_shape(name: impl Into<String>) -> Self {
        Self::UnknownShape { name: name.into() }
    }
}

/// Declared type of a record field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Any,
    Bool,
    Int,
    Float,
    Str,
    List(Box<FieldKind>),
    Map(Box<FieldKind>),
    Ptr(Box<FieldKind>),
    /// A record of the named shape
    Record(String),
}

impl FieldKind {
    pub fn list(item: FieldKind) -> Self {
        FieldKind::List(Box::new(item))
    }

    pub fn map(item: FieldKind) -> Self {
        FieldKind::Map(Box::new(item))
    }

    pub fn ptr(target: FieldKind) -> Self {
        FieldKind::Ptr(Box::new(target))
    }

    pub fn record(shape: impl Into<String>) -> Self {
        FieldKind::Record(shape.into())
    }

    /// The record shape reached through any number of pointers
    pub fn record_shape(&self) -> Option<&str> {
        match self {
            FieldKind::Record(name) => Some(name),
            FieldKind::Ptr(inner) => inner.record_shape(),
            _ => None,
        }
    }

    /// The kind behind any number of pointers
    pub fn pointee(&self) -> &FieldKind {
        match self {
            FieldKind::Ptr(inner) => inner.pointee(),
            other => other,
        }
    }

    /// Whether `value` conforms to this kind
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldKind::Any, _) => true,
            (FieldKind::Bool, Value::Bool(_))
            | (FieldKind::Int, Value::Int(_))
            | (FieldKind::Float, Value::Float(_))
            | (FieldKind::Str, Value::Str(_)) => true,
            (FieldKind::List(item), Value::List(items)) => items.iter().all(|v| item.admits(v)),
            (FieldKind::Map(item), Value::Map(entries)) => {
                entries.values().all(|v| item.admits(v))
            }
            (FieldKind::Ptr(_), Value::Null | Value::Ptr(None)) => true,
            (FieldKind::Ptr(target), Value::Ptr(Some(inner))) => target.admits(inner),
            (FieldKind::Record(name), Value::Record(record)) => record.shape().name() == name,
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Any => f.write_str("any"),
            FieldKind::Bool => f.write_str("bool"),
            FieldKind::Int => f.write_str("int"),
            FieldKind::Float => f.write_str("float"),
            FieldKind::Str => f.write_str("string"),
            FieldKind::List(item) => write!(f, "list<{item}>"),
            FieldKind::Map(item) => write!(f, "map<{item}>"),
            FieldKind::Ptr(target) => write!(f, "*{target}"),
            FieldKind::Record(name) => f.write_str(name),
        }
    }
}

impl FromStr for FieldKind {
    type Err = SchemaError;

    /// Parses `bool`, `int`, `float`, `string`, `any`, `list<T>`, `map<T>`,
    /// `*T`, or a shape name
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        let invalid = || SchemaError::InvalidKind {
            spec: spec.to_string(),
        };
        if let Some(target) = spec.strip_prefix('*') {
            return Ok(FieldKind::ptr(target.parse()?));
        }
        for (prefix, wrap) in [
            ("list<", FieldKind::list as fn(FieldKind) -> FieldKind),
            ("map<", FieldKind::map),
        ] {
            if let Some(inner) = spec.strip_prefix(prefix) {
                let inner = inner.strip_suffix('>').ok_or_else(invalid)?;
                return Ok(wrap(inner.parse()?));
            }
        }
        match spec {
            "any" => Ok(FieldKind::Any),
            "bool" => Ok(FieldKind::Bool),
            "int" => Ok(FieldKind::Int),
            "float" => Ok(FieldKind::Float),
            "string" => Ok(FieldKind::Str),
            name if is_shape_name(name) => Ok(FieldKind::record(name)),
            _ => Err(invalid()),
        }
    }
}

fn is_shape_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One field of a [`Shape`]
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    /// Visible to paths and formatting
    pub public: bool,
    /// Anonymous field whose children are promoted into the parent
    pub embedded: bool,
    /// Name used when the field is rendered as a class or style entry
    pub css: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            public: true,
            embedded: false,
            css: None,
        }
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    /// The css override if declared, otherwise the lower-cased field name
    pub fn css_name(&self) -> String {
        self.css.clone().unwrap_or_else(|| self.name.to_lowercase())
    }
}

/// A named record type with ordered fields
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    name: String,
    fields: Vec<FieldDef>,
}

impl Shape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Shorthand for a public, non-embedded field
    pub fn field(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.with_field(FieldDef::new(name, kind))
    }

    /// Shorthand for an embedded record field named after its shape
    pub fn embed(self, shape: impl Into<String>) -> Self {
        let shape = shape.into();
        self.with_field(FieldDef::new(shape.clone(), FieldKind::Record(shape)).embedded())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// Registry of every shape a component's data may contain
#[derive(Debug, Clone, Default)]
pub struct Schema {
    shapes: HashMap<String, Arc<Shape>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, shape: Shape) -> Result<Arc<Shape>, SchemaError> {
        if self.shapes.contains_key(shape.name()) {
            return Err(SchemaError::DuplicateShape {
                name: shape.name().to_string(),
            });
        }
        let shape = Arc::new(shape);
        self.shapes.insert(shape.name().to_string(), Arc::clone(&shape));
        Ok(shape)
    }

    /// Builder form of [`Schema::register`]
    pub fn with_shape(mut self, shape: Shape) -> Result<Self, SchemaError> {
        self.register(shape)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Shape>> {
        self.shapes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.shapes.contains_key(name)
    }

    /// Registered shape names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.shapes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Zero value of a kind; records are instantiated with zeroed fields
    pub fn zero_value(&self, kind: &FieldKind) -> Value {
        self.zero(kind, &mut HashSet::new())
    }

    fn zero(&self, kind: &FieldKind, building: &mut HashSet<String>) -> Value {
        match kind {
            FieldKind::Any => Value::Null,
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Int => Value::Int(0),
            FieldKind::Float => Value::Float(0.0),
            FieldKind::Str => Value::Str(String::new()),
            FieldKind::List(_) => Value::List(Vec::new()),
            FieldKind::Map(_) => Value::Map(Default::default()),
            FieldKind::Ptr(_) => Value::Ptr(None),
            FieldKind::Record(name) => {
                // a record that contains itself by value has no finite zero
                let Some(shape) = self.shapes.get(name) else {
                    return Value::Null;
                };
                if !building.insert(name.clone()) {
                    return Value::Null;
                }
                let fields = shape
                    .fields()
                    .iter()
                    .map(|f| self.zero(&f.kind, building))
                    .collect();
                building.remove(name);
                Value::Record(Record {
                    shape: Arc::clone(shape),
                    fields,
                })
            }
        }
    }

    /// A record of `shape` with every field zeroed
    pub fn instantiate(&self, shape: &str) -> Result<Value, SchemaError> {
        if !self.contains(shape) {
            return Err(SchemaError::unknown_shape(shape));
        }
        Ok(self.zero_value(&FieldKind::record(shape)))
    }

    /// Build a record from named field values; unnamed fields get zero values
    pub fn record<I, K>(&self, shape: &str, fields: I) -> Result<Value, SchemaError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut value = self.instantiate(shape)?;
        let Value::Record(record) = &mut value else {
            return Err(SchemaError::unknown_shape(shape));
        };
        let descriptor = Arc::clone(record.shape());
        for (name, field_value) in fields {
            let name = name.as_ref();
            let index = descriptor
                .field_index(name)
                .ok_or_else(|| SchemaError::UnknownField {
                    shape: shape.to_string(),
                    field: name.to_string(),
                })?;
            let def = &descriptor.fields()[index];
            if !def.kind.admits(&field_value) {
                return Err(SchemaError::KindMismatch {
                    shape: shape.to_string(),
                    field: name.to_string(),
                    expected: def.kind.to_string(),
                    found: field_value.kind_name(),
                });
            }
            record.fields[index] = field_value;
        }
        Ok(value)
    }
}
