//! Dynamic component data and the shape descriptors that type it
//!
//! Component data is a tree of [`Value`]s. Records carry the [`Shape`] that
//! describes their fields, and shapes are registered in a [`Schema`]. The path
//! mapper walks these descriptors instead of relying on runtime reflection.

mod schema;

pub use schema::{FieldDef, FieldKind, Schema, SchemaError, Shape};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A node in a component's data graph
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Record(Record),
    /// Indirection to another value; `Ptr(None)` is a nil pointer
    Ptr(Option<Box<Value>>),
}

impl Value {
    /// Wrap a value behind a pointer
    pub fn ptr(value: impl Into<Value>) -> Self {
        Value::Ptr(Some(Box::new(value.into())))
    }

    /// Human readable name of the variant, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
            Value::Ptr(_) => "pointer",
        }
    }

    /// Follow pointers until a non-pointer value is reached
    ///
    /// A nil pointer is returned as is.
    pub fn indirect(&self) -> &Value {
        match self {
            Value::Ptr(Some(inner)) => inner.indirect(),
            other => other,
        }
    }

    /// Mutable counterpart of [`Value::indirect`]
    pub fn indirect_mut(&mut self) -> &mut Value {
        match self {
            Value::Ptr(Some(inner)) => inner.indirect_mut(),
            other => other,
        }
    }

    /// True for `Null` and nil pointers
    pub fn is_nil(&self) -> bool {
        matches!(self.indirect(), Value::Null | Value::Ptr(None))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.indirect() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.indirect() {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.indirect() {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self.indirect() {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self.indirect() {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Whether `other` may be stored in a slot currently holding `self`
    ///
    /// Variants must match and records must share a shape. A `Null` slot
    /// accepts anything, and pointer slots accept `Null`.
    pub fn same_kind(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, _) => true,
            (Value::Ptr(_), Value::Ptr(_) | Value::Null) => true,
            (Value::Record(a), Value::Record(b)) => a.shape.name() == b.shape.name(),
            (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null | Value::Ptr(None) => f.write_str("<nil>"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                write_spaced(f, items.iter())?;
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("map[")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{key}:{value}")?;
                }
                f.write_str("]")
            }
            Value::Record(record) => {
                f.write_str("{")?;
                write_spaced(f, record.fields.iter())?;
                f.write_str("}")
            }
            Value::Ptr(Some(inner)) => match inner.as_ref() {
                Value::Record(_) | Value::List(_) | Value::Map(_) => write!(f, "&{inner}"),
                other => write!(f, "{other}"),
            },
        }
    }
}

fn write_spaced<'a>(
    f: &mut fmt::Formatter<'_>,
    values: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, value) in values.enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

/// A value of a registered [`Shape`], with one slot per declared field
#[derive(Debug, Clone)]
pub struct Record {
    shape: Arc<Shape>,
    fields: Vec<Value>,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.shape.name() == other.shape.name() && self.fields == other.fields
    }
}

impl Record {
    /// Create a record from positional field values
    pub fn new(shape: Arc<Shape>, fields: Vec<Value>) -> Result<Self, SchemaError> {
        if fields.len() != shape.fields().len() {
            return Err(SchemaError::Arity {
                shape: shape.name().to_string(),
                expected: shape.fields().len(),
                found: fields.len(),
            });
        }
        Ok(Self { shape, fields })
    }

    pub fn shape(&self) -> &Arc<Shape> {
        &self.shape
    }

    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    pub fn field_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.fields.get_mut(index)
    }

    /// Look up one of this record's own fields by name (no promotion)
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.shape.field_index(name).and_then(|i| self.fields.get(i))
    }

    /// Public fields with their descriptors, in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (&FieldDef, &Value)> {
        self.shape
            .fields()
            .iter()
            .zip(self.fields.iter())
            .filter(|(def, _)| def.public)
    }
}
