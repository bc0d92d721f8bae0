//! Component manifests
//!
//! A manifest is a TOML file describing a root component: its template, the
//! shapes its data uses, the initial data and any sub-components.
//!
//! ```toml
//! el = "#app"
//! root = "App"
//! template = "<p>{{ Msg }}</p>"
//!
//! [[shapes]]
//! name = "App"
//! fields = [{ name = "Msg", type = "string" }]
//!
//! [data]
//! Msg = "hello"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::component::{Component, ComponentBuilder, ComponentError};
use crate::config::EngineConfig;
use crate::context::{ContextError, Instance};
use crate::mapper::PathMapper;
use crate::renderer::Renderer;
use crate::value::{FieldDef, FieldKind, Schema, SchemaError, Shape, Value};

/// Errors that can occur when loading a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse manifest TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error("Data at '{path}' should be {expected}, found {found}")]
    Data {
        path: String,
        expected: String,
        found: &'static str,
    },

    #[error("Component {component} declares no template")]
    MissingTemplate { component: String },
}

/// A loaded manifest: the schema and the root component built from it
#[derive(Debug, Clone)]
pub struct Manifest {
    pub el: String,
    pub schema: Arc<Schema>,
    pub component: Arc<Component>,
}

/// TOML structure for deserializing manifests
#[derive(Deserialize)]
struct TomlManifest {
    #[serde(default)]
    el: String,
    #[serde(flatten)]
    template: TomlTemplate,
    root: Option<String>,
    #[serde(default)]
    engine: EngineConfig,
    #[serde(default)]
    shapes: Vec<TomlShape>,
    data: Option<toml::Table>,
    #[serde(default)]
    components: BTreeMap<String, TomlComponent>,
}

#[derive(Deserialize)]
struct TomlTemplate {
    template: Option<String>,
    template_file: Option<PathBuf>,
}

#[derive(Deserialize)]
struct TomlShape {
    name: String,
    #[serde(default)]
    fields: Vec<TomlField>,
}

#[derive(Deserialize)]
struct TomlField {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    embedded: bool,
    #[serde(default)]
    private: bool,
    css: Option<String>,
}

#[derive(Deserialize)]
struct TomlComponent {
    #[serde(flatten)]
    template: TomlTemplate,
    root: Option<String>,
    #[serde(default)]
    props: Vec<String>,
    data: Option<toml::Table>,
}

impl Manifest {
    /// Load a manifest from a file; `template_file` paths are relative to it
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::load(&content, path.parent())
    }

    /// Load a manifest from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ManifestError> {
        Self::load(content, None)
    }

    fn load(content: &str, base: Option<&Path>) -> Result<Self, ManifestError> {
        let parsed: TomlManifest = toml::from_str(content)?;

        let mut schema = Schema::new();
        for shape in &parsed.shapes {
            schema.register(build_shape(shape)?)?;
        }

        let mut builder = component_builder(
            &schema,
            "root",
            &parsed.template,
            parsed.root.as_deref(),
            parsed.data.as_ref(),
            base,
        )?
        .el(parsed.el.clone())
        .config(parsed.engine.clone());

        for (tag, sub) in &parsed.components {
            let component = component_builder(
                &schema,
                tag,
                &sub.template,
                sub.root.as_deref(),
                sub.data.as_ref(),
                base,
            )?
            .props(sub.props.iter().cloned())
            .config(parsed.engine.clone())
            .build_sub()?;
            builder = builder.sub(tag.clone(), component);
        }

        Ok(Manifest {
            el: parsed.el,
            schema: Arc::new(schema),
            component: builder.build()?,
        })
    }

    /// A path mapper over this manifest's schema
    pub fn mapper(&self) -> Arc<PathMapper> {
        Arc::new(PathMapper::new(Arc::clone(&self.schema)))
    }

    /// Mount the root component
    pub fn mount(&self, renderer: impl Renderer + 'static) -> Result<Instance, ContextError> {
        Instance::mount(Arc::clone(&self.component), self.mapper(), renderer)
    }
}

fn build_shape(shape: &TomlShape) -> Result<Shape, ManifestError> {
    let mut built = Shape::new(shape.name.clone());
    for field in &shape.fields {
        let mut def = FieldDef::new(field.name.clone(), field.kind.parse::<FieldKind>()?);
        if field.embedded {
            def = def.embedded();
        }
        if field.private {
            def = def.private();
        }
        if let Some(css) = &field.css {
            def = def.with_css(css.clone());
        }
        built = built.with_field(def);
    }
    Ok(built)
}

fn component_builder(
    schema: &Schema,
    name: &str,
    template: &TomlTemplate,
    root: Option<&str>,
    data: Option<&toml::Table>,
    base: Option<&Path>,
) -> Result<ComponentBuilder, ManifestError> {
    let source = match (&template.template, &template.template_file) {
        (Some(inline), _) => inline.clone(),
        (None, Some(file)) => {
            let path = match base {
                Some(base) => base.join(file),
                None => file.clone(),
            };
            std::fs::read_to_string(path)?
        }
        (None, None) => {
            return Err(ManifestError::MissingTemplate {
                component: name.to_string(),
            })
        }
    };

    let data = match (root, data) {
        (Some(root), Some(table)) => convert_record(schema, root, table, "")?,
        (Some(root), None) => schema.instantiate(root)?,
        (None, Some(table)) => from_toml(&toml::Value::Table(table.clone())),
        (None, None) => Value::Null,
    };

    Ok(Component::builder().template(source).data(data))
}

/// Convert TOML into a value conforming to `kind`
pub fn convert(
    schema: &Schema,
    value: &toml::Value,
    kind: &FieldKind,
    path: &str,
) -> Result<Value, ManifestError> {
    match (kind, value) {
        (FieldKind::Any, _) => Ok(from_toml(value)),
        (FieldKind::Bool, toml::Value::Boolean(b)) => Ok(Value::Bool(*b)),
        (FieldKind::Int, toml::Value::Integer(i)) => Ok(Value::Int(*i)),
        (FieldKind::Float, toml::Value::Float(x)) => Ok(Value::Float(*x)),
        (FieldKind::Float, toml::Value::Integer(i)) => Ok(Value::Float(*i as f64)),
        (FieldKind::Str, toml::Value::String(s)) => Ok(Value::Str(s.clone())),
        (FieldKind::List(item), toml::Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| convert(schema, v, item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (FieldKind::Map(item), toml::Value::Table(table)) => table
            .iter()
            .map(|(key, v)| {
                let converted = convert(schema, v, item, &format!("{path}[\"{key}\"]"))?;
                Ok((key.clone(), converted))
            })
            .collect::<Result<BTreeMap<_, _>, ManifestError>>()
            .map(Value::Map),
        (FieldKind::Ptr(target), _) => Ok(Value::ptr(convert(schema, value, target, path)?)),
        (FieldKind::Record(shape), toml::Value::Table(table)) => {
            convert_record(schema, shape, table, path)
        }
        _ => Err(ManifestError::Data {
            path: path.to_string(),
            expected: kind.to_string(),
            found: value.type_str(),
        }),
    }
}

fn convert_record(
    schema: &Schema,
    shape: &str,
    table: &toml::Table,
    path: &str,
) -> Result<Value, ManifestError> {
    let descriptor = schema
        .get(shape)
        .ok_or_else(|| SchemaError::unknown_shape(shape))?;
    let mut fields = Vec::new();
    for (key, raw) in table {
        let def = descriptor
            .fields()
            .iter()
            .find(|f| &f.name == key)
            .ok_or_else(|| SchemaError::UnknownField {
                shape: shape.to_string(),
                field: key.clone(),
            })?;
        let field_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        fields.push((key.as_str(), convert(schema, raw, &def.kind, &field_path)?));
    }
    Ok(schema.record(shape, fields)?)
}

/// Convert TOML without a declared kind; tables become maps
pub fn from_toml(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::Str(s.clone()),
        toml::Value::Integer(i) => Value::Int(*i),
        toml::Value::Float(x) => Value::Float(*x),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(d) => Value::Str(d.to_string()),
        toml::Value::Array(items) => Value::List(items.iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Map(
            table
                .iter()
                .map(|(k, v)| (k.clone(), from_toml(v)))
                .collect(),
        ),
    }
}

/// Parse a command-line value as TOML, falling back to a plain string
pub fn parse_value(raw: &str) -> Value {
    match format!("value = {raw}").parse::<toml::Table>() {
        Ok(mut table) => table
            .remove("value")
            .map(|v| from_toml(&v))
            .unwrap_or_else(|| Value::from(raw)),
        Err(_) => Value::from(raw),
    }
}
