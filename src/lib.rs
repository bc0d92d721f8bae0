//! Tessera - a reactive UI templating engine
//!
//! Components pair an HTML-like template with typed data. Templates carry
//! `v-` directives (`for`, `if`, `model`, `on`, `bind`, `html`) and
//! `{{ path }}` placeholders; every accepted write to the data re-executes
//! the template and hands the resulting tree to a [`Renderer`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tessera::{Component, FieldKind, HtmlRenderer, Instance, PathMapper, Schema, Shape};
//!
//! let schema = Schema::new()
//!     .with_shape(Shape::new("App").field("Msg", FieldKind::Str))
//!     .unwrap();
//! let data = schema.record("App", [("Msg", "hi".into())]).unwrap();
//! let component = Component::builder()
//!     .template("<p>{{ Msg }}</p>")
//!     .data(data)
//!     .build()
//!     .unwrap();
//!
//! let mapper = Arc::new(PathMapper::new(Arc::new(schema)));
//! let app = Instance::mount(component, mapper, HtmlRenderer::new()).unwrap();
//! app.set("Msg", "hello").unwrap();
//! assert_eq!(app.html(), "<p>hello</p>");
//! ```

pub mod component;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod mapper;
pub mod markup;
pub mod renderer;
pub mod value;

pub use component::{Component, ComponentBuilder, ComponentError, ComponentRegistry};
pub use config::EngineConfig;
pub use context::{Context, ContextError, DomEvent, Instance, ViewModel};
pub use engine::{Directive, DirectiveError};
pub use error::MarkupError;
pub use manifest::{Manifest, ManifestError};
pub use mapper::{Location, MappingError, PathMapper, TraversalMap};
pub use markup::{parse_fragment, Element, Node};
pub use renderer::{to_html, HtmlRenderer, NullRenderer, RenderError, Renderer};
pub use value::{FieldDef, FieldKind, Record, Schema, SchemaError, Shape, Value};

use std::path::Path;

use thiserror::Error;

/// Errors that can occur during the manifest pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Context(#[from] ContextError),
}

/// Load a manifest, mount it and return the rendered HTML
///
/// # Example
///
/// ```rust
/// let html = tessera::render_manifest(r#"
///     template = "<ul><li v-for='n in Names'>{{ n }}</li></ul>"
///     [data]
///     Names = ["a", "b"]
/// "#).unwrap();
/// assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
/// ```
pub fn render_manifest(source: &str) -> Result<String, Error> {
    let manifest = Manifest::from_str(source)?;
    render_with_sets(&manifest, &[])
}

/// Load a manifest file, apply `sets` after mounting and return the HTML
pub fn render_manifest_file(path: &Path, sets: &[(String, Value)]) -> Result<String, Error> {
    let manifest = Manifest::from_file(path)?;
    render_with_sets(&manifest, sets)
}

/// Mount `manifest`, apply each `(path, value)` in order and return the HTML
pub fn render_with_sets(manifest: &Manifest, sets: &[(String, Value)]) -> Result<String, Error> {
    let instance = manifest.mount(HtmlRenderer::new())?;
    for (path, value) in sets {
        instance.set(path, value.clone())?;
    }
    instance.wait_idle();
    Ok(instance.html())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_manifest_untyped_data() {
        let html = render_manifest(
            r#"
template = "<p v-if='Show'>{{ Msg }}</p>"
[data]
Show = true
Msg = "hi"
"#,
        )
        .unwrap();
        assert_eq!(html, "<p>hi</p>");
    }

    #[test]
    fn test_render_with_sets_applies_in_order() {
        let manifest = Manifest::from_str(
            r#"
template = "<p>{{ Msg }}</p>"
[data]
Msg = "a"
"#,
        )
        .unwrap();
        let sets = vec![
            ("Msg".to_string(), Value::from("b")),
            ("Msg".to_string(), Value::from("c")),
        ];
        assert_eq!(render_with_sets(&manifest, &sets).unwrap(), "<p>c</p>");
    }

    #[test]
    fn test_set_unknown_path_is_an_error() {
        let manifest = Manifest::from_str("template = \"<p></p>\"\n[data]\nMsg = \"a\"").unwrap();
        let sets = vec![("Nope".to_string(), Value::from(1))];
        let err = render_with_sets(&manifest, &sets).unwrap_err();
        assert!(matches!(err, Error::Context(ContextError::UnknownField { .. })));
    }
}
