//! Component definitions
//!
//! A [`Component`] is the immutable description shared by all of its
//! instances: the parsed template, a data factory, methods, computed fields,
//! watchers, declared props and the sub-components its template may use.
//! Definitions are assembled with [`ComponentBuilder`].

mod registry;

pub use registry::{ComponentRegistry, RegistryError};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::EngineConfig;
use crate::context::{Context, ContextError};
use crate::engine::{Interpolator, TextTemplater};
use crate::error::MarkupError;
use crate::markup::{self, Node};
use crate::value::Value;

/// A component method, called with the instance context and arguments
pub type Method = Arc<dyn Fn(&mut dyn Context, &[Value]) -> Result<(), ContextError> + Send + Sync>;

/// A derived value recomputed after every effective data change
pub type Computed = Arc<dyn Fn(&dyn Context) -> Result<Value, ContextError> + Send + Sync>;

/// Called with the new and old value when a watched field changes
pub type Watcher =
    Arc<dyn Fn(&mut dyn Context, &Value, &Value) -> Result<(), ContextError> + Send + Sync>;

/// Produces a fresh data value for each instance
pub type DataFactory = Arc<dyn Fn() -> Value + Send + Sync>;

#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("Invalid template markup: {error}")]
    Markup {
        #[source]
        error: MarkupError,
        template: String,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub struct Component {
    el: String,
    template: String,
    nodes: Vec<Node>,
    data: DataFactory,
    methods: HashMap<String, Method>,
    computed: BTreeMap<String, Computed>,
    watchers: HashMap<String, Watcher>,
    subs: ComponentRegistry,
    props: Vec<String>,
    is_sub: bool,
    config: EngineConfig,
    templater: Arc<dyn TextTemplater>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort_unstable();
        f.debug_struct("Component")
            .field("el", &self.el)
            .field("template", &self.template)
            .field("methods", &methods)
            .field("computed", &self.computed.keys().collect::<Vec<_>>())
            .field("subs", &self.subs.tags())
            .field("props", &self.props)
            .field("is_sub", &self.is_sub)
            .finish_non_exhaustive()
    }
}

impl Component {
    pub fn builder() -> ComponentBuilder {
        ComponentBuilder::default()
    }

    /// Root mount selector
    pub fn el(&self) -> &str {
        &self.el
    }

    /// Template source as given
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Template parsed once at build time
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// A fresh data value for a new instance
    pub fn new_data(&self) -> Value {
        (self.data)()
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn computed(&self) -> &BTreeMap<String, Computed> {
        &self.computed
    }

    pub fn watcher(&self, name: &str) -> Option<&Watcher> {
        self.watchers.get(name)
    }

    pub fn subs(&self) -> &ComponentRegistry {
        &self.subs
    }

    pub fn props(&self) -> &[String] {
        &self.props
    }

    pub fn has_prop(&self, name: &str) -> bool {
        self.props.iter().any(|p| p == name)
    }

    pub fn is_sub(&self) -> bool {
        self.is_sub
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn templater(&self) -> &Arc<dyn TextTemplater> {
        &self.templater
    }
}

/// Builder for [`Component`]
pub struct ComponentBuilder {
    el: String,
    template: String,
    data: DataFactory,
    methods: HashMap<String, Method>,
    computed: BTreeMap<String, Computed>,
    watchers: HashMap<String, Watcher>,
    subs: Vec<(String, Arc<Component>)>,
    props: Vec<String>,
    config: EngineConfig,
    templater: Arc<dyn TextTemplater>,
}

impl Default for ComponentBuilder {
    fn default() -> Self {
        Self {
            el: String::new(),
            template: String::new(),
            data: Arc::new(|| Value::Null),
            methods: HashMap::new(),
            computed: BTreeMap::new(),
            watchers: HashMap::new(),
            subs: Vec::new(),
            props: Vec::new(),
            config: EngineConfig::default(),
            templater: Arc::new(Interpolator),
        }
    }
}

impl ComponentBuilder {
    /// Set the root mount selector
    pub fn el(mut self, selector: impl Into<String>) -> Self {
        self.el = selector.into();
        self
    }

    /// Set the template markup
    pub fn template(mut self, markup: impl Into<String>) -> Self {
        self.template = markup.into();
        self
    }

    /// Give every instance a clone of `value` as its data
    pub fn data(self, value: Value) -> Self {
        self.data_with(move || value.clone())
    }

    /// Build each instance's data with a factory
    pub fn data_with(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.data = Arc::new(factory);
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        method: impl Fn(&mut dyn Context, &[Value]) -> Result<(), ContextError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    pub fn computed(
        mut self,
        name: impl Into<String>,
        computed: impl Fn(&dyn Context) -> Result<Value, ContextError> + Send + Sync + 'static,
    ) -> Self {
        self.computed.insert(name.into(), Arc::new(computed));
        self
    }

    /// Watch a data field (by exact path) or a computed name
    pub fn watch(
        mut self,
        name: impl Into<String>,
        watcher: impl Fn(&mut dyn Context, &Value, &Value) -> Result<(), ContextError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.watchers.insert(name.into(), Arc::new(watcher));
        self
    }

    /// Register a sub-component for a tag name
    pub fn sub(mut self, tag: impl Into<String>, component: Arc<Component>) -> Self {
        self.subs.push((tag.into(), component));
        self
    }

    /// Declare the props a sub-component accepts
    pub fn props<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default `{{ path }}` interpolator
    pub fn templater(mut self, templater: impl TextTemplater + 'static) -> Self {
        self.templater = Arc::new(templater);
        self
    }

    /// Build a root component
    pub fn build(self) -> Result<Arc<Component>, ComponentError> {
        self.finish(false)
    }

    /// Build a component meant to be registered as a sub-component
    pub fn build_sub(self) -> Result<Arc<Component>, ComponentError> {
        self.finish(true)
    }

    fn finish(self, is_sub: bool) -> Result<Arc<Component>, ComponentError> {
        let nodes = markup::parse_fragment(&self.template).map_err(|error| ComponentError::Markup {
            error,
            template: self.template.clone(),
        })?;
        let mut subs = ComponentRegistry::new();
        for (tag, component) in self.subs {
            subs.register(&tag, component)?;
        }
        Ok(Arc::new(Component {
            el: self.el,
            template: self.template,
            nodes,
            data: self.data,
            methods: self.methods,
            computed: self.computed,
            watchers: self.watchers,
            subs,
            props: self.props,
            is_sub,
            config: self.config,
            templater: self.templater,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parsed_at_build() {
        let component = Component::builder()
            .el("#app")
            .template("<p>{{ Msg }}</p>")
            .build()
            .expect("Should build");
        assert_eq!(component.el(), "#app");
        assert_eq!(component.nodes().len(), 1);
        assert!(!component.is_sub());
    }

    #[test]
    fn test_malformed_template_fails_build() {
        let err = Component::builder().template("<p>").build().unwrap_err();
        match err {
            ComponentError::Markup { template, .. } => assert_eq!(template, "<p>"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_data_factory_gives_fresh_values() {
        let component = Component::builder()
            .data(Value::from("seed"))
            .build()
            .unwrap();
        assert_eq!(component.new_data(), Value::from("seed"));
        assert_eq!(component.new_data(), Value::from("seed"));
    }

    #[test]
    fn test_props_and_subs() {
        let item = Component::builder()
            .template("<li></li>")
            .props(["Todo", "Index"])
            .build_sub()
            .unwrap();
        assert!(item.has_prop("Todo"));
        assert!(!item.has_prop("todo"));

        let list = Component::builder()
            .template("<ul><item></item></ul>")
            .sub("item", Arc::clone(&item))
            .build()
            .unwrap();
        assert!(list.subs().contains("item"));

        let err = Component::builder()
            .sub("item", Arc::clone(&item))
            .sub("item", item)
            .build()
            .unwrap_err();
        assert!(matches!(err, ComponentError::Registry(RegistryError::Duplicate { .. })));
    }
}
