//! Directive engine
//!
//! A render pass runs in two phases over a fresh copy of the component's
//! parsed template:
//!
//! 1. Structural execution, pre-order. Each element's directive attributes
//!    are parsed up front, then executed in the fixed order
//!    `for > if > model > on > bind > html`. `for` and `if` may replace or
//!    remove the element and tell the walk where to resume.
//! 2. Text interpolation of every text node outside mounted sub-components.

mod directive;
mod format;
mod interpolate;

pub use directive::{take_directives, Directive};
pub use interpolate::{Interpolator, Scope, TemplateError, TextTemplater};

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

use crate::context::{Context, ContextError, ViewModel};
use crate::error::MarkupError;
use crate::markup::{self, Element, Handler, Listener, Node};
use crate::renderer::RenderError;
use crate::value::Value;

#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("unknown directive: {name}")]
    UnknownDirective { name: String },

    #[error("invalid {directive} directive '{value}': {reason}")]
    Syntax {
        directive: String,
        value: String,
        reason: String,
    },

    #[error("{directive} expects {expected} at '{path}', found {found}")]
    WrongKind {
        directive: &'static str,
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("failed to find a root element in the sub-component template")]
    NoRootElement,

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("invalid markup: {0}")]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl DirectiveError {
    pub fn syntax(directive: &str, value: &str, reason: &str) -> Self {
        Self::Syntax {
            directive: directive.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn wrong_kind(
        directive: &'static str,
        path: &str,
        expected: &'static str,
        found: &Value,
    ) -> Self {
        Self::WrongKind {
            directive,
            path: path.to_string(),
            expected,
            found: found.indirect().kind_name(),
        }
    }
}

/// Execute the component template of `vm` against its current state
///
/// Bus subscriptions and sub-component bookkeeping are only committed when
/// the whole pass succeeds.
pub(crate) fn execute(vm: &mut ViewModel) -> Result<Vec<Node>, DirectiveError> {
    let mut nodes = vm.component.nodes().to_vec();
    vm.subs.begin_pass();
    let config = vm.component.config();
    let mut executor = Executor {
        prefix: config.prefix.clone(),
        skip_whitespace: config.skip_whitespace_text,
        subscriptions: Vec::new(),
        vm,
    };
    executor.execute_children(&mut nodes)?;
    executor.interpolate(&mut nodes)?;

    let Executor {
        vm, subscriptions, ..
    } = executor;
    vm.subs.prune();
    vm.bus.clear();
    for (event, method) in &subscriptions {
        vm.bus.subscribe(event, method);
    }
    Ok(nodes)
}

struct Executor<'vm> {
    prefix: String,
    skip_whitespace: bool,
    subscriptions: Vec<(String, String)>,
    vm: &'vm mut ViewModel,
}

impl Executor<'_> {
    fn execute_children(&mut self, nodes: &mut Vec<Node>) -> Result<(), DirectiveError> {
        let mut at = 0;
        while at < nodes.len() {
            at = self.execute_node(nodes, at)?;
        }
        Ok(())
    }

    /// Execute the node at `at` and return the index to continue from
    fn execute_node(&mut self, nodes: &mut Vec<Node>, at: usize) -> Result<usize, DirectiveError> {
        let Node::Element(element) = &mut nodes[at] else {
            return Ok(at + 1);
        };
        let directives = take_directives(element, &self.prefix)?;
        let mut props = BTreeMap::new();

        for (position, directive) in directives.iter().enumerate() {
            trace!(directive = directive.name(), "executing directive");
            match directive {
                Directive::For {
                    variable,
                    collection,
                } => {
                    let remaining = &directives[position + 1..];
                    return self.execute_for(nodes, at, variable, collection, remaining);
                }
                Directive::If { path, negate } => {
                    if !self.condition(path, *negate)? {
                        nodes.remove(at);
                        return Ok(at);
                    }
                }
                other => {
                    let Node::Element(element) = &mut nodes[at] else {
                        return Ok(at + 1);
                    };
                    self.execute_attribute(element, other, &mut props)?;
                }
            }
        }

        let Node::Element(element) = &mut nodes[at] else {
            return Ok(at + 1);
        };
        if let Some(component) = self.vm.component.subs().get(&element.tag).cloned() {
            let instance = self.vm.subs.claim(
                &element.tag,
                &component,
                Arc::new(props),
                &self.vm.mapper,
                &self.vm.bus,
            )?;
            element.children.clear();
            element.mount = Some(instance);
            return Ok(at + 1);
        }
        self.execute_children(&mut element.children)?;
        Ok(at + 1)
    }

    /// Replace the element with one copy per item of the collection
    ///
    /// Copies carry the directives that have not run yet, with the loop
    /// variable rewritten to `collection[i]`. The walk resumes at the first
    /// copy so those directives execute.
    fn execute_for(
        &mut self,
        nodes: &mut Vec<Node>,
        at: usize,
        variable: &str,
        collection: &str,
        remaining: &[Directive],
    ) -> Result<usize, DirectiveError> {
        let value = self.vm.get(collection)?;
        let Some(items) = value.as_list() else {
            return Err(DirectiveError::wrong_kind("for", collection, "list", &value));
        };
        let Node::Element(element) = &nodes[at] else {
            return Ok(at + 1);
        };

        let mut template = element.clone();
        template.attrs = remaining
            .iter()
            .map(|d| d.to_attr(&self.prefix))
            .chain(element.attrs.iter().cloned())
            .collect();

        let copies: Vec<Node> = (0..items.len())
            .map(|i| {
                let mut copy = template.clone();
                substitute(&mut copy, &self.prefix, variable, &format!("{collection}[{i}]"));
                Node::Element(copy)
            })
            .collect();
        trace!(collection, copies = copies.len(), "expanded for");
        nodes.splice(at..=at, copies);
        Ok(at)
    }

    fn condition(&self, path: &str, negate: bool) -> Result<bool, DirectiveError> {
        let value = self.vm.get(path)?;
        match value.as_bool() {
            Some(test) => Ok(test != negate),
            None => Err(DirectiveError::wrong_kind("if", path, "bool", &value)),
        }
    }

    fn execute_attribute(
        &mut self,
        element: &mut Element,
        directive: &Directive,
        props: &mut BTreeMap<String, Value>,
    ) -> Result<(), DirectiveError> {
        match directive {
            Directive::Model { path } => {
                let value = self.vm.get(path)?;
                let Some(text) = value.as_str() else {
                    return Err(DirectiveError::wrong_kind("model", path, "string", &value));
                };
                element.set_attr("value", text);
                element.listeners.push(Listener {
                    event: "input".to_string(),
                    modifiers: Vec::new(),
                    handler: Handler::Model(path.clone()),
                });
            }
            Directive::On {
                event,
                modifiers,
                method,
            } => {
                element.listeners.push(Listener {
                    event: event.clone(),
                    modifiers: modifiers.clone(),
                    handler: Handler::Method(method.clone()),
                });
                self.subscriptions.push((event.clone(), method.clone()));
            }
            Directive::Bind { key, path } => self.bind(element, key, path, props)?,
            Directive::Html { path } => {
                let value = self.vm.get(path)?;
                let Some(source) = value.as_str() else {
                    return Err(DirectiveError::wrong_kind("html", path, "string", &value));
                };
                element.children.extend(markup::parse_fragment(source)?);
            }
            Directive::For { .. } | Directive::If { .. } => {}
        }
        Ok(())
    }

    fn bind(
        &mut self,
        element: &mut Element,
        key: &str,
        path: &str,
        props: &mut BTreeMap<String, Value>,
    ) -> Result<(), DirectiveError> {
        let value = self.vm.get(path)?;
        if value.is_nil() {
            return Err(DirectiveError::wrong_kind("bind", path, "a value", &value));
        }

        let prop = format::title_case(key);
        let is_prop = self
            .vm
            .component
            .subs()
            .get(&element.tag)
            .is_some_and(|sub| sub.has_prop(&prop));
        if is_prop {
            props.insert(prop, value);
            return Ok(());
        }

        let formatted = match key {
            "class" => format::class_list(&value).map(|classes| {
                let existing = element.attr("class").unwrap_or_default();
                [existing, classes.as_str()]
                    .iter()
                    .filter(|part| !part.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
            "style" => format::style_list(&value),
            _ => None,
        };
        match formatted {
            Some(text) => element.set_attr(key, text),
            None if value.as_bool() == Some(false) => {}
            None => element.set_attr(key, value.to_string()),
        }
        Ok(())
    }

    fn interpolate(&self, nodes: &mut [Node]) -> Result<(), DirectiveError> {
        let templater = Arc::clone(self.vm.component.templater());
        self.interpolate_nodes(templater.as_ref(), nodes)
    }

    fn interpolate_nodes(
        &self,
        templater: &dyn TextTemplater,
        nodes: &mut [Node],
    ) -> Result<(), DirectiveError> {
        for node in nodes {
            match node {
                Node::Text(text) => {
                    if self.skip_whitespace && text.trim().is_empty() {
                        continue;
                    }
                    *text = templater.render(text, &*self.vm)?;
                }
                Node::Element(element) if element.mount.is_none() => {
                    self.interpolate_nodes(templater, &mut element.children)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Rewrite the loop variable in directive values and text placeholders
fn substitute(element: &mut Element, prefix: &str, variable: &str, replacement: &str) {
    for attr in &mut element.attrs {
        if attr.key.starts_with(prefix) {
            attr.value = format::replace_token(&attr.value, variable, replacement);
        }
    }
    for child in &mut element.children {
        match child {
            Node::Element(inner) => substitute(inner, prefix, variable, replacement),
            Node::Text(text) => {
                *text = format::replace_in_placeholders(text, variable, replacement);
            }
            Node::Comment(_) => {}
        }
    }
}
