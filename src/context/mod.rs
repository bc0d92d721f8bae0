//! Reactive context: per-instance data, props and computed values
//!
//! Every mounted component is an [`Instance`]: a cloneable handle around a
//! mutex-guarded [`ViewModel`]. Reads resolve through three namespaces (own
//! data, props from the parent, computed values); writes go to data only and
//! trigger watchers, recomputation and a render.

mod bus;
mod instance;
mod subs;

pub use bus::Bus;
pub use instance::{Instance, ViewModel};

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::engine::DirectiveError;
use crate::mapper::MappingError;
use crate::value::Value;

/// Read-only values handed down by a parent component
pub type Props = Arc<BTreeMap<String, Value>>;

/// The surface callbacks use to talk to their instance
pub trait Context {
    /// The instance's own data
    fn data(&self) -> &Value;

    /// Look up a path in data, then props, then computed values
    fn get(&self, path: &str) -> Result<Value, ContextError>;

    /// Replace the data value at `path`
    fn set(&mut self, path: &str, value: Value) -> Result<(), ContextError>;

    /// Run a method on another thread, then render
    fn invoke_async(&self, method: &str, args: Vec<Value>);

    /// Publish an event to ancestor components
    fn emit(&self, event: &str, args: Vec<Value>);
}

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("unknown data field: {path}")]
    UnknownField { path: String },

    #[error("cannot assign {found} to {path}, which holds {expected}")]
    KindMismatch {
        path: String,
        expected: String,
        found: &'static str,
    },

    #[error("watchers nested deeper than {limit} levels while setting {path}")]
    ReentrancyLimit { path: String, limit: usize },

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("render failed: {0}")]
    Render(#[source] Box<DirectiveError>),

    #[error("{0}")]
    Callback(String),
}

impl ContextError {
    pub fn unknown_field(path: impl Into<String>) -> Self {
        Self::UnknownField { path: path.into() }
    }

    /// An error raised by user code in a method, watcher or computed field
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback(message.into())
    }
}

impl From<DirectiveError> for ContextError {
    fn from(err: DirectiveError) -> Self {
        Self::Render(Box::new(err))
    }
}

/// Payload of a fired listener
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DomEvent {
    /// Current value of the element, for input events
    pub value: Option<String>,
    /// Arguments passed to method handlers
    pub args: Vec<Value>,
}

impl DomEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// An input event carrying the element's new value
    pub fn input(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }
}
