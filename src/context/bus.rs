//! Hierarchical event bus
//!
//! Each instance owns one node, linked to its parent's. `on` directives
//! subscribe methods on the rendering instance's node; an emitted event is
//! delivered to every subscribed ancestor as an asynchronous method call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::trace;

use super::instance::{spawn_call, Shared};
use crate::value::Value;

#[derive(Debug)]
pub struct Bus {
    parent: Option<Arc<Bus>>,
    owner: Weak<Shared>,
    subscriptions: Mutex<HashMap<String, Vec<String>>>,
}

impl Bus {
    pub(crate) fn new(parent: Option<Arc<Bus>>, owner: Weak<Shared>) -> Self {
        Self {
            parent,
            owner,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe `method` of the owning instance to `event`
    pub fn subscribe(&self, event: &str, method: &str) {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let methods = subscriptions.entry(event.to_string()).or_default();
        if !methods.iter().any(|m| m == method) {
            methods.push(method.to_string());
        }
    }

    /// Drop every subscription; called at the start of each render pass
    pub fn clear(&self) {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn subscribers(&self, event: &str) -> Vec<String> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    /// The instance owning the topmost node of this chain
    pub(crate) fn root_owner(&self) -> Option<Arc<Shared>> {
        let mut node = self;
        while let Some(parent) = node.parent.as_deref() {
            node = parent;
        }
        node.owner.upgrade()
    }

    /// Deliver `event` to subscribed ancestors, nearest first
    ///
    /// Returns the number of method calls scheduled.
    pub fn publish(&self, event: &str, args: Vec<Value>) -> usize {
        let mut delivered = 0;
        let mut node = self.parent.as_deref();
        while let Some(bus) = node {
            delivered += bus.deliver(event, &args);
            node = bus.parent.as_deref();
        }
        trace!(event, delivered, "event published");
        delivered
    }

    fn deliver(&self, event: &str, args: &[Value]) -> usize {
        let methods = self.subscribers(event);
        let Some(owner) = self.owner.upgrade() else {
            return 0;
        };
        for method in &methods {
            spawn_call(&owner, method, args.to_vec());
        }
        methods.len()
    }
}
