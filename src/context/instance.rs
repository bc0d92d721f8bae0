//! Instances and their view models

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace, warn};

use super::subs::SubInstances;
use super::{Bus, Context, ContextError, DomEvent, Props};
use crate::component::Component;
use crate::engine::{self, DirectiveError, Scope};
use crate::mapper::{self, MappingError, PathMapper};
use crate::markup::{first_element, Handler, Listener, Node};
use crate::renderer::{to_html, Renderer};
use crate::value::Value;

/// State shared by every handle to one instance
pub(crate) struct Shared {
    component: Arc<Component>,
    state: Mutex<ViewModel>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// A mounted component
///
/// Cloning the handle does not copy the instance. All access goes through
/// one mutex, so mutations are serialized.
#[derive(Clone)]
pub struct Instance {
    shared: Arc<Shared>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("el", &self.shared.component.el())
            .field("is_sub", &self.shared.component.is_sub())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Instance {
    /// Mount a root component and render it once
    pub fn mount(
        component: Arc<Component>,
        mapper: Arc<PathMapper>,
        renderer: impl Renderer + 'static,
    ) -> Result<Self, ContextError> {
        Self::spawn(
            component,
            mapper,
            Arc::new(BTreeMap::new()),
            None,
            Box::new(renderer),
        )
    }

    pub(crate) fn spawn(
        component: Arc<Component>,
        mapper: Arc<PathMapper>,
        props: Props,
        parent_bus: Option<Arc<Bus>>,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, ContextError> {
        let shared = Arc::new_cyclic(|this: &Weak<Shared>| {
            let bus = Arc::new(Bus::new(parent_bus, this.clone()));
            let view_model = ViewModel {
                component: Arc::clone(&component),
                data: component.new_data(),
                props,
                cache: BTreeMap::new(),
                mapper,
                subs: SubInstances::default(),
                bus,
                renderer,
                tree: Vec::new(),
                renders: 0,
                depth: 0,
                this: this.clone(),
            };
            Shared {
                component,
                state: Mutex::new(view_model),
                tasks: Mutex::new(Vec::new()),
            }
        });
        let instance = Instance { shared };
        instance.with(|vm| {
            vm.recompute_computed()?;
            vm.render()
        })?;
        Ok(instance)
    }

    fn lock(&self) -> MutexGuard<'_, ViewModel> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the view model
    pub fn with<R>(&self, f: impl FnOnce(&mut ViewModel) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn component(&self) -> &Arc<Component> {
        &self.shared.component
    }

    /// A copy of the instance's data
    pub fn data(&self) -> Value {
        self.lock().data.clone()
    }

    pub fn get(&self, path: &str) -> Result<Value, ContextError> {
        self.lock().get(path)
    }

    pub fn set(&self, path: &str, value: impl Into<Value>) -> Result<(), ContextError> {
        self.update(|vm| vm.set(path, value.into()))
    }

    pub fn invoke_async(&self, method: &str, args: Vec<Value>) {
        spawn_call(&self.shared, method, args);
    }

    pub fn emit(&self, event: &str, args: Vec<Value>) {
        let bus = Arc::clone(&self.lock().bus);
        bus.publish(event, args);
    }

    /// Handle a fired listener
    ///
    /// Model listeners write the event value into their field; method
    /// listeners call the method with the event arguments and render.
    pub fn dispatch(&self, listener: &Listener, event: DomEvent) -> Result<(), ContextError> {
        trace!(event = %listener.event, "dispatching listener");
        match &listener.handler {
            Handler::Model(path) => {
                let value = event.value.unwrap_or_default();
                self.update(|vm| vm.set(path, Value::Str(value)))
            }
            Handler::Method(name) => self.call(name, &event.args),
        }
    }

    /// Run the directive engine and hand the tree to the renderer
    pub fn render(&self) -> Result<(), ContextError> {
        self.update(ViewModel::render)
    }

    /// The last rendered tree, serialized with mounted sub-components
    pub fn html(&self) -> String {
        to_html(&self.lock().tree)
    }

    pub fn tree(&self) -> Vec<Node> {
        self.lock().tree.clone()
    }

    pub fn render_count(&self) -> usize {
        self.lock().renders
    }

    /// Block until every async call made on this instance has finished
    pub fn wait_idle(&self) {
        loop {
            let pending = std::mem::take(
                &mut *self
                    .shared
                    .tasks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            if pending.is_empty() {
                break;
            }
            for handle in pending {
                if handle.join().is_err() {
                    warn!("async method call panicked");
                }
            }
        }
    }

    pub(crate) fn update_props(&self, props: Props) -> Result<(), ContextError> {
        let mut vm = self.lock();
        if vm.props == props {
            return Ok(());
        }
        vm.props = props;
        vm.recompute_computed()?;
        vm.render()
    }

    fn call(&self, method: &str, args: &[Value]) -> Result<(), ContextError> {
        let Some(function) = self.shared.component.method(method).cloned() else {
            debug!(method, "call to unknown method ignored");
            return Ok(());
        };
        self.update(|vm| {
            function(&mut *vm, args)?;
            vm.render()
        })
    }

    /// Run `f` on the view model, then redraw the root if a sub-component
    /// rendered
    ///
    /// The root is locked only after this instance's lock is released, so
    /// locks are always taken parent first.
    fn update(
        &self,
        f: impl FnOnce(&mut ViewModel) -> Result<(), ContextError>,
    ) -> Result<(), ContextError> {
        let (rendered, bus) = {
            let mut vm = self.lock();
            let before = vm.renders;
            f(&mut *vm)?;
            (vm.renders != before, Arc::clone(&vm.bus))
        };
        if !rendered || !self.shared.component.is_sub() {
            return Ok(());
        }
        let Some(shared) = bus.root_owner().filter(|root| !root.component.is_sub()) else {
            debug!("sub-component render has no mounted root");
            return Ok(());
        };
        let root = Instance { shared };
        let mut vm = root.lock();
        vm.redraw()
    }
}

/// Run `method` on its own thread, then render the instance
pub(crate) fn spawn_call(shared: &Arc<Shared>, method: &str, args: Vec<Value>) {
    if shared.component.method(method).is_none() {
        debug!(method, "async call to unknown method ignored");
        return;
    }
    let instance = Instance {
        shared: Arc::clone(shared),
    };
    let name = method.to_string();
    let handle = thread::spawn(move || {
        if let Err(err) = instance.call(&name, &args) {
            warn!(method = %name, error = %err, "async method call failed");
        }
    });
    let mut tasks = shared.tasks.lock().unwrap_or_else(PoisonError::into_inner);
    tasks.retain(|task| !task.is_finished());
    tasks.push(handle);
}

/// The state behind an [`Instance`]
pub struct ViewModel {
    pub(crate) component: Arc<Component>,
    pub(crate) data: Value,
    pub(crate) props: Props,
    pub(crate) cache: BTreeMap<String, Value>,
    pub(crate) mapper: Arc<PathMapper>,
    pub(crate) subs: SubInstances,
    pub(crate) bus: Arc<Bus>,
    renderer: Box<dyn Renderer>,
    tree: Vec<Node>,
    renders: usize,
    depth: usize,
    this: Weak<Shared>,
}

impl fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModel")
            .field("data", &self.data)
            .field("props", &self.props)
            .field("cache", &self.cache)
            .field("subs", &self.subs.count())
            .field("renders", &self.renders)
            .finish_non_exhaustive()
    }
}

impl ViewModel {
    pub fn component(&self) -> &Arc<Component> {
        &self.component
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The cached value of a computed field
    pub fn computed(&self, name: &str) -> Option<&Value> {
        self.cache.get(name)
    }

    pub fn tree(&self) -> &[Node] {
        &self.tree
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Rebuild the computed cache and fire watchers of changed values
    ///
    /// Only names present in the previous cache can fire, so the first
    /// computation never triggers watchers. Computed functions see the
    /// previous cache when they read other computed values.
    pub fn recompute_computed(&mut self) -> Result<(), ContextError> {
        let component = Arc::clone(&self.component);
        let mut fresh = BTreeMap::new();
        for (name, computed) in component.computed() {
            fresh.insert(name.clone(), computed(&*self)?);
        }
        let previous = std::mem::replace(&mut self.cache, fresh);
        for (name, old) in &previous {
            let Some(watcher) = component.watcher(name) else {
                continue;
            };
            let Some(new) = self.cache.get(name).cloned() else {
                continue;
            };
            if new != *old {
                trace!(computed = %name, "computed value changed");
                watcher(self, &new, old)?;
            }
        }
        Ok(())
    }

    /// Execute the template and pass the result to the renderer
    ///
    /// The previous tree is kept when any directive fails.
    pub fn render(&mut self) -> Result<(), ContextError> {
        let mut nodes = engine::execute(self)?;
        if self.component.is_sub() {
            let root = first_element(&nodes)
                .cloned()
                .ok_or(DirectiveError::NoRootElement)?;
            nodes = vec![Node::Element(root)];
        }
        self.renderer
            .render(self.component.el(), &nodes)
            .map_err(DirectiveError::from)?;
        self.tree = nodes;
        self.renders += 1;
        debug!(el = self.component.el(), renders = self.renders, "rendered");
        Ok(())
    }

    /// Hand the current tree to the renderer again without executing the
    /// template; picks up sub-components that rendered on their own
    fn redraw(&mut self) -> Result<(), ContextError> {
        self.renderer
            .render(self.component.el(), &self.tree)
            .map_err(DirectiveError::from)?;
        trace!(el = self.component.el(), "redrawn after sub-component render");
        Ok(())
    }

    /// Resolve a path through data, props and computed values
    pub(crate) fn find(&self, path: &str) -> Result<Option<Value>, MappingError> {
        if let Some(value) = self.mapper.get(&self.data, path)? {
            return Ok(Some(value.clone()));
        }
        let (key, rest) = mapper::split_head(path);
        let Some(value) = self.props.get(key).or_else(|| self.cache.get(key)) else {
            return Ok(None);
        };
        if rest.is_empty() {
            return Ok(Some(value.clone()));
        }
        Ok(self.mapper.get(value, rest)?.cloned())
    }

    fn apply_write(&mut self, path: &str, new: &Value, old: &Value) -> Result<(), ContextError> {
        let component = Arc::clone(&self.component);
        if let Some(watcher) = component.watcher(path) {
            trace!(path, "running watcher");
            watcher(self, new, old)?;
        }
        self.recompute_computed()
    }
}

impl Context for ViewModel {
    fn data(&self) -> &Value {
        &self.data
    }

    fn get(&self, path: &str) -> Result<Value, ContextError> {
        self.find(path)?
            .ok_or_else(|| ContextError::unknown_field(path))
    }

    fn set(&mut self, path: &str, value: Value) -> Result<(), ContextError> {
        let location = self
            .mapper
            .resolve(&self.data, path)?
            .ok_or_else(|| ContextError::unknown_field(path))?;
        let declared = location.declared_kind(&self.data);
        let slot = location
            .get_mut(&mut self.data)
            .ok_or_else(|| ContextError::unknown_field(path))?;
        if *slot == value {
            debug!(path, "set skipped, value unchanged");
            return Ok(());
        }
        // untyped containers keep whatever kind the slot already holds
        let admitted = match &declared {
            Some(kind) => kind.admits(&value),
            None => slot.same_kind(&value),
        };
        if !admitted {
            let expected = match declared {
                Some(kind) => kind.to_string(),
                None => slot.kind_name().to_string(),
            };
            return Err(ContextError::KindMismatch {
                path: path.to_string(),
                expected,
                found: value.kind_name(),
            });
        }
        let limit = self.component.config().max_watch_depth;
        if self.depth >= limit {
            return Err(ContextError::ReentrancyLimit {
                path: path.to_string(),
                limit,
            });
        }
        let old = std::mem::replace(slot, value.clone());
        debug!(path, depth = self.depth, "data field updated");

        self.depth += 1;
        let outcome = self.apply_write(path, &value, &old);
        self.depth -= 1;
        outcome?;

        // nested sets leave rendering to the outermost one
        if self.depth == 0 {
            self.render()?;
        }
        Ok(())
    }

    fn invoke_async(&self, method: &str, args: Vec<Value>) {
        match self.this.upgrade() {
            Some(shared) => spawn_call(&shared, method, args),
            None => debug!(method, "async call on a dropped instance ignored"),
        }
    }

    fn emit(&self, event: &str, args: Vec<Value>) {
        self.bus.publish(event, args);
    }
}

impl Scope for ViewModel {
    fn lookup(&self, name: &str) -> Option<Value> {
        match self.find(name) {
            Ok(value) => value,
            Err(err) => {
                warn!(name, error = %err, "interpolation lookup failed");
                None
            }
        }
    }
}
