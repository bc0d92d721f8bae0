//! Sub-component instances owned by a parent

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{Bus, ContextError, Instance, Props};
use crate::component::Component;
use crate::mapper::PathMapper;
use crate::renderer::NullRenderer;

/// Child instances of one parent, keyed by tag and occurrence order
///
/// A render pass claims instances with [`SubInstances::claim`]; the n-th
/// occurrence of a tag reuses the n-th existing instance. Instances not
/// claimed by a pass are dropped by [`SubInstances::prune`].
#[derive(Debug, Default)]
pub(crate) struct SubInstances {
    instances: HashMap<String, Vec<Instance>>,
    claimed: HashMap<String, usize>,
}

impl SubInstances {
    pub(crate) fn begin_pass(&mut self) {
        self.claimed.clear();
    }

    pub(crate) fn claim(
        &mut self,
        tag: &str,
        component: &Arc<Component>,
        props: Props,
        mapper: &Arc<PathMapper>,
        bus: &Arc<Bus>,
    ) -> Result<Instance, ContextError> {
        let claimed = self.claimed.entry(tag.to_string()).or_insert(0);
        let ordinal = *claimed;
        *claimed += 1;

        let slots = self.instances.entry(tag.to_string()).or_default();
        if let Some(existing) = slots.get(ordinal) {
            existing.update_props(props)?;
            return Ok(existing.clone());
        }
        let child = Instance::spawn(
            Arc::clone(component),
            Arc::clone(mapper),
            props,
            Some(Arc::clone(bus)),
            Box::new(NullRenderer),
        )?;
        debug!(tag, ordinal, "created sub-component instance");
        slots.push(child.clone());
        Ok(child)
    }

    pub(crate) fn prune(&mut self) {
        for (tag, slots) in &mut self.instances {
            let used = self.claimed.get(tag).copied().unwrap_or(0);
            if slots.len() > used {
                debug!(tag = %tag, dropped = slots.len() - used, "dropped sub-component instances");
                slots.truncate(used);
            }
        }
        self.instances.retain(|_, slots| !slots.is_empty());
    }

    pub(crate) fn count(&self) -> usize {
        self.instances.values().map(Vec::len).sum()
    }
}
