//! Renderers receive fully executed template trees
//!
//! A render pass hands its output to the instance's [`Renderer`] only after
//! every directive succeeded, so a renderer never sees a partial tree.

pub mod html;

pub use html::to_html;

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::markup::Node;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Renderer for '{mount}' rejected the tree: {reason}")]
    Rejected { mount: String, reason: String },
}

impl RenderError {
    pub fn rejected(mount: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            mount: mount.into(),
            reason: reason.into(),
        }
    }
}

/// Receives the rendered tree of an instance
///
/// `mount` is the component's root selector (empty for sub-components).
pub trait Renderer: Send {
    fn render(&mut self, mount: &str, nodes: &[Node]) -> Result<(), RenderError>;
}

/// Discards every tree; used for sub-components, whose output reaches the
/// root's renderer through the root's tree
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _mount: &str, _nodes: &[Node]) -> Result<(), RenderError> {
        Ok(())
    }
}

/// Serializes every rendered tree to HTML and keeps the frames
///
/// Clones share the same frame log, so a clone kept outside the instance can
/// observe what was rendered.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    frames: Arc<Mutex<Vec<String>>>,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<String> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Renderer for HtmlRenderer {
    fn render(&mut self, _mount: &str, nodes: &[Node]) -> Result<(), RenderError> {
        let html = to_html(nodes);
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(html);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Element;

    #[test]
    fn test_html_renderer_shares_frames_between_clones() {
        let renderer = HtmlRenderer::new();
        let mut boxed: Box<dyn Renderer> = Box::new(renderer.clone());
        boxed
            .render("#app", &[Element::new("p").into()])
            .expect("Should render");
        boxed.render("#app", &[]).expect("Should render");
        assert_eq!(renderer.count(), 2);
        assert_eq!(renderer.frames()[0], "<p></p>");
        assert_eq!(renderer.last(), Some(String::new()));
    }
}
