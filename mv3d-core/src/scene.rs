/// The shared display container models are attached to
use crate::node::{NodeId, Renderable};

/// Renderer-side container the lifecycle attaches models to.
///
/// Attaching moves the renderable in; detaching hands it back.
pub trait SceneGraph {
    fn add_child(&mut self, node: Renderable);
    fn remove_child(&mut self, id: NodeId) -> Option<Renderable>;
    fn contains(&self, id: NodeId) -> bool;
    fn child_mut(&mut self, id: NodeId) -> Option<&mut Renderable>;
    fn request_redraw(&mut self);
    /// Returns whether a redraw was requested since the last call
    fn take_redraw(&mut self) -> bool;
}

/// Default owned container: keeps attached renderables and a dirty flag.
#[derive(Debug, Default)]
pub struct ObjectContainer {
    children: Vec<Renderable>,
    dirty: bool,
}

impl ObjectContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children(&self) -> &[Renderable] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl SceneGraph for ObjectContainer {
    fn add_child(&mut self, node: Renderable) {
        if !self.contains(node.id()) {
            self.children.push(node);
            self.dirty = true;
        }
    }

    fn remove_child(&mut self, id: NodeId) -> Option<Renderable> {
        let index = self.children.iter().position(|child| child.id() == id)?;
        self.dirty = true;
        Some(self.children.remove(index))
    }

    fn contains(&self, id: NodeId) -> bool {
        self.children.iter().any(|child| child.id() == id)
    }

    fn child_mut(&mut self, id: NodeId) -> Option<&mut Renderable> {
        self.children.iter_mut().find(|child| child.id() == id)
    }

    fn request_redraw(&mut self) {
        self.dirty = true;
    }

    fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
