//! Scene nodes produced by the loaders and the normalizer.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::geometry::{Aabb, BoundingSphere, Mesh};
use crate::material::Material;

/// Identity of a node inside the object container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        NodeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a loader hands back, decided by the file format.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedGeometry {
    /// Bare triangles that still need centering, scaling and a material
    Raw(Mesh),
    /// A fully assembled node that is used as-is
    Prebuilt(SceneNode),
}

/// One coloured piece of a prebuilt node
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub mesh: Mesh,
    pub material: Material,
}

/// A pre-assembled group of parts, e.g. the shapes of a VRML world.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: Option<String>,
    pub parts: Vec<Part>,
}

impl SceneNode {
    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.mesh.triangles.len()).sum()
    }
}

/// A normalized single mesh: centred on the origin and uniformly scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub mesh: Mesh,
    pub bounds: Aabb,
    pub sphere: BoundingSphere,
    pub scale: f32,
    pub material: Option<Material>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Mesh(MeshNode),
    Group(SceneNode),
}

/// A node ready to be attached to the object container.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    id: NodeId,
    kind: NodeKind,
}

impl Renderable {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            id: NodeId::next(),
            kind,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    pub fn as_mesh(&self) -> Option<&MeshNode> {
        match &self.kind {
            NodeKind::Mesh(node) => Some(node),
            NodeKind::Group(_) => None,
        }
    }

    pub fn as_mesh_mut(&mut self) -> Option<&mut MeshNode> {
        match &mut self.kind {
            NodeKind::Mesh(node) => Some(node),
            NodeKind::Group(_) => None,
        }
    }

    /// Uniform scale applied when drawing; groups are drawn unscaled.
    pub fn scale(&self) -> f32 {
        self.as_mesh().map_or(1.0, |node| node.scale)
    }

    pub fn material(&self) -> Option<&Material> {
        self.as_mesh().and_then(|node| node.material.as_ref())
    }

    /// Groups carry per-part materials and ignore this.
    pub fn set_material(&mut self, material: Material) {
        if let Some(node) = self.as_mesh_mut() {
            node.material = Some(material);
        }
    }

    /// Every drawable piece with the material it should be drawn with
    pub fn parts(&self) -> Vec<(&Mesh, &Material)> {
        match &self.kind {
            NodeKind::Mesh(node) => vec![(&node.mesh, crate::normalize::material_or_fallback(self))],
            NodeKind::Group(group) => group.parts.iter().map(|p| (&p.mesh, &p.material)).collect(),
        }
    }
}
