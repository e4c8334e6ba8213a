//! Source-side scene model.
//!
//! The exporter never talks to an engine directly; the caller supplies a
//! [`SceneGraph`] (the transform hierarchy the meshes' bones live in) plus a
//! list of [`SourceMesh`] values referencing nodes in that graph. The graph
//! is an explicit adjacency list: parent links are resolved here rather than
//! by walking live engine objects, and ancestor chains are promised finite
//! and acyclic by the provider (the merge pass still checks defensively).

mod material;
mod mesh;

pub use material::{MaterialRecord, MaterialSource, SceneTexture};
pub use mesh::{SkinQuality, SourceMesh, SubMesh, VertexArrays, VertexWeights};

use glam::Vec3;

/// Index of a node within a [`SceneGraph`].
pub type NodeId = usize;

/// One transform in the scene hierarchy.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Node name. Bones are matched across meshes by this name.
    pub name: String,
    /// World-space position.
    pub position: Vec3,
    /// Parent node, `None` for scene roots.
    pub parent: Option<NodeId>,
}

/// The transform hierarchy all input meshes are bound to.
///
/// Nodes are append-only; a parent must be added before its children so a
/// `NodeId` always refers to an existing node.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its id.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        position: Vec3,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SceneNode {
            name: name.into(),
            position,
            parent,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id]
    }

    /// Re-parent an existing node.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.nodes[id].parent = parent;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate a node and its ancestors, starting at `id`, root last.
    pub fn ancestor_chain(&self, id: NodeId) -> AncestorChain<'_> {
        AncestorChain {
            graph: self,
            next: Some(id),
        }
    }
}

/// Iterator over a node and its ancestors (see [`SceneGraph::ancestor_chain`]).
pub struct AncestorChain<'a> {
    graph: &'a SceneGraph,
    next: Option<NodeId>,
}

impl<'a> Iterator for AncestorChain<'a> {
    type Item = (NodeId, &'a SceneNode);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.graph.node(id);
        self.next = node.parent;
        Some((id, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ancestor_chain_walks_to_root() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("Root", Vec3::ZERO, None);
        let spine = graph.add_node("Spine", Vec3::Y, Some(root));
        let arm = graph.add_node("Arm", Vec3::new(1.0, 2.0, 0.0), Some(spine));

        let names: Vec<&str> = graph
            .ancestor_chain(arm)
            .map(|(_, node)| node.name.as_str())
            .collect();
        assert_eq!(names, ["Arm", "Spine", "Root"]);
    }

    #[test]
    fn ancestor_chain_of_root_is_single_node() {
        let mut graph = SceneGraph::new();
        let root = graph.add_node("Root", Vec3::ZERO, None);
        assert_eq!(graph.ancestor_chain(root).count(), 1);
    }
}
