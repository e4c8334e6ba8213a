//! Skinned mesh input records.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};

use super::NodeId;
use super::material::MaterialSource;

/// How many bone influences a mesh's weights carry.
///
/// This is a mesh-global setting: a tier-2 mesh has valid data in weight
/// slots 0–1 only, a tier-4 mesh in all four slots. There is no per-vertex
/// tier and no 3-influence form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkinQuality {
    One,
    Two,
    Four,
}

impl SkinQuality {
    /// Number of weight slots valid at this tier.
    pub fn influences(self) -> usize {
        match self {
            SkinQuality::One => 1,
            SkinQuality::Two => 2,
            SkinQuality::Four => 4,
        }
    }
}

/// Per-vertex bone influences, indices local to the owning mesh's bone table.
///
/// Slots beyond the mesh's [`SkinQuality`] tier are ignored on export.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexWeights {
    pub bones: [usize; 4],
    pub weights: [f32; 4],
}

impl VertexWeights {
    /// A vertex rigidly bound to a single bone.
    pub fn single(bone: usize) -> Self {
        Self {
            bones: [bone, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// Parallel per-vertex attribute arrays.
#[derive(Debug, Clone, Default)]
pub struct VertexArrays {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
}

impl VertexArrays {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// True when all attribute arrays have the same length.
    pub fn is_lockstep(&self) -> bool {
        self.normals.len() == self.positions.len() && self.uvs.len() == self.positions.len()
    }
}

/// One triangle run bound to a single material.
#[derive(Clone)]
pub struct SubMesh {
    /// Triangle index list (3 entries per face), indices local to the mesh.
    pub triangles: Vec<u32>,
    pub material: Arc<dyn MaterialSource>,
}

impl std::fmt::Debug for SubMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubMesh")
            .field("triangles", &self.triangles.len())
            .field("material", &self.material.name())
            .finish()
    }
}

/// A skinned mesh as read from the source scene.
///
/// `bones` and `bind_poses` are parallel; `weights` is parallel to the
/// vertex arrays in `rest`. When pose baking is requested the provider
/// supplies `posed` with skin deformation already resolved — the exporter
/// never evaluates skinning itself.
#[derive(Debug, Clone)]
pub struct SourceMesh {
    /// Renderer/object name. Bones with this name are not part of the skeleton.
    pub name: String,
    /// Mesh asset name (may differ from the object name); same exclusion rule.
    pub asset_name: String,
    /// Object local-to-world transform. Expected rigid (no scale/shear).
    pub transform: Mat4,
    /// Bones this mesh is skinned to, as scene graph nodes.
    pub bones: Vec<NodeId>,
    /// Bind pose per bone, parallel to `bones`.
    pub bind_poses: Vec<Mat4>,
    /// Influence tier for `weights`.
    pub quality: SkinQuality,
    /// Per-vertex influences, parallel to the `rest` arrays.
    pub weights: Vec<VertexWeights>,
    /// Rest-pose vertex arrays.
    pub rest: VertexArrays,
    /// Current-pose vertex arrays, if the provider baked them.
    pub posed: Option<VertexArrays>,
    pub submeshes: Vec<SubMesh>,
}

impl SourceMesh {
    /// Vertex arrays to export: the posed bake when requested and present,
    /// otherwise the rest pose.
    pub fn arrays(&self, bake_pose: bool) -> &VertexArrays {
        match (&self.posed, bake_pose) {
            (Some(posed), true) => posed,
            _ => &self.rest,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.rest.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skin_quality_influence_counts() {
        assert_eq!(SkinQuality::One.influences(), 1);
        assert_eq!(SkinQuality::Two.influences(), 2);
        assert_eq!(SkinQuality::Four.influences(), 4);
    }

    #[test]
    fn lockstep_detects_mismatched_arrays() {
        let arrays = VertexArrays {
            positions: vec![Vec3::ZERO, Vec3::ONE],
            normals: vec![Vec3::Y, Vec3::Y],
            uvs: vec![Vec2::ZERO],
        };
        assert!(!arrays.is_lockstep());
    }
}
