//! Per-vertex bone-weight remapping.
//!
//! Source weights index into the owning mesh's local bone table; the merged
//! model needs global skeleton indices and a fixed influence count per the
//! mesh's skin quality tier. Weights are passed through unnormalized — the
//! source authored them against the same tier, and the original exporter
//! never renormalized either.

use crate::error::ExportError;
use crate::export::skeleton::MergedSkeleton;
use crate::pmx::BoneWeight;
use crate::scene::{SceneGraph, SourceMesh, VertexWeights};

/// Remap one vertex's influences to merged-skeleton indices.
///
/// The result has exactly `mesh.quality.influences()` entries: slot 0 is
/// always populated, slot 1 at tier 2, and slots 2–3 together at tier 4.
/// Fails when a local bone index is outside the mesh's bone table, or when
/// the referenced bone was excluded from the merged skeleton.
pub fn remap_weights(
    scene: &SceneGraph,
    skeleton: &MergedSkeleton,
    mesh: &SourceMesh,
    record: &VertexWeights,
) -> Result<Vec<BoneWeight>, ExportError> {
    let slots = mesh.quality.influences();
    let mut weights = Vec::with_capacity(slots);

    for slot in 0..slots {
        let local = record.bones[slot];
        let node_id = *mesh
            .bones
            .get(local)
            .ok_or_else(|| ExportError::BoneIndexOutOfRange {
                mesh: mesh.name.clone(),
                index: local,
                count: mesh.bones.len(),
            })?;
        let name = &scene.node(node_id).name;
        let bone = skeleton
            .lookup(name)
            .ok_or_else(|| ExportError::UnknownBoneReference {
                mesh: mesh.name.clone(),
                bone: name.clone(),
            })?;
        weights.push(BoneWeight {
            bone: bone as i32,
            weight: record.weights[slot],
        });
    }

    Ok(weights)
}

#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use super::*;
    use crate::export::skeleton::merge_skeletons;
    use crate::scene::{NodeId, SkinQuality, VertexArrays};

    fn fixture(quality: SkinQuality) -> (SceneGraph, MergedSkeleton, SourceMesh) {
        let mut scene = SceneGraph::new();
        let root = scene.add_node("Root", Vec3::ZERO, None);
        let spine = scene.add_node("Spine", Vec3::Y, Some(root));
        let arm = scene.add_node("Arm", Vec3::X, Some(spine));
        let hand = scene.add_node("Hand", Vec3::new(2.0, 0.0, 0.0), Some(arm));

        let bones: Vec<NodeId> = vec![root, spine, arm, hand];
        let mesh = SourceMesh {
            name: "body".to_string(),
            asset_name: "body_mesh".to_string(),
            transform: Mat4::IDENTITY,
            bind_poses: vec![Mat4::IDENTITY; bones.len()],
            bones,
            quality,
            weights: Vec::new(),
            rest: VertexArrays::default(),
            posed: None,
            submeshes: Vec::new(),
        };
        let skeleton = merge_skeletons(&scene, std::slice::from_ref(&mesh)).unwrap();
        (scene, skeleton, mesh)
    }

    #[test]
    fn tier_one_keeps_only_the_primary_influence() {
        let (scene, skeleton, mesh) = fixture(SkinQuality::One);
        let record = VertexWeights {
            bones: [2, 1, 0, 3],
            weights: [1.0, 0.4, 0.3, 0.2],
        };
        let weights = remap_weights(&scene, &skeleton, &mesh, &record).unwrap();
        assert_eq!(weights, vec![BoneWeight { bone: 2, weight: 1.0 }]);
    }

    #[test]
    fn tier_four_populates_all_slots() {
        let (scene, skeleton, mesh) = fixture(SkinQuality::Four);
        let record = VertexWeights {
            bones: [0, 1, 2, 3],
            weights: [0.4, 0.3, 0.2, 0.1],
        };
        let weights = remap_weights(&scene, &skeleton, &mesh, &record).unwrap();
        assert_eq!(weights.len(), 4);
        assert_eq!(weights[3], BoneWeight { bone: 3, weight: 0.1 });
    }

    #[test]
    fn weights_are_not_renormalized() {
        let (scene, skeleton, mesh) = fixture(SkinQuality::Two);
        let record = VertexWeights {
            bones: [0, 1, 0, 0],
            weights: [0.6, 0.2, 0.1, 0.1],
        };
        let weights = remap_weights(&scene, &skeleton, &mesh, &record).unwrap();
        let total: f32 = weights.iter().map(|w| w.weight).sum();
        assert!((total - 0.8).abs() < 1e-6);
    }

    #[test]
    fn excluded_bone_reference_is_fatal() {
        let (mut scene, skeleton, mut mesh) = fixture(SkinQuality::One);
        // A helper transform that the skeleton merge filtered out.
        let helper = scene.add_node("_SM_anchor", Vec3::ZERO, None);
        mesh.bones.push(helper);

        let record = VertexWeights::single(4);
        let err = remap_weights(&scene, &skeleton, &mesh, &record).unwrap_err();
        assert!(matches!(err, ExportError::UnknownBoneReference { .. }));
    }

    #[test]
    fn out_of_range_local_index_is_fatal() {
        let (scene, skeleton, mesh) = fixture(SkinQuality::One);
        let record = VertexWeights::single(99);
        let err = remap_weights(&scene, &skeleton, &mesh, &record).unwrap_err();
        assert!(matches!(err, ExportError::BoneIndexOutOfRange { index: 99, .. }));
    }
}
