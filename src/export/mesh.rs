//! Vertex and index buffer merging.
//!
//! Input meshes are appended in input order into one global vertex buffer
//! and one global index buffer. Submesh index runs are rebased by the
//! running vertex offset and stay contiguous, one material descriptor per
//! run. Triangle winding is carried through untouched; the axis flip in
//! [`crate::pmx::to_pmx_space`] reverses apparent winding, and PMX
//! consumers cull accordingly.

use glam::Vec2;
use itertools::izip;
use rootcause::Report;
use tracing::warn;

use crate::error::ExportError;
use crate::pmx::{self, PmxMaterial, PmxVertex};
use crate::scene::{SceneGraph, SourceMesh};

use super::material::MaterialExtractor;
use super::skeleton::MergedSkeleton;
use super::weights::remap_weights;

/// Accumulates the merged buffers for one export run.
#[derive(Default)]
pub struct MeshMerger {
    vertices: Vec<PmxVertex>,
    faces: Vec<u32>,
    materials: Vec<PmxMaterial>,
    vertex_offset: usize,
}

impl MeshMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one mesh: submesh index runs (rebased), one material per
    /// submesh, then the mesh's vertices.
    pub fn append_mesh(
        &mut self,
        scene: &SceneGraph,
        skeleton: &MergedSkeleton,
        mesh: &SourceMesh,
        materials: &mut MaterialExtractor<'_>,
        bake_pose: bool,
    ) -> Result<(), Report<ExportError>> {
        if bake_pose && mesh.posed.is_none() {
            warn!("mesh {} has no posed arrays, exporting rest pose", mesh.name);
        }
        let arrays = mesh.arrays(bake_pose);

        if !arrays.is_lockstep() {
            return Err(Report::new(ExportError::MalformedMesh {
                mesh: mesh.name.clone(),
                detail: format!(
                    "vertex arrays out of lockstep ({} positions, {} normals, {} uvs)",
                    arrays.positions.len(),
                    arrays.normals.len(),
                    arrays.uvs.len()
                ),
            }));
        }
        if mesh.weights.len() != arrays.len() {
            return Err(Report::new(ExportError::MalformedMesh {
                mesh: mesh.name.clone(),
                detail: format!(
                    "{} weight records for {} vertices",
                    mesh.weights.len(),
                    arrays.len()
                ),
            }));
        }

        for submesh in &mesh.submeshes {
            let offset = self.vertex_offset as u32;
            self.faces
                .extend(submesh.triangles.iter().map(|&index| index + offset));
            let descriptor =
                materials.extract(submesh.material.as_ref(), submesh.triangles.len() as u32);
            self.materials.push(descriptor);
        }

        self.vertex_offset += arrays.len();

        for (position, normal, uv, record) in izip!(
            &arrays.positions,
            &arrays.normals,
            &arrays.uvs,
            &mesh.weights
        ) {
            let weights = remap_weights(scene, skeleton, mesh, record)?;
            let normal = mesh.transform.transform_vector3(*normal);
            let position =
                mesh.transform.transform_point3(*position) * pmx::SCALE_FACTOR;
            self.vertices.push(PmxVertex {
                uv: Vec2::new(uv.x, -uv.y),
                normal: pmx::to_pmx_space(normal),
                position: pmx::to_pmx_space(position),
                weights,
            });
        }

        Ok(())
    }

    /// Total vertices appended so far.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn finish(self) -> (Vec<PmxVertex>, Vec<u32>, Vec<PmxMaterial>) {
        (self.vertices, self.faces, self.materials)
    }
}
