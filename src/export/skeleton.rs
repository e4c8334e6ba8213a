//! Skeleton merging across input meshes.
//!
//! Meshes arrive with independent, partially overlapping bone lists: one mesh
//! may declare a bone another mesh only reaches as an ancestor, and two
//! meshes may disagree about a bone's parent. The merge runs in two passes
//! over the inputs (in input order) so that every bone is known before any
//! parent edge is resolved:
//!
//! - **Pass A** walks each declared bone's ancestor chain and registers every
//!   eligible bone, assigning global indices in first-seen order.
//! - **Pass B** resolves parent edges for declared bones. The first
//!   assignment wins; later meshes that disagree are logged, never fatal.

use std::collections::{HashMap, HashSet};

use glam::{Mat4, Vec3};
use rootcause::Report;
use tracing::{debug, warn};

use crate::error::ExportError;
use crate::pmx::{self, PmxBone};
use crate::scene::{SceneGraph, SourceMesh};

/// Bone names with this prefix are engine-internal transforms, excluded from
/// the skeleton entirely.
pub const RESERVED_BONE_PREFIX: &str = "_SM_";

/// The deduplicated skeleton produced by [`merge_skeletons`].
///
/// Global bone indices are assigned in registration order; parallel arrays
/// hold each bone's parent (−1 for roots), bind pose, and a world-position
/// snapshot taken at registration.
#[derive(Debug, Clone)]
pub struct MergedSkeleton {
    names: Vec<String>,
    index_by_name: HashMap<String, usize>,
    parents: Vec<i32>,
    bind_poses: Vec<Option<Mat4>>,
    positions: Vec<Vec3>,
}

impl MergedSkeleton {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// Parent global index, or [`pmx::NO_PARENT`].
    pub fn parent(&self, index: usize) -> i32 {
        self.parents[index]
    }

    /// Bind pose from the first mesh that declared this bone directly.
    ///
    /// Bones only ever reached as ancestors have no declared bind pose and
    /// report identity.
    pub fn bind_pose(&self, index: usize) -> Mat4 {
        self.bind_poses[index].unwrap_or(Mat4::IDENTITY)
    }

    /// World position captured when the bone was registered.
    pub fn position(&self, index: usize) -> Vec3 {
        self.positions[index]
    }
}

/// Accumulates bone registrations during one merge pass; discarded once the
/// merge completes.
#[derive(Default)]
struct SkeletonBuilder {
    names: Vec<String>,
    index_by_name: HashMap<String, usize>,
    parents: Vec<i32>,
    bind_poses: Vec<Option<Mat4>>,
    positions: Vec<Vec3>,
}

impl SkeletonBuilder {
    fn lookup(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    fn register(&mut self, name: &str, position: Vec3) -> usize {
        let index = self.names.len();
        self.names.push(name.to_string());
        self.index_by_name.insert(name.to_string(), index);
        self.parents.push(pmx::NO_PARENT);
        self.bind_poses.push(None);
        self.positions.push(position);
        index
    }

    fn finish(self) -> MergedSkeleton {
        MergedSkeleton {
            names: self.names,
            index_by_name: self.index_by_name,
            parents: self.parents,
            bind_poses: self.bind_poses,
            positions: self.positions,
        }
    }
}

/// True when `name` is not a skeleton bone from `mesh`'s point of view: the
/// mesh's own object or asset name, the reserved prefix, or unnamed.
fn excluded(name: &str, mesh: &SourceMesh) -> bool {
    name.is_empty()
        || name == mesh.name
        || name == mesh.asset_name
        || name.starts_with(RESERVED_BONE_PREFIX)
}

/// Merge the bone sets of all input meshes into one skeleton.
pub fn merge_skeletons(
    scene: &SceneGraph,
    meshes: &[SourceMesh],
) -> Result<MergedSkeleton, Report<ExportError>> {
    let mut builder = SkeletonBuilder::default();

    // Pass A: register every eligible bone reachable from a declared bone.
    for mesh in meshes {
        if mesh.bones.len() != mesh.bind_poses.len() {
            return Err(Report::new(ExportError::MalformedMesh {
                mesh: mesh.name.clone(),
                detail: format!(
                    "{} bones but {} bind poses",
                    mesh.bones.len(),
                    mesh.bind_poses.len()
                ),
            }));
        }

        debug!("processing bones of {}", mesh.name);

        for (declared, &bone_id) in mesh.bones.iter().enumerate() {
            // The provider promises acyclic chains; verify anyway rather
            // than walk forever on malformed input.
            let mut visited = HashSet::new();
            for (depth, (node_id, node)) in scene.ancestor_chain(bone_id).enumerate() {
                if !visited.insert(node_id) {
                    return Err(Report::new(ExportError::CyclicHierarchy {
                        node: node.name.clone(),
                    }));
                }
                if excluded(&node.name, mesh) {
                    continue;
                }
                let index = match builder.lookup(&node.name) {
                    Some(index) => index,
                    None => builder.register(&node.name, node.position),
                };
                // Bind poses come from direct declarations only, first mesh
                // to declare the bone wins. Ancestors reached by walking
                // keep their identity default.
                if depth == 0 && builder.bind_poses[index].is_none() {
                    builder.bind_poses[index] = Some(mesh.bind_poses[declared]);
                }
            }
        }
    }

    // Pass B: resolve parent edges for declared bones.
    for mesh in meshes {
        debug!("mapping bone parents of {}", mesh.name);

        for &bone_id in &mesh.bones {
            let node = scene.node(bone_id);
            let Some(index) = builder.lookup(&node.name) else {
                continue;
            };

            let parent = node.parent.map(|id| scene.node(id));
            let parent_name = match parent {
                Some(parent)
                    if !parent.name.is_empty()
                        && !parent.name.starts_with(RESERVED_BONE_PREFIX) =>
                {
                    &parent.name
                }
                _ => {
                    debug!("bone {} has no parent", node.name);
                    continue;
                }
            };

            match builder.lookup(parent_name) {
                Some(parent_index) => {
                    if builder.parents[index] == pmx::NO_PARENT {
                        debug!("bone {} parented to {parent_name}({parent_index})", node.name);
                        builder.parents[index] = parent_index as i32;
                    } else if builder.parents[index] != parent_index as i32 {
                        warn!(
                            "bone {} was parented to {} but was also found parented to {parent_name}",
                            node.name,
                            builder.names[builder.parents[index] as usize],
                        );
                    }
                }
                None => {
                    warn!(
                        "bone {} parented to {parent_name} but bone parent index not found",
                        node.name
                    );
                }
            }
        }
    }

    debug!(
        "bone count: {} bindpose count: {}",
        builder.names.len(),
        builder.bind_poses.len()
    );

    Ok(builder.finish())
}

/// Translate the merged skeleton into PMX bone records, ascending global
/// index order.
pub fn build_bone_list(skeleton: &MergedSkeleton) -> Vec<PmxBone> {
    (0..skeleton.len())
        .map(|index| PmxBone {
            name: skeleton.name(index).to_string(),
            name_en: skeleton.name(index).to_string(),
            parent: skeleton.parent(index),
            position: pmx::to_pmx_space(skeleton.position(index) * pmx::SCALE_FACTOR),
        })
        .collect()
}
