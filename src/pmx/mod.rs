//! PMX document model.
//!
//! The assembled output of a merge: bones, vertices, a material-partitioned
//! face list, and the header size classes. Writing these structures to the
//! binary PMX layout is the encoder collaborator's job (see
//! [`crate::export::ModelEncoder`]); this module only defines the document.

mod header;
mod space;

pub use header::{PMX_VERSION, PmxHeader, signed_index_size, unsigned_index_size};
pub use space::{SCALE_FACTOR, to_pmx_space};

use glam::{Vec2, Vec3, Vec4};

/// Model name/comment block, with the Japanese and English slots PMX carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub name_en: String,
    pub comment: String,
    pub comment_en: String,
}

/// Parent index sentinel for root bones.
pub const NO_PARENT: i32 = -1;

/// One bone record.
#[derive(Debug, Clone, PartialEq)]
pub struct PmxBone {
    pub name: String,
    pub name_en: String,
    /// Index of the parent bone, or [`NO_PARENT`].
    pub parent: i32,
    /// World position, already in PMX space.
    pub position: Vec3,
}

/// One bone influence on a vertex, with a merged-skeleton bone index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneWeight {
    pub bone: i32,
    pub weight: f32,
}

/// One merged vertex. Built once during the merge and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PmxVertex {
    pub uv: Vec2,
    /// Normal in PMX space.
    pub normal: Vec3,
    /// Position in PMX space, scaled by [`SCALE_FACTOR`].
    pub position: Vec3,
    /// Exactly 1, 2, or 4 entries, set by the source mesh's skin quality.
    pub weights: Vec<BoneWeight>,
}

/// Material rendering flag bits, matching the PMX flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialFlags(pub u8);

impl MaterialFlags {
    /// Disable back-face culling.
    pub const DRAW_BOTH: MaterialFlags = MaterialFlags(0x01);
    /// Cast a ground shadow.
    pub const GROUND_SHADOW: MaterialFlags = MaterialFlags(0x02);
    /// Write into the self-shadow map.
    pub const SELF_SHADOW_MAP: MaterialFlags = MaterialFlags(0x04);
    /// Receive self shadowing.
    pub const SELF_SHADOW: MaterialFlags = MaterialFlags(0x08);
    /// Draw edge outline.
    pub const EDGE: MaterialFlags = MaterialFlags(0x10);

    pub fn contains(self, other: MaterialFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for MaterialFlags {
    type Output = MaterialFlags;

    fn bitor(self, rhs: MaterialFlags) -> MaterialFlags {
        MaterialFlags(self.0 | rhs.0)
    }
}

/// One material descriptor, owning a contiguous run of the face list.
#[derive(Debug, Clone, PartialEq)]
pub struct PmxMaterial {
    pub name: String,
    pub name_en: String,
    pub flags: MaterialFlags,
    pub diffuse: Vec4,
    /// Exported diffuse texture file name, if any.
    pub texture: Option<String>,
    /// Exported toon ramp file name, if any.
    pub toon: Option<String>,
    /// Number of triangle indices (3 per face) in this material's run.
    pub face_count: u32,
}

impl Default for PmxMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            name_en: String::new(),
            flags: MaterialFlags::default(),
            // Opaque white rather than the format's zero vector; a zero
            // diffuse renders black in every PMX consumer.
            diffuse: Vec4::new(1.0, 1.0, 1.0, 1.0),
            texture: None,
            toon: None,
            face_count: 0,
        }
    }
}

/// The assembled model document.
#[derive(Debug, Clone, Default)]
pub struct PmxModel {
    pub info: ModelInfo,
    pub header: PmxHeader,
    pub bones: Vec<PmxBone>,
    pub vertices: Vec<PmxVertex>,
    /// Global triangle index list, partitioned into per-material runs in
    /// material order.
    pub faces: Vec<u32>,
    pub materials: Vec<PmxMaterial>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_set_operations() {
        let flags = MaterialFlags::DRAW_BOTH
            | MaterialFlags::GROUND_SHADOW
            | MaterialFlags::SELF_SHADOW;
        assert!(flags.contains(MaterialFlags::DRAW_BOTH));
        assert!(flags.contains(MaterialFlags::GROUND_SHADOW | MaterialFlags::SELF_SHADOW));
        assert!(!flags.contains(MaterialFlags::EDGE));
    }

    #[test]
    fn default_material_is_opaque_white() {
        let material = PmxMaterial::default();
        assert_eq!(material.diffuse, Vec4::new(1.0, 1.0, 1.0, 1.0));
        assert!(material.texture.is_none());
    }
}
