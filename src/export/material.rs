//! Material extraction and the side-channel metadata document.
//!
//! Each submesh yields one material descriptor — materials are deliberately
//! not deduplicated, only their textures are (see
//! [`TextureBuilder`](super::texture::TextureBuilder)). Beyond the required
//! PMX fields, a fixed schema of optional shader properties is consulted
//! uniformly; whatever is found (or defaulted) lands in a metadata table
//! keyed by material name, serialized to JSON next to the model file so
//! downstream tools can reconstruct shading the PMX format cannot express.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::Vec4;
use serde::Serialize;
use tracing::debug;

use crate::pmx::{MaterialFlags, PmxMaterial};
use crate::scene::MaterialSource;

use super::texture::{TextureBuilder, TextureSink};

/// Numeric fields default to this when the source material lacks them.
pub const DEFAULT_FLOAT: f32 = -1.0;

/// How a schema entry is looked up on the source material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Vector,
    Texture,
}

/// One optional metadata field: output name, source property key, kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: &'static str,
    pub key: &'static str,
    pub kind: FieldKind,
}

const fn field(field: &'static str, key: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { field, key, kind }
}

/// The optional-field schema, consulted uniformly per material.
pub const OPTIONAL_FIELDS: &[FieldSpec] = &[
    field("shadowTex", "_ShadowTex", FieldKind::Texture),
    field("shadowColor", "_ShadowColor", FieldKind::Vector),
    field("shadowRateToon", "_ShadowRateToon", FieldKind::Texture),
    field("toonRamp", "_ToonRamp", FieldKind::Texture),
    field("shininess", "_Shininess", FieldKind::Float),
    field("rimColor", "_RimColor", FieldKind::Vector),
    field("rimPower", "_RimPower", FieldKind::Float),
    field("rimShift", "_RimShift", FieldKind::Float),
    field("hiTex", "_HiTex", FieldKind::Texture),
    field("hiRate", "_HiRate", FieldKind::Float),
    field("hiPow", "_HiPow", FieldKind::Float),
    field("outlineColor", "_OutlineColor", FieldKind::Vector),
    field("outlineTex", "_OutlineTex", FieldKind::Texture),
    field("outlineToonRamp", "_OutlineToonRamp", FieldKind::Texture),
    field("outlineWidth", "_OutlineWidth", FieldKind::Float),
    field("outlineWidthTex", "_OutlineWidthTex", FieldKind::Texture),
    field("zTest", "_ZTest", FieldKind::Float),
    field("zTest2", "_ZTest2", FieldKind::Float),
    field("zTest2Alpha", "_ZTest2Alpha", FieldKind::Float),
];

/// One metadata value: a number, a 4-vector, a texture file name / shader
/// name, or null for an absent vector/texture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Float(f32),
    Vector([f32; 4]),
    Text(String),
    Null,
}

/// Field table for one material.
pub type MaterialMetadata = BTreeMap<String, FieldValue>;

/// All materials' field tables, keyed by material name. A later material
/// with the same name overwrites the earlier entry.
pub type MetadataTable = BTreeMap<String, MaterialMetadata>;

/// Serialize the metadata table to pretty-printed JSON.
///
/// `BTreeMap` ordering keeps the output stable across runs.
pub fn serialize_metadata(table: &MetadataTable) -> serde_json::Result<String> {
    serde_json::to_string_pretty(table)
}

/// Builds one [`PmxMaterial`] per submesh and accumulates the metadata
/// table. Owns the run-scoped [`TextureBuilder`].
pub struct MaterialExtractor<'a> {
    textures: TextureBuilder<'a>,
    folder: PathBuf,
    export_textures: bool,
    metadata: MetadataTable,
}

impl<'a> MaterialExtractor<'a> {
    pub fn new(sink: &'a dyn TextureSink, folder: &Path, export_textures: bool) -> Self {
        Self {
            textures: TextureBuilder::new(sink),
            folder: folder.to_path_buf(),
            export_textures,
            metadata: MetadataTable::new(),
        }
    }

    /// Extract one material descriptor; `index_count` is the triangle-index
    /// count of the submesh this material is bound to.
    ///
    /// Property lookups cannot fail — an absent property is recorded with
    /// its default and the descriptor stays valid.
    pub fn extract(&mut self, material: &dyn MaterialSource, index_count: u32) -> PmxMaterial {
        let mut descriptor = PmxMaterial {
            name: material.name().to_string(),
            name_en: material.name().to_string(),
            flags: MaterialFlags::DRAW_BOTH
                | MaterialFlags::GROUND_SHADOW
                | MaterialFlags::SELF_SHADOW_MAP
                | MaterialFlags::SELF_SHADOW,
            face_count: index_count,
            ..PmxMaterial::default()
        };

        let mut meta = MaterialMetadata::new();
        meta.insert(
            "shader".to_string(),
            FieldValue::Text(material.shader_name().to_string()),
        );

        // Primary diffuse texture: the named slot, falling back to the
        // generic main-texture slot. Only this one honors the export flag.
        let mut main_tex = None;
        if material.has_property("_MainTex") {
            let texture = material
                .texture("_MainTex")
                .or_else(|| material.main_texture());
            if let (Some(texture), true) = (texture, self.export_textures) {
                debug!("generate material: {} {}", material.name(), texture.name);
                main_tex = Some(self.textures.export_texture(
                    &self.folder,
                    material,
                    "_MainTex",
                    texture,
                ));
            }
        }
        meta.insert(
            "mainTex".to_string(),
            main_tex
                .clone()
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Null),
        );
        descriptor.texture = main_tex;

        // Diffuse color; a separate opacity property overrides alpha.
        let color = material.vector("_Color");
        if let Some(color) = color {
            descriptor.diffuse = Vec4::from_array(color);
        }
        if let Some(opacity) = material.float("_Opacity") {
            descriptor.diffuse.w = opacity;
        }
        meta.insert(
            "color".to_string(),
            color.map(FieldValue::Vector).unwrap_or(FieldValue::Null),
        );

        for spec in OPTIONAL_FIELDS {
            let value = match spec.kind {
                FieldKind::Float => {
                    FieldValue::Float(material.float(spec.key).unwrap_or(DEFAULT_FLOAT))
                }
                FieldKind::Vector => material
                    .vector(spec.key)
                    .map(FieldValue::Vector)
                    .unwrap_or(FieldValue::Null),
                FieldKind::Texture => self
                    .textures
                    .export(&self.folder, material, spec.key)
                    .map(FieldValue::Text)
                    .unwrap_or(FieldValue::Null),
            };
            meta.insert(spec.field.to_string(), value);
        }

        // The toon ramp doubles as the PMX toon texture.
        if let Some(FieldValue::Text(name)) = meta.get("toonRamp") {
            descriptor.toon = Some(name.clone());
        }

        self.metadata
            .insert(material.name().to_string(), meta);

        descriptor
    }

    /// Consume the extractor, yielding the accumulated metadata table.
    pub fn finish(self) -> MetadataTable {
        self.metadata
    }
}
