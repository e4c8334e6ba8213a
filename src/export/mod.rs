//! High-level model export API.
//!
//! [`PmxExporter`] drives the whole merge-and-convert pipeline: skeleton
//! merging, bone list construction, per-mesh vertex/index accumulation with
//! material extraction, and finally header assembly and the two output
//! writes (model bytes via the [`ModelEncoder`] collaborator, metadata JSON
//! next to it).
//!
//! # Quick start
//! ```no_run
//! use pmxmerge::export::{ExportOptions, ModelEncoder, PmxExporter};
//! use pmxmerge::export::texture::PngTextureSink;
//! use pmxmerge::scene::SceneGraph;
//! # struct Encoder;
//! # impl ModelEncoder for Encoder {
//! #     fn encode(&self, _: &pmxmerge::pmx::PmxModel) -> std::io::Result<Vec<u8>> { Ok(Vec::new()) }
//! # }
//! # fn main() -> Result<(), rootcause::Report<pmxmerge::error::ExportError>> {
//! # let scene = SceneGraph::new();
//! # let meshes = Vec::new();
//! let encoder = Encoder;
//! let sink = PngTextureSink;
//! let exporter = PmxExporter::new(&scene, &encoder, &sink)
//!     .with_options(ExportOptions::builder().bake_pose(false).build());
//! exporter.export(&meshes, "out/model".as_ref(), "maid")?;
//! # Ok(())
//! # }
//! ```

pub mod material;
pub mod mesh;
pub mod skeleton;
pub mod texture;
pub mod weights;

use std::fs;
use std::io;
use std::path::Path;

use bon::Builder;
use rootcause::Report;
use tracing::info;

use crate::error::ExportError;
use crate::pmx::{ModelInfo, PmxHeader, PmxModel};
use crate::scene::{SceneGraph, SourceMesh};

use material::MaterialExtractor;
use mesh::MeshMerger;
use texture::TextureSink;

/// Encodes an assembled [`PmxModel`] into the target binary layout.
pub trait ModelEncoder {
    fn encode(&self, model: &PmxModel) -> io::Result<Vec<u8>>;

    /// Extension (without the dot) for the emitted model file.
    fn file_extension(&self) -> &str {
        "pmx"
    }
}

/// Options controlling an export run.
#[derive(Builder, Debug, Clone)]
pub struct ExportOptions {
    /// Export meshes in their current pose (provider-baked) rather than the
    /// rest pose. Default: true.
    #[builder(default = true)]
    pub bake_pose: bool,
    /// Export the primary diffuse texture of each material. Default: true.
    #[builder(default = true)]
    pub export_textures: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            bake_pose: true,
            export_textures: true,
        }
    }
}

/// One configured exporter. Cheap to construct; every [`Self::export`] call
/// runs with fresh accumulation state, so a single exporter can serve
/// multiple runs without leaking texture dedup between them.
pub struct PmxExporter<'a> {
    scene: &'a SceneGraph,
    encoder: &'a dyn ModelEncoder,
    sink: &'a dyn TextureSink,
    options: ExportOptions,
    model_info: Option<ModelInfo>,
}

impl<'a> PmxExporter<'a> {
    pub fn new(
        scene: &'a SceneGraph,
        encoder: &'a dyn ModelEncoder,
        sink: &'a dyn TextureSink,
    ) -> Self {
        Self {
            scene,
            encoder,
            sink,
            options: ExportOptions::default(),
            model_info: None,
        }
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the model name/comment block. By default the model is named
    /// after the export base name.
    pub fn with_model_info(mut self, info: ModelInfo) -> Self {
        self.model_info = Some(info);
        self
    }

    /// Merge `meshes` and write `<base_name>.<ext>`, `<base_name>.json`,
    /// and any exported textures under `destination`.
    ///
    /// The destination directory is created if missing. Model and metadata
    /// write failures are fatal; individual texture write failures are
    /// logged and skipped.
    pub fn export(
        &self,
        meshes: &[SourceMesh],
        destination: &Path,
        base_name: &str,
    ) -> Result<(), Report<ExportError>> {
        fs::create_dir_all(destination).map_err(ExportError::from)?;

        let merged = skeleton::merge_skeletons(self.scene, meshes)?;
        let bones = skeleton::build_bone_list(&merged);

        let mut extractor = MaterialExtractor::new(
            self.sink,
            destination,
            self.options.export_textures,
        );
        let mut merger = MeshMerger::new();
        for mesh in meshes {
            merger.append_mesh(
                self.scene,
                &merged,
                mesh,
                &mut extractor,
                self.options.bake_pose,
            )?;
        }

        let (vertices, faces, materials) = merger.finish();
        let metadata = extractor.finish();

        // No morphs, no rigid bodies, no per-bone auxiliary links in this
        // converter; their size classes still have to be present.
        let header = PmxHeader::for_counts(vertices.len(), bones.len(), 0, materials.len(), 0);
        let info = self.model_info.clone().unwrap_or_else(|| ModelInfo {
            name: base_name.to_string(),
            name_en: base_name.to_string(),
            ..ModelInfo::default()
        });

        let model = PmxModel {
            info,
            header,
            bones,
            vertices,
            faces,
            materials,
        };

        let bytes = self.encoder.encode(&model).map_err(ExportError::from)?;
        let model_path =
            destination.join(format!("{base_name}.{}", self.encoder.file_extension()));
        fs::write(&model_path, bytes).map_err(ExportError::from)?;
        info!("model written to {}", model_path.display());

        let json = material::serialize_metadata(&metadata).map_err(ExportError::from)?;
        fs::write(destination.join(format!("{base_name}.json")), json)
            .map_err(ExportError::from)?;

        Ok(())
    }
}
