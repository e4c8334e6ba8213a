//! Texture export with per-run deduplication.
//!
//! Several materials routinely reference the same texture object; the file
//! only needs to be written once per export run. [`TextureBuilder`] owns the
//! run-scoped set of exported file names (first write wins) and delegates the
//! actual pixel encoding to a [`TextureSink`]. A write failure skips that
//! texture and the export continues.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::scene::{MaterialSource, SceneTexture};

/// Persists texture pixels to disk. The default implementation encodes PNG;
/// callers can substitute their own encoder or a no-op sink.
pub trait TextureSink {
    fn write(&self, path: &Path, texture: &SceneTexture) -> io::Result<()>;
}

/// A sink that writes nothing. Useful when only the model file is wanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTextureSink;

impl TextureSink for NullTextureSink {
    fn write(&self, _path: &Path, _texture: &SceneTexture) -> io::Result<()> {
        Ok(())
    }
}

/// Run-scoped texture exporter. Create one per export run; reusing an
/// instance across runs would leak skipped writes between them.
pub struct TextureBuilder<'a> {
    sink: &'a dyn TextureSink,
    exported: HashSet<String>,
}

impl<'a> TextureBuilder<'a> {
    pub fn new(sink: &'a dyn TextureSink) -> Self {
        Self {
            sink,
            exported: HashSet::new(),
        }
    }

    /// Export the texture in `material`'s `property` slot, if set.
    ///
    /// Returns the file name (without folder) the texture resolves to, or
    /// `None` when the slot is empty. Safe to call for absent slots.
    pub fn export(
        &mut self,
        folder: &Path,
        material: &dyn MaterialSource,
        property: &str,
    ) -> Option<String> {
        let texture = material.texture(property)?;
        Some(self.export_texture(folder, material, property, texture))
    }

    /// Export a texture already resolved from `material`'s `property` slot.
    pub fn export_texture(
        &mut self,
        folder: &Path,
        material: &dyn MaterialSource,
        property: &str,
        texture: &SceneTexture,
    ) -> String {
        let file_name = texture_file_name(material, property, texture);
        if self.exported.insert(file_name.clone()) {
            let path = folder.join(&file_name);
            match self.sink.write(&path, texture) {
                Ok(()) => debug!("texture written to file: {}", path.display()),
                Err(err) => warn!("error writing texture to file {}: {err}", path.display()),
            }
        }
        file_name
    }
}

/// Resolve the output file name for a texture.
///
/// Unnamed textures and render-target textures (names carrying `:`) fall
/// back to the material name — with `Instance` replaced by the material's
/// instance id so clones stay distinct — plus the property name.
fn texture_file_name(
    material: &dyn MaterialSource,
    property: &str,
    texture: &SceneTexture,
) -> String {
    if texture.name.is_empty() || texture.name.contains(':') {
        let stem = material
            .name()
            .replace("Instance", &material.instance_id().to_string());
        format!("{stem}{property}.png")
    } else {
        format!("{}.png", texture.name)
    }
}

/// PNG-encoding sink backed by the `image` crate.
///
/// Source render pipelines sometimes hand over textures whose alpha channel
/// is effectively unused and reads fully transparent; when more than 90% of
/// pixels are transparent the alpha channel is forced opaque before
/// encoding, matching the behavior PMX consumers expect.
#[cfg(feature = "png")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PngTextureSink;

#[cfg(feature = "png")]
impl TextureSink for PngTextureSink {
    fn write(&self, path: &Path, texture: &SceneTexture) -> io::Result<()> {
        let mut rgba = texture.rgba.clone();
        normalize_alpha(&mut rgba);
        let image = image::RgbaImage::from_raw(texture.width, texture.height, rgba)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "pixel buffer does not match texture dimensions",
                )
            })?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(io::Error::other)
    }
}

/// Force alpha opaque when over 90% of pixels are transparent.
#[cfg(feature = "png")]
fn normalize_alpha(rgba: &mut [u8]) {
    let pixel_count = rgba.len() / 4;
    if pixel_count == 0 {
        return;
    }
    let transparent = rgba.chunks_exact(4).filter(|px| px[3] < 3).count();
    if transparent * 10 > pixel_count * 9 {
        for px in rgba.chunks_exact_mut(4) {
            px[3] = 0xFF;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;
    use crate::scene::MaterialRecord;

    /// Records write calls instead of touching the filesystem.
    #[derive(Default)]
    struct RecordingSink {
        writes: Mutex<Vec<String>>,
    }

    impl TextureSink for RecordingSink {
        fn write(&self, path: &Path, _texture: &SceneTexture) -> io::Result<()> {
            self.writes
                .lock()
                .unwrap()
                .push(path.file_name().unwrap().to_string_lossy().into_owned());
            Ok(())
        }
    }

    fn material_with(name: &str, key: &str, texture: Arc<SceneTexture>) -> MaterialRecord {
        MaterialRecord::new(name, "Toon/Lighted").with_texture(key, texture)
    }

    #[test]
    fn shared_texture_is_written_once() {
        let texture = Arc::new(SceneTexture::new("skin", 1, 1, vec![0; 4]));
        let a = material_with("Face", "_MainTex", Arc::clone(&texture));
        let b = material_with("Body", "_MainTex", Arc::clone(&texture));

        let sink = RecordingSink::default();
        let mut builder = TextureBuilder::new(&sink);
        let folder = Path::new("out");

        let name_a = builder.export(folder, &a, "_MainTex").unwrap();
        let name_b = builder.export(folder, &b, "_MainTex").unwrap();

        assert_eq!(name_a, "skin.png");
        assert_eq!(name_a, name_b);
        assert_eq!(sink.writes.lock().unwrap().len(), 1);
    }

    #[test]
    fn absent_slot_exports_nothing() {
        let material = MaterialRecord::new("Face", "Toon/Lighted");
        let sink = RecordingSink::default();
        let mut builder = TextureBuilder::new(&sink);
        assert!(builder.export(Path::new("out"), &material, "_ShadowTex").is_none());
        assert!(sink.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn render_target_names_fall_back_to_material_name() {
        let texture = Arc::new(SceneTexture::new("rt:face", 1, 1, vec![0; 4]));
        let mut material = material_with("Face Instance", "_MainTex", texture);
        material.instance_id = 4242;

        let sink = RecordingSink::default();
        let mut builder = TextureBuilder::new(&sink);
        let name = builder.export(Path::new("out"), &material, "_MainTex").unwrap();
        assert_eq!(name, "Face 4242_MainTex.png");
    }

    #[test]
    fn write_failure_is_not_fatal() {
        struct FailingSink;
        impl TextureSink for FailingSink {
            fn write(&self, _path: &Path, _texture: &SceneTexture) -> io::Result<()> {
                Err(io::Error::other("disk full"))
            }
        }

        let texture = Arc::new(SceneTexture::new("skin", 1, 1, vec![0; 4]));
        let material = material_with("Face", "_MainTex", texture);
        let mut builder = TextureBuilder::new(&FailingSink);
        // Still resolves a file name; the failed write is only logged.
        assert_eq!(
            builder.export(Path::new("out"), &material, "_MainTex"),
            Some("skin.png".to_string())
        );
    }

    #[cfg(feature = "png")]
    #[test]
    fn mostly_transparent_alpha_is_forced_opaque() {
        // 20 pixels, only one of them visible: 95% transparent.
        let mut rgba = vec![0u8; 80];
        rgba[3] = 0xFF;
        normalize_alpha(&mut rgba);
        assert!(rgba.chunks_exact(4).all(|px| px[3] == 0xFF));
    }

    #[cfg(feature = "png")]
    #[test]
    fn balanced_alpha_is_left_alone() {
        // Half transparent, half opaque: below the 90% threshold.
        let mut rgba = vec![0u8; 32];
        for px in rgba.chunks_exact_mut(4).take(4) {
            px[3] = 0xFF;
        }
        let before = rgba.clone();
        normalize_alpha(&mut rgba);
        assert_eq!(rgba, before);
    }

    #[cfg(feature = "png")]
    #[test]
    fn png_sink_writes_a_decodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skin.png");
        let texture = SceneTexture::new("skin", 2, 2, vec![0x80; 16]);
        PngTextureSink.write(&path, &texture).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 2));
    }

    #[cfg(feature = "png")]
    #[test]
    fn png_sink_rejects_mismatched_buffers() {
        let dir = tempfile::tempdir().unwrap();
        let texture = SceneTexture::new("bad", 4, 4, vec![0; 4]);
        assert!(PngTextureSink.write(&dir.path().join("bad.png"), &texture).is_err());
    }
}
