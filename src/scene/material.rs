//! Material capability and the hash-map-backed record implementation.

use std::collections::HashMap;
use std::sync::Arc;

/// An RGBA8 texture as handed over by the scene provider.
///
/// The exporter only inspects `name` (for file naming and deduplication);
/// pixel data is passed through to the texture sink untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl SceneTexture {
    pub fn new(name: impl Into<String>, width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            rgba,
        }
    }
}

/// Read-only view of a source material's properties.
///
/// Property keys follow the source engine's shader-property convention
/// (`_MainTex`, `_Color`, `_Shininess`, ...). A missing property is ordinary
/// data: accessors return `None` and the extractor substitutes defaults.
pub trait MaterialSource {
    /// Material name, used for display, metadata keying, and texture
    /// file-name fallbacks.
    fn name(&self) -> &str;
    /// Name of the shader the material was authored against.
    fn shader_name(&self) -> &str;
    /// Engine-side instance id, used to disambiguate unnamed materials when
    /// naming texture files.
    fn instance_id(&self) -> i32;
    fn has_property(&self, key: &str) -> bool;
    fn float(&self, key: &str) -> Option<f32>;
    fn vector(&self, key: &str) -> Option<[f32; 4]>;
    fn texture(&self, key: &str) -> Option<&SceneTexture>;
    /// The engine's generic main-texture slot, consulted when `_MainTex`
    /// is declared but unset.
    fn main_texture(&self) -> Option<&SceneTexture>;
}

/// Plain data implementation of [`MaterialSource`].
///
/// Textures are held behind `Arc` so several materials can reference the
/// same texture object, which is what makes texture-export deduplication
/// observable.
#[derive(Debug, Clone, Default)]
pub struct MaterialRecord {
    pub name: String,
    pub shader: String,
    pub instance_id: i32,
    pub floats: HashMap<String, f32>,
    pub vectors: HashMap<String, [f32; 4]>,
    pub textures: HashMap<String, Arc<SceneTexture>>,
    pub main_texture: Option<Arc<SceneTexture>>,
}

impl MaterialRecord {
    pub fn new(name: impl Into<String>, shader: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader: shader.into(),
            ..Default::default()
        }
    }

    pub fn with_float(mut self, key: impl Into<String>, value: f32) -> Self {
        self.floats.insert(key.into(), value);
        self
    }

    pub fn with_vector(mut self, key: impl Into<String>, value: [f32; 4]) -> Self {
        self.vectors.insert(key.into(), value);
        self
    }

    pub fn with_texture(mut self, key: impl Into<String>, texture: Arc<SceneTexture>) -> Self {
        self.textures.insert(key.into(), texture);
        self
    }
}

impl MaterialSource for MaterialRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn shader_name(&self) -> &str {
        &self.shader
    }

    fn instance_id(&self) -> i32 {
        self.instance_id
    }

    fn has_property(&self, key: &str) -> bool {
        self.floats.contains_key(key)
            || self.vectors.contains_key(key)
            || self.textures.contains_key(key)
    }

    fn float(&self, key: &str) -> Option<f32> {
        self.floats.get(key).copied()
    }

    fn vector(&self, key: &str) -> Option<[f32; 4]> {
        self.vectors.get(key).copied()
    }

    fn texture(&self, key: &str) -> Option<&SceneTexture> {
        self.textures.get(key).map(|tex| tex.as_ref())
    }

    fn main_texture(&self) -> Option<&SceneTexture> {
        self.main_texture.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_reports_properties_across_kinds() {
        let tex = Arc::new(SceneTexture::new("skin", 2, 2, vec![0; 16]));
        let material = MaterialRecord::new("Face", "Toon/Lighted")
            .with_float("_Shininess", 0.5)
            .with_vector("_Color", [1.0, 0.5, 0.25, 1.0])
            .with_texture("_MainTex", tex);

        assert!(material.has_property("_Shininess"));
        assert!(material.has_property("_Color"));
        assert!(material.has_property("_MainTex"));
        assert!(!material.has_property("_OutlineWidth"));

        assert_eq!(material.float("_Shininess"), Some(0.5));
        assert_eq!(material.vector("_Color"), Some([1.0, 0.5, 0.25, 1.0]));
        assert_eq!(material.texture("_MainTex").map(|t| t.name.as_str()), Some("skin"));
        assert!(material.float("_RimPower").is_none());
    }
}
