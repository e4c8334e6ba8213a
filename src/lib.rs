/// Error definitions
pub mod error;
/// The merge-and-convert export pipeline (skeleton merging, vertex/index
/// accumulation, material extraction, texture export).
pub mod export;
/// PMX document model: bones, vertices, materials, header size classes.
pub mod pmx;
/// Source-side scene model: node hierarchy, skinned meshes, materials.
pub mod scene;
