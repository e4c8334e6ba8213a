use thiserror::Error;

/// Errors that abort an export.
///
/// Parent conflicts between meshes and per-texture write failures are not
/// represented here: both are logged and the export continues (first-seen
/// parent wins, the texture is skipped). A material lacking a property is
/// data, not an error.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("vertex in mesh \"{mesh}\" references bone \"{bone}\" which is not in the merged skeleton")]
    UnknownBoneReference { mesh: String, bone: String },
    #[error("bone index {index} out of range for mesh \"{mesh}\" ({count} bones declared)")]
    BoneIndexOutOfRange {
        mesh: String,
        index: usize,
        count: usize,
    },
    #[error("cyclic parent chain detected at node \"{node}\"")]
    CyclicHierarchy { node: String },
    #[error("malformed mesh \"{mesh}\": {detail}")]
    MalformedMesh { mesh: String, detail: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize material metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}
