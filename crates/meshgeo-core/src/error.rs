//! Error handling for mesh conversion.
//!
//! Only input problems surface as [`GeoError`]. Recoverable configuration
//! problems (missing materials, unresolved properties) are logged and replaced
//! with defaults, and broken internal invariants panic.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeoError>;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("mesh has no vertices")]
    EmptyMesh,
    #[error("index buffer of length {index_count} is not a list of triangles")]
    NotTriangulated { index_count: usize },
    #[error("corner {corner} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        corner: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("{channel} has {actual} elements, expected {expected}")]
    ChannelLength {
        channel: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("non-finite value in {channel} at element {element}")]
    NonFinite {
        channel: &'static str,
        element: usize,
    },
    #[error("sub-mesh {sub_mesh}: {message}")]
    SubMeshLayout { sub_mesh: usize, message: String },
    #[error("sub-meshes cover {actual} triangles, mesh has {expected}")]
    SubMeshTotal { expected: usize, actual: usize },
    #[error("invalid weld tolerance {0}")]
    InvalidTolerance(f32),
    #[error("invalid material schema: {0}")]
    InvalidSchema(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeoError {
    /// Returns true when the failure was caused by the mesh handed to the
    /// converter rather than by the output side.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, GeoError::Io(_) | GeoError::Json(_))
    }
}
