//! Per-vertex channels other than position (normals, uvs).
//!
//! Without welding the source vertices are the points, so a channel is copied
//! one to one onto the points. With welding a point may merge vertices that
//! carry different normals or uvs (hard edges, uv seams), so the channel is
//! instead expanded per triangle corner from the original, pre-weld index.

use crate::attribute::AttributeClass;
use crate::weld::WeldMode;

/// Converts a vector from the engine's axis convention to the document's:
/// X is negated, Y and Z pass through.
#[inline]
pub fn mirror_x(v: [f32; 3]) -> [f32; 3] {
    [-v[0], v[1], v[2]]
}

/// Class a non-position channel is emitted with under `mode`.
pub fn channel_class(mode: WeldMode) -> AttributeClass {
    match mode {
        WeldMode::Naive => AttributeClass::Point,
        WeldMode::Welded { .. } => AttributeClass::Vertex,
    }
}

/// One value per triangle corner, looked up through the original indices.
pub fn vertex_channel<T: Copy>(source: &[T], original_indices: &[u32]) -> Vec<T> {
    original_indices
        .iter()
        .map(|&index| source[index as usize])
        .collect()
}

/// Lays out `source` for the document and returns it with its class.
pub fn rebuild_channel<T: Copy>(
    source: &[T],
    original_indices: &[u32],
    mode: WeldMode,
) -> (AttributeClass, Vec<T>) {
    let class = channel_class(mode);
    let values = match class {
        AttributeClass::Point => source.to_vec(),
        _ => vertex_channel(source, original_indices),
    };
    (class, values)
}
