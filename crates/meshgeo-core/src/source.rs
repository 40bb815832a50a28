//! Input data handed over by the mesh source collaborator.

use std::fmt;

use crate::error::{GeoError, Result};
use crate::transform::Transform;

/// A contiguous triangle range rendered with one material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMesh {
    pub start_triangle: usize,
    pub triangle_count: usize,
}

impl SubMesh {
    pub fn new(start_triangle: usize, triangle_count: usize) -> Self {
        Self {
            start_triangle,
            triangle_count,
        }
    }

    /// One past the last triangle, or `None` when the range overflows.
    pub fn end_triangle(&self) -> Option<usize> {
        self.start_triangle.checked_add(self.triangle_count)
    }
}

/// Raw triangulated mesh as read from the engine.
///
/// Normals and uvs are optional: leave them empty when the mesh has none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// Triangle list; every three entries form one triangle.
    pub indices: Vec<u32>,
    pub sub_meshes: Vec<SubMesh>,
}

impl MeshData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Sets a single sub-mesh covering every triangle.
    pub fn with_single_sub_mesh(mut self) -> Self {
        self.sub_meshes = vec![SubMesh::new(0, self.triangle_count())];
        self
    }

    /// Checks everything the converter relies on.
    pub fn validate(&self) -> Result<()> {
        let vertex_count = self.positions.len();
        if vertex_count == 0 {
            return Err(GeoError::EmptyMesh);
        }
        check_finite("positions", self.positions.iter().map(|p| p.as_slice()))?;

        for (channel, len) in [("normals", self.normals.len()), ("uvs", self.uvs.len())] {
            if len != 0 && len != vertex_count {
                return Err(GeoError::ChannelLength {
                    channel,
                    expected: vertex_count,
                    actual: len,
                });
            }
        }
        check_finite("normals", self.normals.iter().map(|n| n.as_slice()))?;
        check_finite("uvs", self.uvs.iter().map(|uv| uv.as_slice()))?;

        if self.indices.len() % 3 != 0 {
            return Err(GeoError::NotTriangulated {
                index_count: self.indices.len(),
            });
        }
        if let Some((corner, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(GeoError::IndexOutOfRange {
                corner,
                index,
                vertex_count,
            });
        }

        self.validate_sub_meshes()
    }

    fn validate_sub_meshes(&self) -> Result<()> {
        let mut next = 0;
        for (i, sub_mesh) in self.sub_meshes.iter().enumerate() {
            if sub_mesh.start_triangle != next {
                let message = if sub_mesh.start_triangle < next {
                    format!("starts at triangle {} inside the previous range", sub_mesh.start_triangle)
                } else {
                    format!("starts at triangle {}, leaving a gap after {next}", sub_mesh.start_triangle)
                };
                return Err(GeoError::SubMeshLayout {
                    sub_mesh: i,
                    message,
                });
            }
            next = sub_mesh.end_triangle().ok_or_else(|| GeoError::SubMeshLayout {
                sub_mesh: i,
                message: format!("{} triangles from {} overflow the index range", sub_mesh.triangle_count, next),
            })?;
        }
        let expected = self.triangle_count();
        if next != expected {
            return Err(GeoError::SubMeshTotal {
                expected,
                actual: next,
            });
        }
        Ok(())
    }
}

fn check_finite<'a>(channel: &'static str, elements: impl Iterator<Item = &'a [f32]>) -> Result<()> {
    for (element, values) in elements.enumerate() {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeoError::NonFinite { channel, element });
        }
    }
    Ok(())
}

/// How a renderer casts shadows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShadowCastingMode {
    Off,
    #[default]
    On,
    TwoSided,
    ShadowsOnly,
}

impl ShadowCastingMode {
    pub const fn name(self) -> &'static str {
        match self {
            ShadowCastingMode::Off => "Off",
            ShadowCastingMode::On => "On",
            ShadowCastingMode::TwoSided => "TwoSided",
            ShadowCastingMode::ShadowsOnly => "ShadowsOnly",
        }
    }
}

impl fmt::Display for ShadowCastingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Object-level data captured once per conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub name: String,
    pub tag: String,
    pub layer: i32,
    pub shadow_casting_mode: ShadowCastingMode,
    /// Local-to-world transform, used when world-space export is requested.
    pub transform: Option<Transform>,
}

impl Default for ObjectInfo {
    fn default() -> Self {
        Self {
            name: String::new(),
            tag: "Untagged".to_string(),
            layer: 0,
            shadow_casting_mode: ShadowCastingMode::On,
            transform: None,
        }
    }
}

impl ObjectInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        MeshData {
            name: "Quad".to_string(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2, 0, 2, 3],
            ..MeshData::default()
        }
        .with_single_sub_mesh()
    }

    #[test]
    fn test_valid_mesh() {
        assert!(quad().validate().is_ok());
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = MeshData::new("Empty");
        assert!(matches!(mesh.validate(), Err(GeoError::EmptyMesh)));
    }

    #[test]
    fn test_not_triangulated() {
        let mut mesh = quad();
        mesh.indices.pop();
        assert!(matches!(
            mesh.validate(),
            Err(GeoError::NotTriangulated { index_count: 5 })
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let mut mesh = quad();
        mesh.indices[4] = 9;
        assert!(matches!(
            mesh.validate(),
            Err(GeoError::IndexOutOfRange { corner: 4, index: 9, vertex_count: 4 })
        ));
    }

    #[test]
    fn test_channel_length() {
        let mut mesh = quad();
        mesh.normals = vec![[0.0, 0.0, 1.0]; 3];
        assert!(matches!(
            mesh.validate(),
            Err(GeoError::ChannelLength { channel: "normals", expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_non_finite_position() {
        let mut mesh = quad();
        mesh.positions[2][1] = f32::INFINITY;
        assert!(matches!(
            mesh.validate(),
            Err(GeoError::NonFinite { channel: "positions", element: 2 })
        ));
    }

    #[test]
    fn test_sub_mesh_total_mismatch() {
        let mut mesh = quad();
        mesh.sub_meshes = vec![SubMesh::new(0, 1)];
        assert!(matches!(
            mesh.validate(),
            Err(GeoError::SubMeshTotal { expected: 2, actual: 1 })
        ));
        mesh.sub_meshes.clear();
        assert!(matches!(mesh.validate(), Err(GeoError::SubMeshTotal { .. })));
    }

    #[test]
    fn test_sub_mesh_gap_and_overlap() {
        let mut mesh = quad();
        mesh.sub_meshes = vec![SubMesh::new(1, 1)];
        assert!(matches!(mesh.validate(), Err(GeoError::SubMeshLayout { sub_mesh: 0, .. })));
        mesh.sub_meshes = vec![SubMesh::new(0, 2), SubMesh::new(1, 1)];
        assert!(matches!(mesh.validate(), Err(GeoError::SubMeshLayout { sub_mesh: 1, .. })));
    }

    #[test]
    fn test_sub_mesh_range_overflow() {
        let mut mesh = quad();
        mesh.sub_meshes = vec![SubMesh::new(0, 1), SubMesh::new(1, usize::MAX)];
        assert_eq!(mesh.sub_meshes[1].end_triangle(), None);
        assert!(matches!(mesh.validate(), Err(GeoError::SubMeshLayout { sub_mesh: 1, .. })));
    }

    #[test]
    fn test_shadow_mode_names() {
        assert_eq!(ShadowCastingMode::TwoSided.to_string(), "TwoSided");
        assert_eq!(ObjectInfo::default().shadow_casting_mode, ShadowCastingMode::On);
    }
}
