//! Mesh to geometry document conversion.
//!
//! [`convert`] validates the mesh, moves it into the document's axis
//! convention, welds the positions and assembles the point, vertex, primitive
//! and detail attributes:
//!
//! | Attribute | Class |
//! |-----------|-------|
//! | `P` | point |
//! | `N`, `uv` | point without welding, vertex with welding |
//! | `materialName`, `meshName`, `baseColor`, `metallic`, `smoothness`, textures, `renderQueue` | primitive |
//! | `shadowCastingMode`, `tag`, `layer` | detail |

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, AttributeClass};
use crate::channels::{mirror_x, rebuild_channel};
use crate::document::GeometryDocument;
use crate::error::Result;
use crate::geometry_indices::PointIndex;
use crate::material::{detail_attributes, primitive_attributes, MaterialSchema, MaterialSource};
use crate::source::{MeshData, ObjectInfo};
use crate::weld::{weld_with_mode, WeldMode, WeldStrategy};

/// Conversion settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    pub weld: WeldMode,
    pub weld_strategy: WeldStrategy,
    /// Transform positions and normals by the object's transform.
    pub world_space: bool,
    /// Also emit `shadowCastingMode` per primitive.
    pub primitive_shadow_mode: bool,
    pub material_schema: MaterialSchema,
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables welding.
    pub fn naive(mut self) -> Self {
        self.weld = WeldMode::Naive;
        self
    }

    /// Welds with the given per-axis tolerance.
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.weld = WeldMode::Welded { tolerance };
        self
    }

    pub fn with_weld_strategy(mut self, strategy: WeldStrategy) -> Self {
        self.weld_strategy = strategy;
        self
    }

    pub fn with_world_space(mut self, world_space: bool) -> Self {
        self.world_space = world_space;
        self
    }

    pub fn with_primitive_shadow_mode(mut self, enabled: bool) -> Self {
        self.primitive_shadow_mode = enabled;
        self
    }

    pub fn with_material_schema(mut self, schema: MaterialSchema) -> Self {
        self.material_schema = schema;
        self
    }
}

/// Converts one mesh and its material slots into a geometry document.
///
/// `materials[i]` is the material of sub-mesh `i`; `None` entries and missing
/// trailing slots are converted with default material values.
///
/// # Errors
///
/// Returns an input error when the mesh is empty, not a triangle list, has
/// out-of-range indices, mismatched or non-finite channels, sub-meshes that
/// do not tile the triangles, an invalid weld tolerance, or a material schema
/// whose texture attributes collide with other primitive attributes. No partial
/// document is produced.
pub fn convert(
    mesh: &MeshData,
    materials: &[Option<&dyn MaterialSource>],
    info: &ObjectInfo,
    options: &ConvertOptions,
) -> Result<GeometryDocument> {
    options.material_schema.validate()?;
    mesh.validate()?;

    let transform = if options.world_space {
        if info.transform.is_none() {
            warn!("{}: world space requested without a transform, exporting local space", mesh.name);
        }
        info.transform
    } else {
        None
    };

    let positions: Vec<[f32; 3]> = mesh
        .positions
        .iter()
        .map(|&p| mirror_x(transform.map_or(p, |t| t.transform_point(p))))
        .collect();
    let normals: Vec<[f32; 3]> = mesh
        .normals
        .iter()
        .map(|&n| mirror_x(transform.map_or(n, |t| t.transform_normal(n))))
        .collect();

    let welded = weld_with_mode(&positions, options.weld, options.weld_strategy)?;
    let indices: Vec<PointIndex> = mesh
        .indices
        .iter()
        .map(|&i| welded.remap[i as usize])
        .collect();

    let mut document = GeometryDocument::new(welded.point_count(), indices);
    document.add_attribute(Attribute::float_tuples("P", AttributeClass::Point, &welded.positions));

    if !normals.is_empty() {
        let (class, values) = rebuild_channel(&normals, &mesh.indices, options.weld);
        document.add_attribute(Attribute::float_tuples("N", class, &values));
    }
    if !mesh.uvs.is_empty() {
        let (class, values) = rebuild_channel(&mesh.uvs, &mesh.indices, options.weld);
        document.add_attribute(Attribute::float_tuples("uv", class, &values));
    }

    for attribute in primitive_attributes(
        mesh,
        materials,
        info,
        &options.material_schema,
        options.primitive_shadow_mode,
    ) {
        document.add_attribute(attribute);
    }
    for attribute in detail_attributes(info) {
        document.add_attribute(attribute);
    }

    debug!(
        "{}: {} vertices welded into {} points, {} corners, {} primitives",
        mesh.name,
        mesh.vertex_count(),
        document.point_count(),
        document.vertex_count(),
        document.primitive_count()
    );
    Ok(document)
}
