//! Material attribute extraction.
//!
//! Every sub-mesh references one material slot. The slot's properties are
//! resolved once through ordered fallback lists ([`MaterialSchema`]) and then
//! broadcast over the sub-mesh's triangle range, producing flat per-primitive
//! arrays. Missing materials and unresolved properties fall back to defaults
//! and are reported through `log::warn!`.

use std::collections::{HashMap, HashSet};
use std::iter;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::attribute::{Attribute, AttributeClass};
use crate::error::{GeoError, Result};
use crate::source::{MeshData, ObjectInfo};

/// Render queue used when a material reports a non-positive queue.
pub const DEFAULT_RENDER_QUEUE: i32 = 2000;

/// Primitive attributes written for every material, whatever the schema.
pub const RESERVED_PRIMITIVE_ATTRIBUTES: [&str; 7] = [
    "materialName",
    "meshName",
    "shadowCastingMode",
    "baseColor",
    "metallic",
    "smoothness",
    "renderQueue",
];

/// Opaque per-slot material handle supplied by the material source.
pub trait MaterialSource {
    fn name(&self) -> &str;

    fn has_property(&self, name: &str) -> bool;

    fn get_float(&self, name: &str) -> f32;

    fn get_color(&self, name: &str) -> [f32; 4];

    /// Absolute path of the texture bound to `name`, or an empty string.
    fn get_texture_path(&self, name: &str) -> String;

    fn render_queue(&self) -> i32;
}

/// Map-backed [`MaterialSource`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialProperties {
    pub name: String,
    pub floats: HashMap<String, f32>,
    pub colors: HashMap<String, [f32; 4]>,
    pub textures: HashMap<String, String>,
    pub render_queue: i32,
}

impl MaterialProperties {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            render_queue: DEFAULT_RENDER_QUEUE,
            ..Self::default()
        }
    }

    pub fn with_float(mut self, property: &str, value: f32) -> Self {
        self.floats.insert(property.to_string(), value);
        self
    }

    pub fn with_color(mut self, property: &str, value: [f32; 4]) -> Self {
        self.colors.insert(property.to_string(), value);
        self
    }

    pub fn with_texture(mut self, property: &str, path: impl Into<String>) -> Self {
        self.textures.insert(property.to_string(), path.into());
        self
    }

    pub fn with_render_queue(mut self, queue: i32) -> Self {
        self.render_queue = queue;
        self
    }
}

impl MaterialSource for MaterialProperties {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_property(&self, name: &str) -> bool {
        self.floats.contains_key(name) || self.colors.contains_key(name) || self.textures.contains_key(name)
    }

    fn get_float(&self, name: &str) -> f32 {
        self.floats.get(name).copied().unwrap_or(0.0)
    }

    fn get_color(&self, name: &str) -> [f32; 4] {
        self.colors.get(name).copied().unwrap_or([0.0; 4])
    }

    fn get_texture_path(&self, name: &str) -> String {
        self.textures.get(name).cloned().unwrap_or_default()
    }

    fn render_queue(&self) -> i32 {
        self.render_queue
    }
}

/// A per-primitive texture attribute and the properties it is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSlot {
    pub attribute: String,
    pub properties: Vec<String>,
}

impl TextureSlot {
    pub fn new(attribute: &str, properties: &[&str]) -> Self {
        Self {
            attribute: attribute.to_string(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Ordered property fallback lists; the first property a material has wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSchema {
    pub base_color: Vec<String>,
    pub metallic: Vec<String>,
    pub smoothness: Vec<String>,
    pub textures: Vec<TextureSlot>,
}

impl Default for MaterialSchema {
    fn default() -> Self {
        Self {
            base_color: names(&["_BaseColor", "_Color"]),
            metallic: names(&["_Metallic"]),
            smoothness: names(&["_Smoothness", "_Glossiness"]),
            textures: vec![
                TextureSlot::new("baseMap", &["_BaseMap", "_MainTex"]),
                TextureSlot::new("normalMap", &["_BumpMap", "_NormalMap"]),
            ],
        }
    }
}

impl MaterialSchema {
    /// Rejects texture slots whose attribute names are empty, repeated, or
    /// taken by a built-in primitive attribute.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for slot in &self.textures {
            let name = slot.attribute.as_str();
            if name.is_empty() {
                return Err(GeoError::InvalidSchema("texture slot without an attribute name".to_string()));
            }
            if RESERVED_PRIMITIVE_ATTRIBUTES.contains(&name) {
                return Err(GeoError::InvalidSchema(format!(
                    "texture attribute '{name}' collides with a built-in primitive attribute"
                )));
            }
            if !seen.insert(name) {
                return Err(GeoError::InvalidSchema(format!("texture attribute '{name}' is declared twice")));
            }
        }
        Ok(())
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Material values after fallback resolution and default substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMaterial {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub smoothness: f32,
    /// One path per [`MaterialSchema::textures`] slot, empty when unbound.
    pub textures: Vec<String>,
    pub render_queue: i32,
}

impl ResolvedMaterial {
    fn defaults(schema: &MaterialSchema) -> Self {
        Self {
            name: String::new(),
            base_color: [1.0; 4],
            metallic: 0.0,
            smoothness: 0.0,
            textures: vec![String::new(); schema.textures.len()],
            render_queue: DEFAULT_RENDER_QUEUE,
        }
    }
}

/// Resolves one material slot. `slot` is only used for log messages.
pub fn resolve_material(
    material: Option<&dyn MaterialSource>,
    schema: &MaterialSchema,
    slot: usize,
) -> ResolvedMaterial {
    let mut resolved = ResolvedMaterial::defaults(schema);
    let Some(material) = material else {
        warn!("material slot {slot} is empty, using default material values");
        return resolved;
    };
    resolved.name = material.name().to_string();

    match first_property(material, &schema.base_color) {
        Some(property) => {
            let color = material.get_color(&property);
            if color.iter().all(|c| c.is_finite()) {
                resolved.base_color = color;
            } else {
                warn!("material '{}': non-finite {property}, using white", resolved.name);
            }
        }
        None => warn!(
            "material '{}': none of {:?} found, using white",
            resolved.name, schema.base_color
        ),
    }

    for (list, target, label) in [
        (&schema.metallic, &mut resolved.metallic, "metallic"),
        (&schema.smoothness, &mut resolved.smoothness, "smoothness"),
    ] {
        match first_property(material, list) {
            Some(property) => {
                let value = material.get_float(&property);
                if value.is_finite() {
                    *target = value;
                } else {
                    warn!("material '{}': non-finite {property}, {label} defaults to 0", material.name());
                }
            }
            None => warn!("material '{}': none of {list:?} found, {label} defaults to 0", material.name()),
        }
    }

    for (texture, slot_schema) in resolved.textures.iter_mut().zip(&schema.textures) {
        let path = slot_schema
            .properties
            .iter()
            .filter(|p| material.has_property(p))
            .map(|p| material.get_texture_path(p))
            .find(|path| !path.is_empty());
        match path {
            Some(path) => *texture = path,
            None => debug!(
                "material '{}': no texture bound for {}",
                material.name(),
                slot_schema.attribute
            ),
        }
    }

    let queue = material.render_queue();
    if queue > 0 {
        resolved.render_queue = queue;
    } else {
        warn!(
            "material '{}': render queue {queue} is not assigned, using {DEFAULT_RENDER_QUEUE}",
            material.name()
        );
    }

    resolved
}

fn first_property(material: &dyn MaterialSource, list: &[String]) -> Option<String> {
    list.iter().find(|p| material.has_property(p)).cloned()
}

/// Builds the per-primitive material attributes of `mesh`.
///
/// Sub-mesh `i` uses `materials[i]`; slots past the end of `materials` are
/// treated as empty. The mesh must already be validated so that sub-meshes
/// tile the triangle range.
pub fn primitive_attributes(
    mesh: &MeshData,
    materials: &[Option<&dyn MaterialSource>],
    info: &ObjectInfo,
    schema: &MaterialSchema,
    shadow_mode_per_primitive: bool,
) -> Vec<Attribute> {
    if materials.len() > mesh.sub_meshes.len() {
        debug!(
            "{}: {} material slots for {} sub-meshes, extra slots ignored",
            mesh.name,
            materials.len(),
            mesh.sub_meshes.len()
        );
    }

    let resolved: Vec<(ResolvedMaterial, usize)> = mesh
        .sub_meshes
        .iter()
        .enumerate()
        .map(|(i, sub_mesh)| {
            let material = materials.get(i).copied().flatten();
            (resolve_material(material, schema, i), sub_mesh.triangle_count)
        })
        .collect();

    let primitive_count: usize = resolved.iter().map(|(_, count)| count).sum();

    let mut attributes = Vec::new();
    attributes.push(Attribute::strings(
        "materialName",
        AttributeClass::Primitive,
        resolved
            .iter()
            .flat_map(|(m, count)| iter::repeat(m.name.as_str()).take(*count)),
    ));
    attributes.push(Attribute::strings(
        "meshName",
        AttributeClass::Primitive,
        iter::repeat(mesh.name.as_str()).take(primitive_count),
    ));
    if shadow_mode_per_primitive {
        attributes.push(Attribute::strings(
            "shadowCastingMode",
            AttributeClass::Primitive,
            iter::repeat(info.shadow_casting_mode.name()).take(primitive_count),
        ));
    }

    let mut colors = Vec::with_capacity(primitive_count);
    let mut metallic = Vec::with_capacity(primitive_count);
    let mut smoothness = Vec::with_capacity(primitive_count);
    let mut queues = Vec::with_capacity(primitive_count);
    for (m, count) in &resolved {
        colors.extend(iter::repeat(m.base_color).take(*count));
        metallic.extend(iter::repeat(m.metallic).take(*count));
        smoothness.extend(iter::repeat(m.smoothness).take(*count));
        queues.extend(iter::repeat(m.render_queue).take(*count));
    }
    attributes.push(Attribute::float_tuples("baseColor", AttributeClass::Primitive, &colors));
    attributes.push(Attribute::floats("metallic", AttributeClass::Primitive, metallic));
    attributes.push(Attribute::floats("smoothness", AttributeClass::Primitive, smoothness));

    for (t, slot) in schema.textures.iter().enumerate() {
        let paths = resolved
            .iter()
            .flat_map(|(m, count)| iter::repeat(m.textures[t].as_str()).take(*count));
        attributes.push(Attribute::strings(slot.attribute.clone(), AttributeClass::Primitive, paths));
    }

    attributes.push(Attribute::ints("renderQueue", AttributeClass::Primitive, queues));
    attributes
}

/// Document-wide attributes captured from the source object.
pub fn detail_attributes(info: &ObjectInfo) -> Vec<Attribute> {
    vec![
        Attribute::strings(
            "shadowCastingMode",
            AttributeClass::Detail,
            [info.shadow_casting_mode.name()],
        ),
        Attribute::strings("tag", AttributeClass::Detail, [info.tag.as_str()]),
        Attribute::ints("layer", AttributeClass::Detail, vec![info.layer]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SubMesh;

    fn two_part_mesh() -> MeshData {
        MeshData {
            name: "Crate".to_string(),
            positions: vec![[0.0; 3]; 4],
            indices: vec![0, 1, 2, 0, 2, 3, 1, 2, 3],
            sub_meshes: vec![SubMesh::new(0, 2), SubMesh::new(2, 1)],
            ..MeshData::default()
        }
    }

    fn find<'a>(attributes: &'a [Attribute], name: &str) -> &'a Attribute {
        attributes.iter().find(|a| a.name() == name).unwrap()
    }

    #[test]
    fn test_base_color_fallback_order() {
        let material = MaterialProperties::new("Legacy").with_color("_Color", [0.2, 0.4, 0.6, 1.0]);
        let resolved = resolve_material(Some(&material), &MaterialSchema::default(), 0);
        assert_eq!(resolved.base_color, [0.2, 0.4, 0.6, 1.0]);

        let both = material.with_color("_BaseColor", [1.0, 0.0, 0.0, 1.0]);
        let resolved = resolve_material(Some(&both), &MaterialSchema::default(), 0);
        assert_eq!(resolved.base_color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_null_material_uses_defaults() {
        let resolved = resolve_material(None, &MaterialSchema::default(), 3);
        assert_eq!(resolved.name, "");
        assert_eq!(resolved.base_color, [1.0; 4]);
        assert_eq!(resolved.metallic, 0.0);
        assert_eq!(resolved.render_queue, DEFAULT_RENDER_QUEUE);
        assert_eq!(resolved.textures, vec![String::new(), String::new()]);
    }

    #[test]
    fn test_non_positive_render_queue_defaults() {
        let material = MaterialProperties::new("Unassigned").with_render_queue(-1);
        let resolved = resolve_material(Some(&material), &MaterialSchema::default(), 0);
        assert_eq!(resolved.render_queue, 2000);

        let material = MaterialProperties::new("Transparent").with_render_queue(3000);
        let resolved = resolve_material(Some(&material), &MaterialSchema::default(), 0);
        assert_eq!(resolved.render_queue, 3000);
    }

    #[test]
    fn test_schema_validation() {
        assert!(MaterialSchema::default().validate().is_ok());

        let mut schema = MaterialSchema::default();
        schema.textures.push(TextureSlot::new("metallic", &["_MetallicGlossMap"]));
        assert!(matches!(schema.validate(), Err(GeoError::InvalidSchema(m)) if m.contains("'metallic'")));

        let mut schema = MaterialSchema::default();
        schema.textures.push(TextureSlot::new("baseMap", &["_Albedo"]));
        assert!(matches!(schema.validate(), Err(GeoError::InvalidSchema(m)) if m.contains("twice")));

        let mut schema = MaterialSchema::default();
        schema.textures = vec![TextureSlot::new("", &["_MainTex"])];
        assert!(matches!(schema.validate(), Err(GeoError::InvalidSchema(_))));
    }

    #[test]
    fn test_texture_fallback_skips_empty_paths() {
        let material = MaterialProperties::new("Tex")
            .with_texture("_BaseMap", "")
            .with_texture("_MainTex", "/assets/albedo.png")
            .with_texture("_NormalMap", "/assets/normal.png");
        let resolved = resolve_material(Some(&material), &MaterialSchema::default(), 0);
        assert_eq!(resolved.textures, vec!["/assets/albedo.png", "/assets/normal.png"]);
    }

    #[test]
    fn test_non_finite_values_fall_back() {
        let material = MaterialProperties::new("Broken")
            .with_color("_BaseColor", [f32::NAN, 0.0, 0.0, 1.0])
            .with_float("_Metallic", f32::INFINITY)
            .with_float("_Smoothness", 0.5);
        let resolved = resolve_material(Some(&material), &MaterialSchema::default(), 0);
        assert_eq!(resolved.base_color, [1.0; 4]);
        assert_eq!(resolved.metallic, 0.0);
        assert_eq!(resolved.smoothness, 0.5);
    }

    #[test]
    fn test_broadcast_over_sub_meshes() {
        let mesh = two_part_mesh();
        let wood = MaterialProperties::new("Wood").with_float("_Metallic", 0.1);
        let metal = MaterialProperties::new("Metal")
            .with_float("_Metallic", 0.9)
            .with_render_queue(2450);
        let materials: [Option<&dyn MaterialSource>; 2] = [Some(&wood), Some(&metal)];
        let attributes = primitive_attributes(
            &mesh,
            &materials,
            &ObjectInfo::new("Crate"),
            &MaterialSchema::default(),
            false,
        );

        let names: Vec<&str> = attributes.iter().map(|a| a.name()).collect();
        assert_eq!(
            names,
            vec!["materialName", "meshName", "baseColor", "metallic", "smoothness", "baseMap", "normalMap", "renderQueue"]
        );
        for attribute in &attributes {
            assert_eq!(attribute.len(), 3, "{}", attribute.name());
        }

        let material_name = find(&attributes, "materialName");
        assert_eq!(material_name.string(0), Some("Wood"));
        assert_eq!(material_name.string(1), Some("Wood"));
        assert_eq!(material_name.string(2), Some("Metal"));
        assert_eq!(find(&attributes, "metallic").float_tuple(2), Some(&[0.9][..]));
        assert_eq!(find(&attributes, "renderQueue").int_tuple(0), Some(&[2000][..]));
        assert_eq!(find(&attributes, "renderQueue").int_tuple(2), Some(&[2450][..]));
        assert_eq!(find(&attributes, "meshName").string(2), Some("Crate"));
    }

    #[test]
    fn test_missing_slots_and_shadow_mode() {
        let mesh = two_part_mesh();
        let wood = MaterialProperties::new("Wood");
        let materials: [Option<&dyn MaterialSource>; 1] = [Some(&wood)];
        let attributes = primitive_attributes(
            &mesh,
            &materials,
            &ObjectInfo::new("Crate"),
            &MaterialSchema::default(),
            true,
        );
        assert_eq!(find(&attributes, "materialName").string(2), Some(""));
        assert_eq!(find(&attributes, "shadowCastingMode").string(1), Some("On"));
        assert_eq!(find(&attributes, "baseColor").float_tuple(2), Some(&[1.0, 1.0, 1.0, 1.0][..]));
    }

    #[test]
    fn test_detail_attributes() {
        let mut info = ObjectInfo::new("Lamp");
        info.tag = "Props".to_string();
        info.layer = 8;
        let attributes = detail_attributes(&info);
        assert_eq!(attributes.len(), 3);
        assert!(attributes.iter().all(|a| a.class() == AttributeClass::Detail && a.len() == 1));
        assert_eq!(find(&attributes, "tag").string(0), Some("Props"));
        assert_eq!(find(&attributes, "layer").int_tuple(0), Some(&[8][..]));
    }
}
