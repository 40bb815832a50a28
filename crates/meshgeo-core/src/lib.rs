//! Meshgeo core library
//!
//! Converts an in-memory triangle mesh and its per-sub-mesh materials into an
//! attribute-based `.geo` geometry document:
//!
//! 1. [`weld`] deduplicates near-coincident positions into points,
//! 2. [`channels`] lays out normals and uvs per point or per corner,
//! 3. [`material`] flattens material slots into per-primitive attributes,
//! 4. [`converter`] assembles everything into a [`GeometryDocument`],
//! 5. [`geo_writer`] serializes the document.
//!
//! ```ignore
//! use meshgeo_core::{convert, to_geo_string, ConvertOptions, MeshData, ObjectInfo};
//!
//! let document = convert(&mesh, &materials, &ObjectInfo::new("Crate"), &ConvertOptions::new())?;
//! let text = to_geo_string(&document)?;
//! ```

pub mod attribute;
pub mod channels;
pub mod converter;
pub mod document;
pub mod error;
pub mod geo_writer;
pub mod geometry_indices;
pub mod material;
pub mod source;
pub mod transform;
pub mod weld;

pub use attribute::{Attribute, AttributeClass, AttributeValues, NumericData, Storage, StringDictionary};
pub use converter::{convert, ConvertOptions};
pub use document::{GeometryDocument, PrimitiveRun};
pub use error::{GeoError, Result};
pub use geo_writer::{to_geo_string, write_geo};
pub use geometry_indices::PointIndex;
pub use material::{MaterialProperties, MaterialSchema, MaterialSource, TextureSlot};
pub use source::{MeshData, ObjectInfo, ShadowCastingMode, SubMesh};
pub use transform::Transform;
pub use weld::{weld, weld_naive, WeldMode, WeldResult, WeldStrategy};
