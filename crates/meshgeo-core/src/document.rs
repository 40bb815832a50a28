//! In-memory geometry document.

use crate::attribute::{Attribute, AttributeClass};
use crate::geometry_indices::PointIndex;

/// Number of vertices of every output primitive.
pub const TRIANGLE_VERTEX_COUNT: u32 = 3;

/// The single primitive group of a document: `primitive_count` polygons of
/// `vertices_per_primitive` vertices each, starting at `start_vertex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveRun {
    pub start_vertex: usize,
    pub vertices_per_primitive: u32,
    pub primitive_count: usize,
}

impl PrimitiveRun {
    pub const TYPE: &'static str = "Polygon_run";

    pub fn triangles(primitive_count: usize) -> Self {
        Self {
            start_vertex: 0,
            vertices_per_primitive: TRIANGLE_VERTEX_COUNT,
            primitive_count,
        }
    }
}

/// Points, triangle topology and the attributes attached to them.
///
/// The element counts are derived from the topology and cannot be set on
/// their own. Every attribute added must match its class's cardinality.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryDocument {
    point_count: usize,
    indices: Vec<PointIndex>,
    point_attributes: Vec<Attribute>,
    vertex_attributes: Vec<Attribute>,
    primitive_attributes: Vec<Attribute>,
    detail_attributes: Vec<Attribute>,
    primitive_run: PrimitiveRun,
}

impl GeometryDocument {
    /// Creates a document over `point_count` points and a triangle list of
    /// point references.
    ///
    /// # Panics
    ///
    /// Panics if `indices` is not a triangle list or references a point
    /// outside `0..point_count`.
    pub fn new(point_count: usize, indices: Vec<PointIndex>) -> Self {
        assert_eq!(
            indices.len() % TRIANGLE_VERTEX_COUNT as usize,
            0,
            "topology is not a triangle list"
        );
        if let Some(bad) = indices.iter().find(|p| p.0 as usize >= point_count) {
            panic!("point reference {} outside 0..{point_count}", bad.0);
        }
        let primitive_count = indices.len() / TRIANGLE_VERTEX_COUNT as usize;
        Self {
            point_count,
            indices,
            point_attributes: Vec::new(),
            vertex_attributes: Vec::new(),
            primitive_attributes: Vec::new(),
            detail_attributes: Vec::new(),
            primitive_run: PrimitiveRun::triangles(primitive_count),
        }
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// Number of triangle corners.
    pub fn vertex_count(&self) -> usize {
        self.indices.len()
    }

    pub fn primitive_count(&self) -> usize {
        self.primitive_run.primitive_count
    }

    /// Point referenced by every vertex.
    pub fn indices(&self) -> &[PointIndex] {
        &self.indices
    }

    pub fn primitive_run(&self) -> &PrimitiveRun {
        &self.primitive_run
    }

    /// Expected element count of attributes in `class`.
    pub fn cardinality(&self, class: AttributeClass) -> usize {
        class.cardinality(self.point_count, self.vertex_count(), self.primitive_count())
    }

    /// Appends an attribute to its class's list.
    ///
    /// # Panics
    ///
    /// Panics if the attribute's element count does not match the class
    /// cardinality or its name is already used in that class.
    pub fn add_attribute(&mut self, attribute: Attribute) {
        let class = attribute.class();
        let expected = self.cardinality(class);
        assert_eq!(
            attribute.len(),
            expected,
            "attribute '{}' has {} elements, {:?} class needs {expected}",
            attribute.name(),
            attribute.len(),
            class
        );
        assert!(
            self.attribute(class, attribute.name()).is_none(),
            "duplicate {:?} attribute '{}'",
            class,
            attribute.name()
        );
        self.list_mut(class).push(attribute);
    }

    pub fn attributes(&self, class: AttributeClass) -> &[Attribute] {
        match class {
            AttributeClass::Point => &self.point_attributes,
            AttributeClass::Vertex => &self.vertex_attributes,
            AttributeClass::Primitive => &self.primitive_attributes,
            AttributeClass::Detail => &self.detail_attributes,
        }
    }

    pub fn attribute(&self, class: AttributeClass, name: &str) -> Option<&Attribute> {
        self.attributes(class).iter().find(|a| a.name() == name)
    }

    fn list_mut(&mut self, class: AttributeClass) -> &mut Vec<Attribute> {
        match class {
            AttributeClass::Point => &mut self.point_attributes,
            AttributeClass::Vertex => &mut self.vertex_attributes,
            AttributeClass::Primitive => &mut self.primitive_attributes,
            AttributeClass::Detail => &mut self.detail_attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> GeometryDocument {
        GeometryDocument::new(3, vec![PointIndex(0), PointIndex(1), PointIndex(2)])
    }

    #[test]
    fn test_derived_counts() {
        let doc = GeometryDocument::new(4, [0u32, 1, 2, 0, 2, 3].map(PointIndex).to_vec());
        assert_eq!(doc.point_count(), 4);
        assert_eq!(doc.vertex_count(), 6);
        assert_eq!(doc.primitive_count(), 2);
        assert_eq!(doc.primitive_run().primitive_count, 2);
        assert_eq!(doc.primitive_run().vertices_per_primitive, 3);
        assert_eq!(doc.cardinality(AttributeClass::Detail), 1);
    }

    #[test]
    fn test_add_and_lookup() {
        let mut doc = triangle();
        doc.add_attribute(Attribute::float_tuples("P", AttributeClass::Point, &[[0.0; 3]; 3]));
        doc.add_attribute(Attribute::ints("layer", AttributeClass::Detail, vec![0]));
        assert!(doc.attribute(AttributeClass::Point, "P").is_some());
        assert!(doc.attribute(AttributeClass::Vertex, "P").is_none());
        assert_eq!(doc.attributes(AttributeClass::Detail).len(), 1);
    }

    #[test]
    #[should_panic(expected = "class needs 1")]
    fn test_cardinality_violation_panics() {
        let mut doc = triangle();
        doc.add_attribute(Attribute::floats("metallic", AttributeClass::Primitive, vec![0.0, 0.0]));
    }

    #[test]
    #[should_panic(expected = "duplicate")]
    fn test_duplicate_name_panics() {
        let mut doc = triangle();
        doc.add_attribute(Attribute::ints("layer", AttributeClass::Detail, vec![0]));
        doc.add_attribute(Attribute::ints("layer", AttributeClass::Detail, vec![1]));
    }

    #[test]
    #[should_panic(expected = "outside 0..2")]
    fn test_out_of_range_reference_panics() {
        GeometryDocument::new(2, vec![PointIndex(0), PointIndex(1), PointIndex(2)]);
    }
}
