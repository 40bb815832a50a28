//! Attribute model.
//!
//! An [`Attribute`] is one named data channel attached to a class of geometry
//! elements. Its values are either numeric tuples of a fixed width or strings,
//! which are stored dictionary-encoded. Both kinds serialize into the `.geo`
//! attribute grammar through their [`Serialize`] implementations:
//!
//! ```text
//! [["scope","public","type","numeric","name","P"],
//!  ["size",3,"storage","fpreal32","values",["size",3,"storage","fpreal32","tuples",[[0,0,0],...]]]]
//! ```

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// The element class an attribute is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeClass {
    /// One value per welded point.
    Point,
    /// One value per triangle corner.
    Vertex,
    /// One value per triangle.
    Primitive,
    /// A single document-wide value.
    Detail,
}

impl AttributeClass {
    /// Classes in document order.
    pub const ALL: [AttributeClass; 4] = [
        AttributeClass::Point,
        AttributeClass::Vertex,
        AttributeClass::Primitive,
        AttributeClass::Detail,
    ];

    /// Key of the attribute list for this class inside the `attributes` section.
    pub const fn section_key(self) -> &'static str {
        match self {
            AttributeClass::Point => "pointattributes",
            AttributeClass::Vertex => "vertexattributes",
            AttributeClass::Primitive => "primitiveattributes",
            AttributeClass::Detail => "globalattributes",
        }
    }

    /// Number of elements an attribute of this class must carry.
    pub const fn cardinality(
        self,
        point_count: usize,
        vertex_count: usize,
        primitive_count: usize,
    ) -> usize {
        match self {
            AttributeClass::Point => point_count,
            AttributeClass::Vertex => vertex_count,
            AttributeClass::Primitive => primitive_count,
            AttributeClass::Detail => 1,
        }
    }
}

/// Storage tag written next to every value block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Fpreal32,
    Int32,
}

impl Storage {
    pub const fn tag(self) -> &'static str {
        match self {
            Storage::Fpreal32 => "fpreal32",
            Storage::Int32 => "int32",
        }
    }
}

/// Flat numeric storage; tuples are consecutive runs of `size` components.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericData {
    Float32(Vec<f32>),
    Int32(Vec<i32>),
}

impl NumericData {
    pub fn storage(&self) -> Storage {
        match self {
            NumericData::Float32(_) => Storage::Fpreal32,
            NumericData::Int32(_) => Storage::Int32,
        }
    }

    /// Number of scalar components.
    pub fn component_count(&self) -> usize {
        match self {
            NumericData::Float32(v) => v.len(),
            NumericData::Int32(v) => v.len(),
        }
    }
}

/// Distinct strings in first-occurrence order plus one dictionary slot per element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringDictionary {
    strings: Vec<String>,
    indices: Vec<u32>,
}

impl StringDictionary {
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut slots: HashMap<String, u32> = HashMap::new();
        let mut dictionary = StringDictionary::default();
        for value in values {
            let value = value.as_ref();
            let slot = match slots.get(value) {
                Some(&slot) => slot,
                None => {
                    let slot = dictionary.strings.len() as u32;
                    slots.insert(value.to_string(), slot);
                    dictionary.strings.push(value.to_string());
                    slot
                }
            };
            dictionary.indices.push(slot);
        }
        dictionary
    }

    /// The distinct strings.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Dictionary slot of every element.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of elements (not distinct strings).
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Resolves element `element` through the dictionary.
    pub fn get(&self, element: usize) -> &str {
        &self.strings[self.indices[element] as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.indices.iter().map(move |&slot| self.strings[slot as usize].as_str())
    }
}

/// Values of an attribute, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValues {
    Numeric { size: usize, data: NumericData },
    Strings(StringDictionary),
}

/// A named data channel attached to one [`AttributeClass`].
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    class: AttributeClass,
    values: AttributeValues,
}

impl Attribute {
    /// Creates a numeric attribute from flat data holding `size` components per element.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero or the data length is not a multiple of `size`.
    pub fn numeric(
        name: impl Into<String>,
        class: AttributeClass,
        size: usize,
        data: NumericData,
    ) -> Self {
        assert!(size > 0, "numeric attribute needs a tuple width");
        assert_eq!(
            data.component_count() % size,
            0,
            "numeric data does not split into tuples of {size}"
        );
        Self {
            name: name.into(),
            class,
            values: AttributeValues::Numeric { size, data },
        }
    }

    /// Creates a float attribute from fixed-width tuples.
    pub fn float_tuples<const N: usize>(
        name: impl Into<String>,
        class: AttributeClass,
        tuples: &[[f32; N]],
    ) -> Self {
        let data = tuples.iter().flatten().copied().collect();
        Self::numeric(name, class, N, NumericData::Float32(data))
    }

    /// Creates a float attribute with one component per element.
    pub fn floats(name: impl Into<String>, class: AttributeClass, values: Vec<f32>) -> Self {
        Self::numeric(name, class, 1, NumericData::Float32(values))
    }

    /// Creates an integer attribute with one component per element.
    pub fn ints(name: impl Into<String>, class: AttributeClass, values: Vec<i32>) -> Self {
        Self::numeric(name, class, 1, NumericData::Int32(values))
    }

    /// Creates a dictionary-encoded string attribute.
    pub fn strings<I, S>(name: impl Into<String>, class: AttributeClass, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            class,
            values: AttributeValues::Strings(StringDictionary::from_values(values)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> AttributeClass {
        self.class
    }

    pub fn values(&self) -> &AttributeValues {
        &self.values
    }

    /// Tuple width; string attributes always have width 1.
    pub fn size(&self) -> usize {
        match &self.values {
            AttributeValues::Numeric { size, .. } => *size,
            AttributeValues::Strings(_) => 1,
        }
    }

    /// Storage of the values, or of the dictionary indices for strings.
    pub fn storage(&self) -> Storage {
        match &self.values {
            AttributeValues::Numeric { data, .. } => data.storage(),
            AttributeValues::Strings(_) => Storage::Int32,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match &self.values {
            AttributeValues::Numeric { size, data } => data.component_count() / size,
            AttributeValues::Strings(dictionary) => dictionary.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.values, AttributeValues::Numeric { .. })
    }

    /// Float tuple `element`, if this is a float attribute.
    pub fn float_tuple(&self, element: usize) -> Option<&[f32]> {
        match &self.values {
            AttributeValues::Numeric {
                size,
                data: NumericData::Float32(v),
            } => v.get(element * size..(element + 1) * size),
            _ => None,
        }
    }

    /// Integer tuple `element`, if this is an integer attribute.
    pub fn int_tuple(&self, element: usize) -> Option<&[i32]> {
        match &self.values {
            AttributeValues::Numeric {
                size,
                data: NumericData::Int32(v),
            } => v.get(element * size..(element + 1) * size),
            _ => None,
        }
    }

    /// String value of `element`, if this is a string attribute.
    pub fn string(&self, element: usize) -> Option<&str> {
        match &self.values {
            AttributeValues::Strings(dictionary) if element < dictionary.len() => {
                Some(dictionary.get(element))
            }
            _ => None,
        }
    }
}

// ============================================================================
// Serialization
// ============================================================================

impl Serialize for Attribute {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&Description(self))?;
        seq.serialize_element(&self.values)?;
        seq.end()
    }
}

struct Description<'a>(&'a Attribute);

impl Serialize for Description<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = if self.0.is_numeric() { "numeric" } else { "string" };
        let mut seq = serializer.serialize_seq(Some(6))?;
        seq.serialize_element("scope")?;
        seq.serialize_element("public")?;
        seq.serialize_element("type")?;
        seq.serialize_element(kind)?;
        seq.serialize_element("name")?;
        seq.serialize_element(self.0.name.as_str())?;
        seq.end()
    }
}

impl Serialize for AttributeValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValues::Numeric { size, data } => {
                let mut seq = serializer.serialize_seq(Some(6))?;
                seq.serialize_element("size")?;
                seq.serialize_element(size)?;
                seq.serialize_element("storage")?;
                seq.serialize_element(data.storage().tag())?;
                seq.serialize_element("values")?;
                seq.serialize_element(&NumericBlock { size: *size, data })?;
                seq.end()
            }
            AttributeValues::Strings(dictionary) => {
                let mut seq = serializer.serialize_seq(Some(8))?;
                seq.serialize_element("size")?;
                seq.serialize_element(&1)?;
                seq.serialize_element("storage")?;
                seq.serialize_element(Storage::Int32.tag())?;
                seq.serialize_element("strings")?;
                seq.serialize_element(dictionary.strings())?;
                seq.serialize_element("indices")?;
                seq.serialize_element(&IndexBlock(dictionary.indices()))?;
                seq.end()
            }
        }
    }
}

/// `"size",n,"storage",tag,("arrays"|"tuples"),...` inside the `values` key.
struct NumericBlock<'a> {
    size: usize,
    data: &'a NumericData,
}

impl Serialize for NumericBlock<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(6))?;
        seq.serialize_element("size")?;
        seq.serialize_element(&self.size)?;
        seq.serialize_element("storage")?;
        seq.serialize_element(self.data.storage().tag())?;
        match self.data {
            NumericData::Float32(v) => serialize_components(&mut seq, self.size, v)?,
            NumericData::Int32(v) => serialize_components(&mut seq, self.size, v)?,
        }
        seq.end()
    }
}

fn serialize_components<Q, T>(seq: &mut Q, size: usize, values: &[T]) -> Result<(), Q::Error>
where
    Q: SerializeSeq,
    T: Serialize,
{
    if size == 1 {
        seq.serialize_element("arrays")?;
        seq.serialize_element(&[values])
    } else {
        seq.serialize_element("tuples")?;
        seq.serialize_element(&Tuples { size, values })
    }
}

struct Tuples<'a, T> {
    size: usize,
    values: &'a [T],
}

impl<T: Serialize> Serialize for Tuples<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.values.len() / self.size))?;
        for tuple in self.values.chunks_exact(self.size) {
            seq.serialize_element(tuple)?;
        }
        seq.end()
    }
}

/// Dictionary slots, always written as a width-1 `int32` array.
struct IndexBlock<'a>(&'a [u32]);

impl Serialize for IndexBlock<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(6))?;
        seq.serialize_element("size")?;
        seq.serialize_element(&1)?;
        seq.serialize_element("storage")?;
        seq.serialize_element(Storage::Int32.tag())?;
        seq.serialize_element("arrays")?;
        seq.serialize_element(&[self.0])?;
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_first_occurrence_order() {
        let dictionary = StringDictionary::from_values(["wood", "metal", "wood", "glass", "metal"]);
        assert_eq!(dictionary.strings(), &["wood", "metal", "glass"]);
        assert_eq!(dictionary.indices(), &[0, 1, 0, 2, 1]);
        assert_eq!(dictionary.get(3), "glass");
        assert_eq!(dictionary.len(), 5);
    }

    #[test]
    fn test_dictionary_empty() {
        let dictionary = StringDictionary::from_values(Vec::<String>::new());
        assert!(dictionary.is_empty());
        assert!(dictionary.strings().is_empty());
    }

    #[test]
    fn test_float_tuples_layout() {
        let att = Attribute::float_tuples("P", AttributeClass::Point, &[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(att.size(), 3);
        assert_eq!(att.len(), 2);
        assert_eq!(att.storage(), Storage::Fpreal32);
        assert_eq!(att.float_tuple(1), Some(&[4.0, 5.0, 6.0][..]));
        assert_eq!(att.float_tuple(2), None);
        assert_eq!(att.int_tuple(0), None);
    }

    #[test]
    fn test_string_attribute_accessors() {
        let att = Attribute::strings("materialName", AttributeClass::Primitive, ["a", "b", "a"]);
        assert!(!att.is_numeric());
        assert_eq!(att.size(), 1);
        assert_eq!(att.storage(), Storage::Int32);
        assert_eq!(att.len(), 3);
        assert_eq!(att.string(2), Some("a"));
        assert_eq!(att.string(3), None);
    }

    #[test]
    #[should_panic(expected = "tuples of 3")]
    fn test_ragged_numeric_data_panics() {
        Attribute::numeric("P", AttributeClass::Point, 3, NumericData::Float32(vec![0.0; 4]));
    }

    #[test]
    fn test_serialize_tuples() {
        let att = Attribute::float_tuples("N", AttributeClass::Vertex, &[[0.0, 1.0, 0.0], [0.5, 0.0, -1.0]]);
        let json = serde_json::to_string(&att).unwrap();
        assert_eq!(
            json,
            r#"[["scope","public","type","numeric","name","N"],["size",3,"storage","fpreal32","values",["size",3,"storage","fpreal32","tuples",[[0.0,1.0,0.0],[0.5,0.0,-1.0]]]]]"#
        );
    }

    #[test]
    fn test_serialize_arrays() {
        let att = Attribute::ints("renderQueue", AttributeClass::Primitive, vec![2000, 3000]);
        let json = serde_json::to_string(&att).unwrap();
        assert_eq!(
            json,
            r#"[["scope","public","type","numeric","name","renderQueue"],["size",1,"storage","int32","values",["size",1,"storage","int32","arrays",[[2000,3000]]]]]"#
        );
    }

    #[test]
    fn test_serialize_strings() {
        let att = Attribute::strings("meshName", AttributeClass::Primitive, ["Cube", "Cube"]);
        let json = serde_json::to_string(&att).unwrap();
        assert_eq!(
            json,
            r#"[["scope","public","type","string","name","meshName"],["size",1,"storage","int32","strings",["Cube"],"indices",["size",1,"storage","int32","arrays",[[0,0]]]]]"#
        );
    }

    #[test]
    fn test_serialize_escapes_strings() {
        let att = Attribute::strings("baseMap", AttributeClass::Primitive, [r#"C:\tex\"a".png"#]);
        let json = serde_json::to_string(&att).unwrap();
        assert!(json.contains(r#""C:\\tex\\\"a\".png""#));
    }

    #[test]
    fn test_section_keys_and_cardinality() {
        assert_eq!(AttributeClass::Detail.section_key(), "globalattributes");
        assert_eq!(AttributeClass::Point.cardinality(4, 6, 2), 4);
        assert_eq!(AttributeClass::Vertex.cardinality(4, 6, 2), 6);
        assert_eq!(AttributeClass::Primitive.cardinality(4, 6, 2), 2);
        assert_eq!(AttributeClass::Detail.cardinality(4, 6, 2), 1);
    }
}
