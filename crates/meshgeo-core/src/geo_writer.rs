//! `.geo` text serializer.
//!
//! A document is written as nested arrays of alternating keys and values:
//!
//! ```text
//! ["pointcount",4,
//! "vertexcount",6,
//! "primitivecount",2,
//! "topology",["pointref",["indices",[0,1,2,0,2,3]]],
//! "attributes",["pointattributes",[...],
//! "primitiveattributes",[...]],
//! "primitives",[[["type","Polygon_run"],["startvertex",0,"nprimitives",2,"nvertices_rle",[3,2]]]]]
//! ```
//!
//! The output is strict JSON. Each key/value pair of the top level and of the
//! `attributes` section starts on its own line; everything deeper is inline.
//! Serialization is a pure function of the document.

use std::io::{self, Write};

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::ser::Formatter;

use crate::attribute::AttributeClass;
use crate::document::{GeometryDocument, PrimitiveRun};
use crate::error::Result;
use crate::geometry_indices::PointIndex;

/// Arrays up to this nesting depth break lines between key/value pairs.
const PAIR_BREAK_DEPTH: usize = 2;

/// Serializes `document` into `writer`, followed by a newline.
pub fn write_geo<W: Write>(document: &GeometryDocument, mut writer: W) -> Result<()> {
    {
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, GeoFormatter::default());
        document.serialize(&mut serializer)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Serializes `document` into a string.
pub fn to_geo_string(document: &GeometryDocument) -> Result<String> {
    let mut buffer = Vec::new();
    write_geo(document, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

impl Serialize for GeometryDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(12))?;
        seq.serialize_element("pointcount")?;
        seq.serialize_element(&self.point_count())?;
        seq.serialize_element("vertexcount")?;
        seq.serialize_element(&self.vertex_count())?;
        seq.serialize_element("primitivecount")?;
        seq.serialize_element(&self.primitive_count())?;
        seq.serialize_element("topology")?;
        seq.serialize_element(&Topology(self.indices()))?;
        seq.serialize_element("attributes")?;
        seq.serialize_element(&AttributeSections(self))?;
        seq.serialize_element("primitives")?;
        seq.serialize_element(&[self.primitive_run()])?;
        seq.end()
    }
}

/// `["pointref",["indices",[...]]]`
struct Topology<'a>(&'a [PointIndex]);

impl Serialize for Topology<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element("pointref")?;
        seq.serialize_element(&("indices", self.0))?;
        seq.end()
    }
}

/// One `<class>attributes` pair per non-empty class.
struct AttributeSections<'a>(&'a GeometryDocument);

impl Serialize for AttributeSections<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let classes: Vec<AttributeClass> = AttributeClass::ALL
            .into_iter()
            .filter(|&class| !self.0.attributes(class).is_empty())
            .collect();
        let mut seq = serializer.serialize_seq(Some(classes.len() * 2))?;
        for class in classes {
            seq.serialize_element(class.section_key())?;
            seq.serialize_element(self.0.attributes(class))?;
        }
        seq.end()
    }
}

impl Serialize for PrimitiveRun {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&("type", Self::TYPE))?;
        seq.serialize_element(&(
            "startvertex",
            self.start_vertex,
            "nprimitives",
            self.primitive_count,
            "nvertices_rle",
            [self.vertices_per_primitive as usize, self.primitive_count],
        ))?;
        seq.end()
    }
}

/// Compact JSON with a line break before every key of the shallow key/value arrays.
#[derive(Debug, Default)]
struct GeoFormatter {
    /// Completed element count of every open array.
    open: Vec<usize>,
}

impl Formatter for GeoFormatter {
    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.open.push(0);
        writer.write_all(b"[")
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.open.pop();
        writer.write_all(b"]")
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            return Ok(());
        }
        writer.write_all(b",")?;
        let index = self.open.last().copied().unwrap_or(0);
        if self.open.len() <= PAIR_BREAK_DEPTH && index % 2 == 0 {
            writer.write_all(b"\n")?;
        }
        Ok(())
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        if let Some(count) = self.open.last_mut() {
            *count += 1;
        }
        Ok(())
    }
}
