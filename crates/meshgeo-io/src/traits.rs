//! Source and sink interfaces shared by readers, exporters and the CLI.
//!
//! ```ignore
//! use meshgeo_io::{export_objects, FileSink, ObjReader, Reader};
//!
//! let objects = ObjReader::open("crate.obj")?.read_objects()?;
//! let mut sink = FileSink::new("out")?;
//! let report = export_objects(&objects, &ConvertOptions::new(), &mut sink);
//! ```

use std::io;
use std::path::Path;

use meshgeo_core::{MaterialProperties, MaterialSource, MeshData, ObjectInfo};

use crate::error::Result;

/// One renderable object: mesh, material slots and object metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub mesh: MeshData,
    /// One slot per sub-mesh; `None` when no material is bound.
    pub materials: Vec<Option<MaterialProperties>>,
    pub info: ObjectInfo,
}

impl SceneObject {
    /// Material slots as the trait objects the converter consumes.
    pub fn material_sources(&self) -> Vec<Option<&dyn MaterialSource>> {
        self.materials
            .iter()
            .map(|slot| slot.as_ref().map(|m| m as &dyn MaterialSource))
            .collect()
    }
}

/// Common interface for object readers.
pub trait Reader: Sized {
    /// Open a file for reading.
    fn open<P: AsRef<Path>>(path: P) -> Result<Self>;

    /// Read every object in the file.
    fn read_objects(&mut self) -> Result<Vec<SceneObject>>;
}

/// Destination for serialized documents.
///
/// `destination` is a bare file name; sinks decide where and how it is stored.
pub trait Sink {
    fn persist(&mut self, destination: &str, text: &str) -> io::Result<()>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn persist(&mut self, destination: &str, text: &str) -> io::Result<()> {
        (**self).persist(destination, text)
    }
}
