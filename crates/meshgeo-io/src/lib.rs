//! Meshgeo I/O
//!
//! Sources and sinks around the `meshgeo-core` converter: a Wavefront
//! OBJ/MTL reader that produces [`SceneObject`]s, file and in-memory
//! [`Sink`]s, and [`export_objects`] for batch conversion.

pub mod error;
pub mod export;
pub mod mtl_reader;
pub mod obj_reader;
pub mod sink;
pub mod traits;

pub use error::{IoError, Result};
pub use export::{export_objects, output_name, ExportFailure, ExportReport};
pub use mtl_reader::MtlReader;
pub use obj_reader::{parse_obj, ObjReader};
pub use sink::{FileSink, MemorySink};
pub use traits::{Reader, SceneObject, Sink};
