//! Batch export of scene objects to a sink.

use meshgeo_core::{convert, to_geo_string, ConvertOptions};

use crate::error::{IoError, Result};
use crate::traits::{SceneObject, Sink};

/// A mesh that could not be exported.
#[derive(Debug)]
pub struct ExportFailure {
    pub object: String,
    pub error: IoError,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    /// Destinations written, in batch order.
    pub written: Vec<String>,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Output name for the object at `index` in a batch: `<name>_<index>`.
///
/// Characters outside `[A-Za-z0-9._-]` become `_`, so the result is a
/// plain file name on every platform.
pub fn output_name(name: &str, index: usize) -> String {
    let mut stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        stem = "mesh".to_string();
    }
    format!("{stem}_{index}")
}

/// Converts every object and persists it to `sink`.
///
/// A failing object is logged and recorded; the rest of the batch still runs.
pub fn export_objects<S: Sink + ?Sized>(objects: &[SceneObject], options: &ConvertOptions, sink: &mut S) -> ExportReport {
    let mut report = ExportReport::default();
    for (index, object) in objects.iter().enumerate() {
        let destination = output_name(&object.info.name, index);
        match export_object(object, options, &destination, sink) {
            Ok(()) => {
                log::info!("exported '{}' to {}", object.info.name, destination);
                report.written.push(destination);
            }
            Err(error) => {
                log::error!("failed to export '{}': {}", object.info.name, error);
                report.failures.push(ExportFailure { object: object.info.name.clone(), error });
            }
        }
    }
    log::info!("{} exported, {} failed", report.written.len(), report.failures.len());
    report
}

fn export_object<S: Sink + ?Sized>(
    object: &SceneObject,
    options: &ConvertOptions,
    destination: &str,
    sink: &mut S,
) -> Result<()> {
    let materials = object.material_sources();
    let document = convert(&object.mesh, &materials, &object.info, options)?;
    let text = to_geo_string(&document)?;
    sink.persist(destination, &text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use meshgeo_core::{GeoError, MeshData, ObjectInfo};
    use proptest::prelude::*;

    fn triangle(name: &str) -> SceneObject {
        let mesh = MeshData {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![0, 1, 2],
            ..MeshData::new(name)
        }
        .with_single_sub_mesh();
        SceneObject { mesh, materials: vec![None], info: ObjectInfo::new(name) }
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name("Cube", 0), "Cube_0");
        assert_eq!(output_name("My Mesh/part:1", 7), "My_Mesh_part_1_7");
        assert_eq!(output_name("", 2), "mesh_2");
        assert_eq!(output_name("..", 3), "mesh_3");
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let mut broken = triangle("Broken");
        broken.mesh.indices = vec![0, 1, 9];
        let objects = vec![triangle("A"), broken, triangle("B")];

        let mut sink = MemorySink::new();
        let report = export_objects(&objects, &ConvertOptions::new(), &mut sink);

        assert!(!report.is_success());
        assert_eq!(report.written, vec!["A_0", "B_2"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].object, "Broken");
        assert!(matches!(
            report.failures[0].error,
            IoError::Convert(GeoError::IndexOutOfRange { index: 9, .. })
        ));
        assert_eq!(sink.len(), 2);
        assert!(sink.get("A_0").unwrap().starts_with("[\"pointcount\",3,"));
    }

    proptest! {
        #[test]
        fn output_names_are_plain(name in "\\PC{0,16}", index in 0usize..1000) {
            let out = output_name(&name, index);
            prop_assert!(out.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
            let suffix = format!("_{}", index);
            prop_assert!(out.ends_with(&suffix));
        }
    }
}
