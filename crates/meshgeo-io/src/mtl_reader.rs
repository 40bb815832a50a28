//! Wavefront MTL reader.
//!
//! Statements map onto the property names the converter's default material
//! schema looks up:
//!
//! | MTL                         | Properties                      |
//! |-----------------------------|---------------------------------|
//! | `Kd` + `d` (or `Tr`)        | `_BaseColor`, `_Color`          |
//! | `Pm`                        | `_Metallic`                     |
//! | `Ns`                        | `_Smoothness` (Ns / 1000)       |
//! | `map_Kd`                    | `_BaseMap`, `_MainTex`          |
//! | `map_Bump`, `bump`, `norm`  | `_BumpMap`                      |
//!
//! Translucent materials (`d < 1`) get render queue 3000, others 2000.

use std::fs;
use std::path::{Path, PathBuf};

use meshgeo_core::material::DEFAULT_RENDER_QUEUE;
use meshgeo_core::MaterialProperties;

use crate::error::{IoError, Result};
use crate::obj_reader::{parse_components, Statement};

pub const TRANSPARENT_RENDER_QUEUE: i32 = 3000;

/// Reads materials from an MTL file.
#[derive(Debug)]
pub struct MtlReader {
    path: PathBuf,
}

impl MtlReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(IoError::FileNotFound { path });
        }
        Ok(Self { path })
    }

    /// Reads every material, in file order.
    pub fn read_materials(&mut self) -> Result<Vec<MaterialProperties>> {
        let source = fs::read_to_string(&self.path)?;
        let base_dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        parse_mtl(&source, base_dir, &self.path)
    }
}

/// Parses MTL text. Texture paths are resolved against `base_dir`; `origin`
/// only labels parse errors.
pub fn parse_mtl(source: &str, base_dir: &Path, origin: &Path) -> Result<Vec<MaterialProperties>> {
    let mut materials = Vec::new();
    let mut current: Option<PendingMaterial> = None;

    for (index, line) in source.lines().enumerate() {
        let Some(statement) = Statement::parse(line, index + 1, origin) else {
            continue;
        };
        if statement.keyword == "newmtl" {
            if let Some(done) = current.take() {
                materials.push(done.finish());
            }
            current = Some(PendingMaterial::new(&statement.rest()));
            continue;
        }
        let Some(material) = current.as_mut() else {
            log::debug!("{}:{}: '{}' before newmtl ignored", origin.display(), statement.line, statement.keyword);
            continue;
        };
        match statement.keyword.to_ascii_lowercase().as_str() {
            "kd" => {
                let [r, g, b] = parse_components(&statement)?;
                material.diffuse = Some([r, g, b]);
            }
            "d" => {
                let [d] = parse_components(&statement)?;
                material.opacity = Some(d);
            }
            "tr" => {
                let [tr] = parse_components(&statement)?;
                material.opacity = Some(1.0 - tr);
            }
            "pm" => {
                let [pm] = parse_components(&statement)?;
                material.metallic = Some(pm);
            }
            "ns" => {
                let [ns] = parse_components(&statement)?;
                material.shininess = Some(ns);
            }
            "map_kd" => material.base_map = Some(texture_path(&statement, base_dir)?),
            "map_bump" | "bump" | "norm" => material.bump_map = Some(texture_path(&statement, base_dir)?),
            _ => {}
        }
    }
    if let Some(done) = current {
        materials.push(done.finish());
    }
    Ok(materials)
}

/// Last argument of a map statement; earlier arguments are map options.
fn texture_path(statement: &Statement<'_>, base_dir: &Path) -> Result<String> {
    let file = statement.args.last().ok_or_else(|| statement.error("missing texture file"))?;
    let path = Path::new(file);
    let resolved = if path.is_absolute() { path.to_path_buf() } else { base_dir.join(path) };
    Ok(resolved.to_string_lossy().into_owned())
}

#[derive(Debug, Default)]
struct PendingMaterial {
    name: String,
    diffuse: Option<[f32; 3]>,
    opacity: Option<f32>,
    metallic: Option<f32>,
    shininess: Option<f32>,
    base_map: Option<String>,
    bump_map: Option<String>,
}

impl PendingMaterial {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Self::default() }
    }

    fn finish(self) -> MaterialProperties {
        let mut material = MaterialProperties::new(self.name);
        let opacity = self.opacity.unwrap_or(1.0);
        if self.diffuse.is_some() || self.opacity.is_some() {
            let [r, g, b] = self.diffuse.unwrap_or([1.0; 3]);
            let color = [r, g, b, opacity];
            material = material.with_color("_BaseColor", color).with_color("_Color", color);
        }
        if let Some(metallic) = self.metallic {
            material = material.with_float("_Metallic", metallic);
        }
        if let Some(ns) = self.shininess {
            material = material.with_float("_Smoothness", (ns / 1000.0).clamp(0.0, 1.0));
        }
        if let Some(path) = self.base_map {
            material = material.with_texture("_BaseMap", path.clone()).with_texture("_MainTex", path);
        }
        if let Some(path) = self.bump_map {
            material = material.with_texture("_BumpMap", path);
        }
        let queue = if opacity < 1.0 { TRANSPARENT_RENDER_QUEUE } else { DEFAULT_RENDER_QUEUE };
        material.with_render_queue(queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgeo_core::MaterialSource;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const WOOD: &str = "\
# two materials
newmtl Wood
Kd 0.5 0.25 0.125
Ns 250
map_Kd -s 1 1 1 textures/wood.png

newmtl Glass
Kd 0.9 0.9 1.0
d 0.25
Pm 0.75
map_Bump glass_n.png
";

    #[test]
    fn test_parse_properties() {
        let materials = parse_mtl(WOOD, Path::new("assets"), Path::new("scene.mtl")).unwrap();
        assert_eq!(materials.len(), 2);

        let wood = &materials[0];
        assert_eq!(wood.name(), "Wood");
        assert_eq!(wood.get_color("_BaseColor"), [0.5, 0.25, 0.125, 1.0]);
        assert_eq!(wood.get_color("_Color"), [0.5, 0.25, 0.125, 1.0]);
        assert_eq!(wood.get_float("_Smoothness"), 0.25);
        assert!(!wood.has_property("_Metallic"));
        let expected = Path::new("assets").join("textures/wood.png");
        assert_eq!(wood.get_texture_path("_BaseMap"), expected.to_string_lossy());
        assert_eq!(wood.render_queue(), 2000);

        let glass = &materials[1];
        assert_eq!(glass.get_color("_BaseColor")[3], 0.25);
        assert_eq!(glass.get_float("_Metallic"), 0.75);
        assert!(glass.has_property("_BumpMap"));
        assert_eq!(glass.render_queue(), 3000);
    }

    #[test]
    fn test_shininess_is_clamped() {
        let materials = parse_mtl("newmtl Shiny\nNs 4000\n", Path::new(""), Path::new("a.mtl")).unwrap();
        assert_eq!(materials[0].get_float("_Smoothness"), 1.0);
    }

    #[test]
    fn test_bad_number_reports_line() {
        let err = parse_mtl("newmtl A\nKd 1 x 1\n", Path::new(""), Path::new("bad.mtl")).unwrap_err();
        match err {
            IoError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_read_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "newmtl Plain").unwrap();
        writeln!(file, "Tr 0.5").unwrap();
        file.flush().unwrap();

        let materials = MtlReader::open(file.path()).unwrap().read_materials().unwrap();
        assert_eq!(materials.len(), 1);
        assert_eq!(materials[0].get_color("_Color"), [1.0, 1.0, 1.0, 0.5]);
        assert_eq!(materials[0].render_queue(), 3000);
    }

    #[test]
    fn test_missing_file() {
        let err = MtlReader::open("does/not/exist.mtl").unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
