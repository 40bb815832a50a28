//! Wavefront OBJ reader.
//!
//! Every `o` statement starts a new [`SceneObject`]. Vertex data (`v`, `vt`,
//! `vn`) is shared across the file as OBJ indexing requires. Faces are fan
//! triangulated and each distinct `v/vt/vn` corner becomes one source vertex,
//! so the welder sees exactly the corners the file describes. Triangles are
//! grouped per `usemtl` material into contiguous sub-meshes, in first-use order.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use meshgeo_core::{MaterialProperties, MeshData, ObjectInfo, SubMesh};

use crate::error::{IoError, Result};
use crate::mtl_reader::MtlReader;
use crate::traits::{Reader, SceneObject};

/// OBJ format reader.
#[derive(Debug)]
pub struct ObjReader {
    path: PathBuf,
}

impl ObjReader {
    /// Open an OBJ file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(IoError::FileNotFound { path });
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all objects, loading `mtllib` files relative to the OBJ file.
    pub fn read_objects(&mut self) -> Result<Vec<SceneObject>> {
        let source = fs::read_to_string(&self.path)?;
        let base_dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        let default_name = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "mesh".to_string());
        parse_obj(&source, &self.path, &default_name, |library| {
            let mtl_path = base_dir.join(library);
            match MtlReader::open(&mtl_path) {
                Ok(mut reader) => reader.read_materials(),
                Err(IoError::FileNotFound { path }) => {
                    log::warn!("material library {} not found", path.display());
                    Ok(Vec::new())
                }
                Err(e) => Err(e),
            }
        })
    }
}

impl Reader for ObjReader {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        ObjReader::open(path)
    }

    fn read_objects(&mut self) -> Result<Vec<SceneObject>> {
        ObjReader::read_objects(self)
    }
}

/// Parses OBJ text.
///
/// `load_library` is called for each `mtllib` file name. Objects without
/// faces are skipped; objects before the first `o` take `default_name`.
pub fn parse_obj<F>(source: &str, origin: &Path, default_name: &str, mut load_library: F) -> Result<Vec<SceneObject>>
where
    F: FnMut(&str) -> Result<Vec<MaterialProperties>>,
{
    let mut state = ObjState::default();
    let mut materials: HashMap<String, MaterialProperties> = HashMap::new();
    let mut current_material: Option<String> = None;
    let mut objects = Vec::new();
    let mut object = ObjectBuilder::new(default_name);

    for (index, line) in source.lines().enumerate() {
        let Some(statement) = Statement::parse(line, index + 1, origin) else {
            continue;
        };
        match statement.keyword {
            "v" => {
                let p: [f32; 3] = parse_components(&statement)?;
                state.positions.push(p);
            }
            "vt" => {
                let uv: [f32; 2] = parse_components(&statement)?;
                state.uvs.push(uv);
            }
            "vn" => {
                let n: [f32; 3] = parse_components(&statement)?;
                state.normals.push(n);
            }
            "f" => {
                if statement.args.len() < 3 {
                    return Err(statement.error("face needs at least 3 corners"));
                }
                let corners = statement
                    .args
                    .iter()
                    .map(|token| state.resolve_corner(token, &statement))
                    .collect::<Result<Vec<_>>>()?;
                object.add_face(&corners, current_material.as_deref());
            }
            "o" => {
                let name = statement.rest();
                if let Some(done) = std::mem::replace(&mut object, ObjectBuilder::new(&name)).finish(&state, &materials) {
                    objects.push(done);
                }
            }
            "usemtl" => {
                let name = statement.rest();
                if !materials.contains_key(&name) {
                    log::debug!("{}:{}: material '{}' is not defined", origin.display(), statement.line, name);
                }
                current_material = Some(name);
            }
            "mtllib" => {
                for library in &statement.args {
                    for material in load_library(library)? {
                        materials.insert(material.name.clone(), material);
                    }
                }
            }
            "g" | "s" | "l" | "p" => {}
            other => log::trace!("{}:{}: ignoring '{}'", origin.display(), statement.line, other),
        }
    }
    if let Some(done) = object.finish(&state, &materials) {
        objects.push(done);
    }
    Ok(objects)
}

/// One whitespace-separated statement with its location.
#[derive(Debug)]
pub(crate) struct Statement<'a> {
    pub keyword: &'a str,
    pub args: Vec<&'a str>,
    pub line: usize,
    origin: &'a Path,
}

impl<'a> Statement<'a> {
    /// Returns `None` for blank and comment-only lines.
    pub fn parse(line: &'a str, number: usize, origin: &'a Path) -> Option<Self> {
        let content = line.split('#').next().unwrap_or("");
        let mut tokens = content.split_whitespace();
        let keyword = tokens.next()?;
        Some(Self { keyword, args: tokens.collect(), line: number, origin })
    }

    /// Arguments joined by single spaces, for names.
    pub fn rest(&self) -> String {
        self.args.join(" ")
    }

    pub fn error(&self, message: impl Into<String>) -> IoError {
        IoError::Parse { path: self.origin.to_path_buf(), line: self.line, message: message.into() }
    }
}

/// Parses the first `N` arguments as floats; extra arguments are ignored.
pub(crate) fn parse_components<const N: usize>(statement: &Statement<'_>) -> Result<[f32; N]> {
    if statement.args.len() < N {
        return Err(statement.error(format!(
            "'{}' needs {} values, found {}",
            statement.keyword,
            N,
            statement.args.len()
        )));
    }
    let mut out = [0.0f32; N];
    for (slot, token) in out.iter_mut().zip(&statement.args) {
        *slot = token
            .parse()
            .map_err(|_| statement.error(format!("invalid number '{token}'")))?;
    }
    Ok(out)
}

/// File-global vertex data.
#[derive(Debug, Default)]
struct ObjState {
    positions: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
}

/// Zero-based `(v, vt, vn)` references of one face corner.
type Corner = (usize, Option<usize>, Option<usize>);

impl ObjState {
    fn resolve_corner(&self, token: &str, statement: &Statement<'_>) -> Result<Corner> {
        let mut parts = token.split('/');
        let v = parts.next().unwrap_or("");
        let vt = parts.next().filter(|s| !s.is_empty());
        let vn = parts.next().filter(|s| !s.is_empty());
        let v = resolve_index(v, self.positions.len(), statement)?;
        let vt = vt.map(|s| resolve_index(s, self.uvs.len(), statement)).transpose()?;
        let vn = vn.map(|s| resolve_index(s, self.normals.len(), statement)).transpose()?;
        Ok((v, vt, vn))
    }
}

/// One-based index, or negative index counting back from the latest element.
fn resolve_index(token: &str, count: usize, statement: &Statement<'_>) -> Result<usize> {
    let raw: i64 = token
        .parse()
        .map_err(|_| statement.error(format!("invalid index '{token}'")))?;
    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r - 1),
        r => Some(count as i64 + r),
    };
    match resolved {
        Some(i) if i >= 0 && (i as usize) < count => Ok(i as usize),
        _ => Err(statement.error(format!("index {raw} out of range for {count} elements"))),
    }
}

#[derive(Debug)]
struct ObjectBuilder {
    name: String,
    corners: Vec<Corner>,
    corner_ids: HashMap<Corner, u32>,
    /// Triangles per material, in first-use order.
    groups: Vec<(Option<String>, Vec<[u32; 3]>)>,
}

impl ObjectBuilder {
    fn new(name: &str) -> Self {
        Self { name: name.to_string(), corners: Vec::new(), corner_ids: HashMap::new(), groups: Vec::new() }
    }

    fn corner_id(&mut self, corner: Corner) -> u32 {
        let next = self.corners.len() as u32;
        let id = *self.corner_ids.entry(corner).or_insert(next);
        if id == next {
            self.corners.push(corner);
        }
        id
    }

    fn add_face(&mut self, corners: &[Corner], material: Option<&str>) {
        let ids: Vec<u32> = corners.iter().map(|&c| self.corner_id(c)).collect();
        let group = match self.groups.iter().position(|(m, _)| m.as_deref() == material) {
            Some(g) => g,
            None => {
                self.groups.push((material.map(str::to_string), Vec::new()));
                self.groups.len() - 1
            }
        };
        let triangles = &mut self.groups[group].1;
        for i in 1..ids.len() - 1 {
            triangles.push([ids[0], ids[i], ids[i + 1]]);
        }
    }

    fn finish(self, state: &ObjState, library: &HashMap<String, MaterialProperties>) -> Option<SceneObject> {
        if self.groups.is_empty() {
            if !self.corners.is_empty() {
                log::debug!("object '{}' has no faces", self.name);
            }
            return None;
        }

        let mut mesh = MeshData::new(self.name.clone());
        mesh.positions = self.corners.iter().map(|&(v, _, _)| state.positions[v]).collect();
        mesh.uvs = optional_channel(&self.name, "uv", self.corners.iter().map(|&(_, vt, _)| vt.map(|i| state.uvs[i])));
        mesh.normals =
            optional_channel(&self.name, "normal", self.corners.iter().map(|&(_, _, vn)| vn.map(|i| state.normals[i])));

        let mut materials = Vec::with_capacity(self.groups.len());
        for (material, triangles) in self.groups {
            let start = mesh.indices.len() / 3;
            mesh.sub_meshes.push(SubMesh::new(start, triangles.len()));
            mesh.indices.extend(triangles.into_iter().flatten());
            materials.push(material.and_then(|name| library.get(&name).cloned()));
        }

        Some(SceneObject { mesh, materials, info: ObjectInfo::new(self.name) })
    }
}

/// Empty when no corner references the channel; missing entries are zero-filled.
fn optional_channel<T, I>(object: &str, channel: &str, values: I) -> Vec<T>
where
    T: Copy + Default,
    I: Iterator<Item = Option<T>>,
{
    let values: Vec<Option<T>> = values.collect();
    let present = values.iter().filter(|v| v.is_some()).count();
    if present == 0 {
        return Vec::new();
    }
    if present < values.len() {
        log::warn!("object '{object}': {} corners lack a {channel}, using zero", values.len() - present);
    }
    values.into_iter().map(Option::unwrap_or_default).collect()
}
