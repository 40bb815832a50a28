//! Document sinks: a directory of `.geo` files and an in-memory map.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::traits::Sink;

pub const GEO_EXTENSION: &str = "geo";

/// Writes each document to `<root>/<destination>.geo`.
#[derive(Debug)]
pub struct FileSink {
    root: PathBuf,
    written: BTreeSet<PathBuf>,
}

impl FileSink {
    /// Creates the sink, creating `root` if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root, written: BTreeSet::new() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files written by this sink so far, in path order.
    pub fn written(&self) -> impl Iterator<Item = &Path> + '_ {
        self.written.iter().map(PathBuf::as_path)
    }

    pub fn path_for(&self, destination: &str) -> PathBuf {
        let is_geo = Path::new(destination)
            .extension()
            .map_or(false, |ext| ext == GEO_EXTENSION);
        if is_geo {
            self.root.join(destination)
        } else {
            self.root.join(format!("{destination}.{GEO_EXTENSION}"))
        }
    }

    /// Removes `.geo` files in the root that this sink did not write.
    ///
    /// Returns the removed paths in sorted order. Other files and
    /// subdirectories are left alone.
    pub fn prune_stale(&self) -> io::Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let is_geo = path.extension().map_or(false, |ext| ext == GEO_EXTENSION);
            if !is_geo || !path.is_file() || self.written.contains(&path) {
                continue;
            }
            fs::remove_file(&path)?;
            log::debug!("removed stale {}", path.display());
            removed.push(path);
        }
        removed.sort();
        Ok(removed)
    }
}

impl Sink for FileSink {
    fn persist(&mut self, destination: &str, text: &str) -> io::Result<()> {
        let path = self.path_for(destination);
        fs::write(&path, text)?;
        self.written.insert(path);
        Ok(())
    }
}

/// Keeps documents in memory, keyed by destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    documents: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, destination: &str) -> Option<&str> {
        self.documents.get(destination).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.documents.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.documents
    }
}

impl Sink for MemorySink {
    fn persist(&mut self, destination: &str, text: &str) -> io::Result<()> {
        self.documents.insert(destination.to_string(), text.to_string());
        Ok(())
    }
}
