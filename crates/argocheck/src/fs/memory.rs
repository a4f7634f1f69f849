use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Component, Path, PathBuf};

use super::{DirEntry, EntryKind, FileSystem, WalkFn};
use crate::error::{Result, ValidationError};

/// In-memory [`FileSystem`].
///
/// Paths are compared after lexical normalization, so `a/./b` and `a/c/../b`
/// name the same entry. Adding a file creates its parent directories.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory (and its ancestors).
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.add_dir(path);
        self
    }

    /// Adds a file (and its parent directories).
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.add_file(path, contents);
        self
    }

    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path, contents.into());
    }

    fn kind_of(&self, path: &Path) -> Option<EntryKind> {
        if self.dirs.contains(path) {
            Some(EntryKind::Directory)
        } else if self.files.contains_key(path) {
            Some(EntryKind::File)
        } else {
            None
        }
    }

    fn children(&self, dir: &Path) -> Vec<(PathBuf, EntryKind)> {
        let dirs = self
            .dirs
            .iter()
            .filter(|p| p.parent() == Some(dir))
            .map(|p| (p.clone(), EntryKind::Directory));
        let files = self
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .map(|p| (p.clone(), EntryKind::File));

        let mut children: Vec<_> = dirs.chain(files).collect();
        children.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
        children
    }

    fn walk_from(&self, path: &Path, kind: EntryKind, visit: &mut WalkFn<'_>) -> Result<()> {
        visit(path, kind)?;
        if kind == EntryKind::Directory {
            for (child, child_kind) in self.children(path) {
                self.walk_from(&child, child_kind, visit)?;
            }
        }
        Ok(())
    }
}

impl FileSystem for MemoryFs {
    fn walk(&self, root: &Path, visit: &mut WalkFn<'_>) -> Result<()> {
        let root = normalize(root);
        match self.kind_of(&root) {
            Some(kind) => self.walk_from(&root, kind, visit),
            None => Err(ValidationError::walk(&root, not_found(&root))),
        }
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let path = normalize(path);
        match self.files.get(&path) {
            Some(contents) => Ok(contents.clone()),
            None if self.dirs.contains(&path) => Err(io::Error::other(format!(
                "{} is a directory",
                path.display()
            ))),
            None => Err(not_found(&path)),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let path = normalize(path);
        match self.kind_of(&path) {
            Some(EntryKind::Directory) => Ok(self
                .children(&path)
                .into_iter()
                .map(|(child, kind)| DirEntry {
                    name: child
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    kind,
                })
                .collect()),
            Some(EntryKind::File) => Err(io::Error::other(format!(
                "{} is not a directory",
                path.display()
            ))),
            None => Err(not_found(&path)),
        }
    }

    fn exists(&self, path: &Path) -> io::Result<bool> {
        Ok(self.kind_of(&normalize(path)).is_some())
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
