//! Filesystem capability used by the validators.
//!
//! All I/O the checks perform goes through [`FileSystem`], so the same code runs
//! against a repository checkout ([`OsFs`]) or an in-memory tree ([`MemoryFs`]).

mod memory;
mod os;

use std::io;
use std::path::Path;

use crate::error::Result;

pub use memory::MemoryFs;
pub use os::OsFs;

/// Whether a walked entry is a regular file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Directory,
}

/// A direct child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Callback invoked for every entry of a walk.
pub type WalkFn<'a> = dyn FnMut(&Path, EntryKind) -> Result<()> + 'a;

/// Read-only view over a directory tree.
pub trait FileSystem {
    /// Visits `root` and everything below it, parents before their children and
    /// siblings in file name order.
    ///
    /// I/O failures are reported as `WalkFailure`; an error returned by `visit`
    /// stops the walk and is returned unchanged.
    fn walk(&self, root: &Path, visit: &mut WalkFn<'_>) -> Result<()>;

    /// Reads a whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Lists the direct children of a directory, sorted by name.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Checks whether a file or directory exists at `path`.
    fn exists(&self, path: &Path) -> io::Result<bool>;
}
