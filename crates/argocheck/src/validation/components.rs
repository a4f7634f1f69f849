use std::collections::BTreeSet;
use std::path::Path;

use super::Validator;
use crate::error::{Result, ValidationError};
use crate::fs::EntryKind;
use crate::kustomization::{lookup_descriptor, ComponentDescriptor, DESCRIPTOR_FILE};

/// Returns true for a `base` layer, which is only built as part of an overlay.
pub fn is_base_layer(dir: &Path) -> bool {
    dir.file_name().is_some_and(|name| name == "base")
}

/// Returns the files of `listing` missing from `used`, sorted.
pub fn unreferenced_files(listing: &BTreeSet<String>, used: &BTreeSet<String>) -> Vec<String> {
    listing.difference(used).cloned().collect()
}

impl Validator<'_> {
    /// Walks each component root and checks every directory that has a descriptor.
    pub fn check_components<S: AsRef<str>>(&self, roots: &[S]) -> Result<()> {
        for root in roots {
            let root = root.as_ref();
            let _span = tracing::info_span!("validation.components", root).entered();
            log::info!("Checking components in {}", root);

            self.fs
                .walk(&self.base_dir.join(root), &mut |path, kind| match kind {
                    EntryKind::Directory => self.check_directory(path),
                    EntryKind::File => Ok(()),
                })?;
        }
        Ok(())
    }

    /// Checks `dir` as a component if it has a descriptor; other directories pass.
    pub(crate) fn check_directory(&self, dir: &Path) -> Result<()> {
        match lookup_descriptor(self.fs, dir).map_err(|e| ValidationError::walk(dir, e))? {
            Some(descriptor) => self.check_component(dir, &descriptor),
            None => Ok(()),
        }
    }

    /// Checks references, then builds the component unless it is a `base` layer.
    pub fn check_component(&self, dir: &Path, descriptor_path: &Path) -> Result<()> {
        log::debug!("Checking component {}", self.display_path(dir));

        let descriptor = ComponentDescriptor::load(self.fs, descriptor_path)?;
        self.check_references(dir, &descriptor)?;

        if is_base_layer(dir) {
            log::debug!("Not building base layer {}", self.display_path(dir));
            return Ok(());
        }
        self.check_build(dir)
    }

    fn check_references(&self, dir: &Path, descriptor: &ComponentDescriptor) -> Result<()> {
        let used = descriptor.used_files()?;
        let listing = self.directory_listing(dir)?;

        let unused = unreferenced_files(&listing, &used);
        if unused.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::UnreferencedFile {
                descriptor: self.display_path(descriptor.path()),
                files: unused,
            })
        }
    }

    /// Regular files directly inside `dir`, without the descriptor.
    fn directory_listing(&self, dir: &Path) -> Result<BTreeSet<String>> {
        let entries = self
            .fs
            .read_dir(dir)
            .map_err(|e| ValidationError::walk(dir, e))?;

        Ok(entries
            .into_iter()
            .filter(|entry| entry.is_file() && entry.name != DESCRIPTOR_FILE)
            .map(|entry| entry.name)
            .collect())
    }

    fn check_build(&self, dir: &Path) -> Result<()> {
        log::debug!("Building {}", self.display_path(dir));
        self.engine
            .build(dir)
            .map_err(|message| ValidationError::BuildFailure {
                path: dir.to_path_buf(),
                message,
            })
    }
}
