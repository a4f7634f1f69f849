//! Checks over a GitOps repository.
//!
//! - Applications and ApplicationSets must point at an existing component.
//! - Every file in a component must be referenced by its `kustomization.yaml`.
//! - Every component, except `base` layers, must build.
//!
//! All checks stop at the first error.

mod apps;
mod components;

use std::path::{Path, PathBuf};

use crate::build::BuildEngine;
use crate::config::CheckOptions;
use crate::error::Result;
use crate::fs::FileSystem;

pub use components::{is_base_layer, unreferenced_files};

/// Runs the checks against one repository.
pub struct Validator<'a> {
    fs: &'a dyn FileSystem,
    engine: &'a dyn BuildEngine,
    base_dir: PathBuf,
}

impl<'a> Validator<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        engine: &'a dyn BuildEngine,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            engine,
            base_dir: base_dir.into(),
        }
    }

    /// Checks the application roots, then the component roots.
    pub fn check<A, C>(&self, apps: &[A], components: &[C]) -> Result<()>
    where
        A: AsRef<str>,
        C: AsRef<str>,
    {
        self.check_applications(apps)?;
        self.check_components(components)
    }

    /// Shows `path` relative to the base directory when it lies inside it.
    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.base_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }
}

/// Runs every check `options` asks for against `fs`.
pub fn run(fs: &dyn FileSystem, options: &CheckOptions) -> Result<()> {
    let engine = options.build_engine();
    Validator::new(fs, engine.as_ref(), &options.base_dir).check(&options.apps, &options.components)
}
