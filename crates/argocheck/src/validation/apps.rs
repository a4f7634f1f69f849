use std::path::Path;

use super::Validator;
use crate::error::{Result, ValidationError};
use crate::kustomization::lookup_descriptor;
use crate::resource::DeploymentSpec;
use crate::walker::{RepositoryWalker, WalkEvent};

impl Validator<'_> {
    /// Walks each application root and checks every Application and ApplicationSet in it.
    ///
    /// Directories inside the roots that carry a `kustomization.yaml` are checked
    /// as components as well.
    pub fn check_applications<S: AsRef<str>>(&self, roots: &[S]) -> Result<()> {
        let walker = RepositoryWalker::new(self.fs);
        for root in roots {
            let root = root.as_ref();
            let _span = tracing::info_span!("validation.apps", root).entered();
            log::info!("Checking Applications and ApplicationSets in {}", root);

            walker.walk(&self.base_dir.join(root), &mut |event| match event {
                WalkEvent::Directory(dir) => self.check_directory(dir),
                WalkEvent::Spec { file, spec } => self.check_spec(file, &spec),
            })?;
        }
        Ok(())
    }

    fn check_spec(&self, file: &Path, spec: &DeploymentSpec) -> Result<()> {
        let paths = spec.source_paths();
        if paths.is_empty() {
            log::debug!(
                "{} '{}' in {} declares no source",
                spec.kind(),
                spec.name(),
                self.display_path(file)
            );
            return Ok(());
        }

        for path in paths {
            log::debug!("{} '{}' uses {}", spec.kind(), spec.name(), path);
            self.check_source_path(path)?;
        }
        Ok(())
    }

    /// Checks that `source_path`, relative to the base directory, is a valid component.
    pub fn check_source_path(&self, source_path: &str) -> Result<()> {
        let dir = self.base_dir.join(source_path);

        if self.fs.read_dir(&dir).is_err() {
            return Err(ValidationError::InvalidSourcePath {
                path: source_path.to_string(),
            });
        }

        match lookup_descriptor(self.fs, &dir) {
            Ok(Some(descriptor)) => self.check_component(&dir, &descriptor),
            Ok(None) | Err(_) => Err(ValidationError::MissingDescriptor {
                path: source_path.to_string(),
            }),
        }
    }
}
