//! Repository traversal and deployment-spec discovery.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ValidationError};
use crate::fs::{EntryKind, FileSystem};
use crate::resource::{Application, ApplicationSet, DeploymentSpec, ResourceWithPath};

/// An entry reported by [`RepositoryWalker::walk`].
#[derive(Debug)]
pub enum WalkEvent<'a> {
    /// A directory, reported before anything inside it.
    Directory(&'a Path),
    /// A deployment spec found in `file`.
    Spec {
        file: &'a Path,
        spec: DeploymentSpec,
    },
}

/// Applications and ApplicationSets found under a directory, in walk order.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredSpecs {
    pub applications: Vec<ResourceWithPath<Application>>,
    pub application_sets: Vec<ResourceWithPath<ApplicationSet>>,
}

impl DiscoveredSpecs {
    /// Comma-separated Application names, or `<none>`.
    pub fn application_names(&self) -> String {
        join_names(self.applications.iter().map(|a| a.resource.metadata.name.as_str()))
    }

    /// Comma-separated ApplicationSet names, or `<none>`.
    pub fn application_set_names(&self) -> String {
        join_names(
            self.application_sets
                .iter()
                .map(|a| a.resource.metadata.name.as_str()),
        )
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<_> = names.collect();
    if names.is_empty() {
        "<none>".to_string()
    } else {
        names.join(", ")
    }
}

/// Walks a repository subtree and classifies the documents it contains.
pub struct RepositoryWalker<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> RepositoryWalker<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Visits every directory and every deployment spec under `root`.
    ///
    /// Files that are not deployment specs (including files that are not YAML
    /// at all) are skipped. Read failures abort the walk.
    pub fn walk(&self, root: &Path, visit: &mut dyn FnMut(WalkEvent<'_>) -> Result<()>) -> Result<()> {
        self.fs.walk(root, &mut |path, kind| match kind {
            EntryKind::Directory => visit(WalkEvent::Directory(path)),
            EntryKind::File => {
                for spec in self.specs_in_file(path)? {
                    visit(WalkEvent::Spec { file: path, spec })?;
                }
                Ok(())
            }
        })
    }

    /// Reads a file and returns the deployment specs it declares.
    pub fn specs_in_file(&self, path: &Path) -> Result<Vec<DeploymentSpec>> {
        let data = self
            .fs
            .read(path)
            .map_err(|e| ValidationError::walk(path, e))?;

        let Ok(text) = std::str::from_utf8(&data) else {
            log::debug!("Skipping non UTF-8 file {}", path.display());
            return Ok(Vec::new());
        };

        log::debug!("Checking contents of {}", path.display());
        Ok(classify_document(text))
    }

    /// Collects all Applications and ApplicationSets under `root`.
    pub fn lookup_applications(&self, root: &Path) -> Result<DiscoveredSpecs> {
        log::info!("Looking for Applications in {}", root.display());

        let mut found = DiscoveredSpecs::default();
        self.walk(root, &mut |event| {
            if let WalkEvent::Spec { file, spec } = event {
                match spec {
                    DeploymentSpec::Application(app) => found
                        .applications
                        .push(ResourceWithPath::new(app, file.to_path_buf())),
                    DeploymentSpec::ApplicationSet(appset) => found
                        .application_sets
                        .push(ResourceWithPath::new(appset, file.to_path_buf())),
                }
            }
            Ok(())
        })?;
        Ok(found)
    }
}

/// Returns the deployment specs declared in a (possibly multi-document) YAML text.
///
/// Parsing stops at the first malformed document; specs before it are kept.
pub fn classify_document(text: &str) -> Vec<DeploymentSpec> {
    let mut specs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        match serde_yaml::Value::deserialize(document) {
            Ok(value) => specs.extend(DeploymentSpec::from_value(&value)),
            Err(e) => {
                log::debug!("Not a YAML document: {}", e);
                break;
            }
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::resource::SpecKind;
    use std::path::PathBuf;

    const APP: &str = r#"
apiVersion: argoproj.io/v1alpha1
kind: Application
metadata:
  name: host-operator
spec:
  destination:
    server: https://kubernetes.default.svc
  source:
    path: components/host-operator
"#;

    const APPSET: &str = r#"
apiVersion: argoproj.io/v1alpha1
kind: ApplicationSet
metadata:
  name: member-operators
spec:
  template:
    spec:
      destination:
        server: https://member.example.com
      source:
        path: components/member-operator
"#;

    #[test]
    fn test_classify_multi_document() {
        let text = format!("{APP}\n---\napiVersion: v1\nkind: Namespace\n---\n{APPSET}");
        let specs = classify_document(&text);

        let kinds: Vec<_> = specs.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec![SpecKind::Application, SpecKind::ApplicationSet]);
    }

    #[test]
    fn test_classify_garbage() {
        assert!(classify_document("key: [unclosed").is_empty());
        assert!(classify_document("").is_empty());
        assert!(classify_document("just text").is_empty());
    }

    #[test]
    fn test_walk_reports_directories_and_specs() {
        let fs = MemoryFs::new()
            .with_file("/repo/apps/host.yaml", APP)
            .with_file("/repo/apps/sets/member.yaml", APPSET)
            .with_file("/repo/apps/README.md", "# apps")
            .with_file("/repo/apps/logo.png", vec![0xff, 0xfe, 0x00]);
        let walker = RepositoryWalker::new(&fs);

        let mut events = Vec::new();
        walker
            .walk(Path::new("/repo/apps"), &mut |event| {
                events.push(match event {
                    WalkEvent::Directory(dir) => format!("dir {}", dir.display()),
                    WalkEvent::Spec { file, spec } => {
                        format!("{} {} in {}", spec.kind(), spec.name(), file.display())
                    }
                });
                Ok(())
            })
            .unwrap();

        assert_eq!(
            events,
            vec![
                "dir /repo/apps".to_string(),
                "Application host-operator in /repo/apps/host.yaml".to_string(),
                "dir /repo/apps/sets".to_string(),
                "ApplicationSet member-operators in /repo/apps/sets/member.yaml".to_string(),
            ]
        );
    }

    #[test]
    fn test_lookup_applications() {
        let fs = MemoryFs::new()
            .with_file("/repo/apps/host.yaml", APP)
            .with_file("/repo/apps/member.yaml", APPSET);
        let walker = RepositoryWalker::new(&fs);

        let found = walker.lookup_applications(Path::new("/repo/apps")).unwrap();

        assert_eq!(found.applications.len(), 1);
        assert_eq!(found.applications[0].path, PathBuf::from("/repo/apps/host.yaml"));
        assert_eq!(found.application_names(), "host-operator");
        assert_eq!(found.application_set_names(), "member-operators");
    }

    #[test]
    fn test_lookup_applications_none() {
        let fs = MemoryFs::new().with_dir("/repo/apps");
        let walker = RepositoryWalker::new(&fs);

        let found = walker.lookup_applications(Path::new("/repo/apps")).unwrap();

        assert_eq!(found.application_names(), "<none>");
        assert_eq!(found.application_set_names(), "<none>");
    }

    /// Delegates to a [`MemoryFs`] but fails to read one file.
    struct UnreadableFile {
        inner: MemoryFs,
        broken: PathBuf,
    }

    impl FileSystem for UnreadableFile {
        fn walk(&self, root: &Path, visit: &mut crate::fs::WalkFn<'_>) -> Result<()> {
            self.inner.walk(root, visit)
        }

        fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
            if path == self.broken.as_path() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "permission denied",
                ));
            }
            self.inner.read(path)
        }

        fn read_dir(&self, path: &Path) -> std::io::Result<Vec<crate::fs::DirEntry>> {
            self.inner.read_dir(path)
        }

        fn exists(&self, path: &Path) -> std::io::Result<bool> {
            self.inner.exists(path)
        }
    }

    #[test]
    fn test_unreadable_file_aborts_walk() {
        let fs = UnreadableFile {
            inner: MemoryFs::new()
                .with_file("/repo/apps/a.yaml", APP)
                .with_file("/repo/apps/b.yaml", APP)
                .with_file("/repo/apps/c.yaml", APPSET),
            broken: PathBuf::from("/repo/apps/b.yaml"),
        };
        let walker = RepositoryWalker::new(&fs);

        let mut visited = Vec::new();
        let err = walker
            .walk(Path::new("/repo/apps"), &mut |event| {
                if let WalkEvent::Spec { file, .. } = event {
                    visited.push(file.to_path_buf());
                }
                Ok(())
            })
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::ErrorKind::WalkFailure);
        assert_eq!(err.path(), Path::new("/repo/apps/b.yaml"));
        assert_eq!(visited, vec![PathBuf::from("/repo/apps/a.yaml")]);
    }

    #[test]
    fn test_lookup_missing_root() {
        let fs = MemoryFs::new();
        let walker = RepositoryWalker::new(&fs);

        let result = walker.lookup_applications(Path::new("/repo/apps"));
        assert!(matches!(result, Err(ValidationError::WalkFailure { .. })));
    }
}
