//! Kustomization descriptors and the files they reference.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::error::{Result, ValidationError};
use crate::fs::FileSystem;

/// Name of the descriptor file that marks a directory as a component.
pub const DESCRIPTOR_FILE: &str = "kustomization.yaml";

/// Returns the descriptor path if `dir` contains a `kustomization.yaml`.
pub fn lookup_descriptor(fs: &dyn FileSystem, dir: &Path) -> io::Result<Option<PathBuf>> {
    let path = dir.join(DESCRIPTOR_FILE);
    if fs.exists(&path)? {
        Ok(Some(path))
    } else {
        Ok(None)
    }
}

/// How references are pulled out of a descriptor key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    /// A list of paths, used verbatim.
    PathList,
    /// A list of objects, each with an optional path under the given field.
    FieldList(&'static str),
    /// A single object with an optional path under the given field.
    Field(&'static str),
    /// A list of generators whose `files` entries are `path` or `key=path`.
    GeneratorList,
    /// A list of Helm charts with `valuesFile` and `additionalValuesFiles`.
    HelmChartList,
}

/// Descriptor keys that reference files, and how to read each of them.
pub const REFERENCE_KINDS: &[(&str, ExtractionRule)] = &[
    ("resources", ExtractionRule::PathList),
    ("patchesStrategicMerge", ExtractionRule::PathList),
    ("patches", ExtractionRule::FieldList("path")),
    ("transformers", ExtractionRule::PathList),
    ("secretGenerator", ExtractionRule::GeneratorList),
    ("configMapGenerator", ExtractionRule::GeneratorList),
    ("components", ExtractionRule::PathList),
    ("crds", ExtractionRule::PathList),
    ("generators", ExtractionRule::PathList),
    ("validators", ExtractionRule::PathList),
    ("configurations", ExtractionRule::PathList),
    ("patchesJson6902", ExtractionRule::FieldList("path")),
    ("replacements", ExtractionRule::FieldList("path")),
    ("openapi", ExtractionRule::Field("path")),
    ("helmCharts", ExtractionRule::HelmChartList),
];

/// A path named by a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The descriptor key the reference was found under.
    pub kind: &'static str,
    /// The entry as written.
    pub raw: String,
    /// Whether the entry may carry a `key=` prefix.
    pub keyed: bool,
}

impl Reference {
    fn plain(kind: &'static str, raw: &str) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
            keyed: false,
        }
    }

    fn keyed(kind: &'static str, raw: &str) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
            keyed: true,
        }
    }

    /// The normalized relative path this reference points at.
    pub fn path(&self) -> String {
        if self.keyed {
            normalize_reference(generator_file_path(&self.raw))
        } else {
            normalize_reference(&self.raw)
        }
    }
}

/// Returns the path part of a generator `files` entry.
///
/// `secret2=secret2.yaml` names `secret2.yaml`; an entry without `=` is the
/// path itself. Only the first `=` separates the key.
pub fn generator_file_path(entry: &str) -> &str {
    match entry.split_once('=') {
        Some((_, path)) => path,
        None => entry,
    }
}

/// Normalizes a referenced path so it compares equal to a directory entry name.
///
/// Surrounding whitespace and `.` segments are dropped and segments are joined
/// with `/`. `..` is kept as is.
pub fn normalize_reference(raw: &str) -> String {
    raw.trim()
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// A parsed `kustomization.yaml`.
#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    path: PathBuf,
    mapping: Mapping,
}

impl ComponentDescriptor {
    /// Reads and parses the descriptor at `path`.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let data = fs.read(path).map_err(|e| ValidationError::walk(path, e))?;
        let content = String::from_utf8(data).map_err(|_| ValidationError::InvalidDescriptor {
            path: path.to_path_buf(),
            message: "file is not valid UTF-8".to_string(),
        })?;
        Self::parse(path, &content)
    }

    /// Parses descriptor text. An empty document is a descriptor without references.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let value: Value =
            serde_yaml::from_str(content).map_err(|e| ValidationError::InvalidDescriptor {
                path: path.clone(),
                message: e.to_string(),
            })?;

        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => {
                return Err(ValidationError::InvalidDescriptor {
                    path,
                    message: "expected a mapping at the top level".to_string(),
                })
            }
        };
        Ok(Self { path, mapping })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns every file reference, in table order and then document order.
    pub fn references(&self) -> Result<Vec<Reference>> {
        let mut references = Vec::new();
        for &(key, rule) in REFERENCE_KINDS {
            let Some(value) = self.mapping.get(key) else {
                continue;
            };
            extract(key, rule, value, &mut references).map_err(|message| {
                ValidationError::InvalidDescriptor {
                    path: self.path.clone(),
                    message,
                }
            })?;
        }
        Ok(references)
    }

    /// Returns the set of normalized paths referenced by this descriptor.
    pub fn used_files(&self) -> Result<BTreeSet<String>> {
        Ok(self
            .references()?
            .iter()
            .map(Reference::path)
            .filter(|p| !p.is_empty())
            .collect())
    }
}

fn extract(
    key: &'static str,
    rule: ExtractionRule,
    value: &Value,
    out: &mut Vec<Reference>,
) -> std::result::Result<(), String> {
    if let ExtractionRule::Field(field) = rule {
        // a single object, e.g. `openapi: {path: schema.json}`
        if value.is_null() {
            return Ok(());
        }
        if let Some(path) = mapping_entry(key, value)?.get(field) {
            out.push(Reference::plain(key, string_entry(key, path)?));
        }
        return Ok(());
    }

    for entry in entries(key, value)? {
        match rule {
            ExtractionRule::PathList => {
                out.push(Reference::plain(key, string_entry(key, entry)?));
            }
            ExtractionRule::FieldList(field) => {
                let object = mapping_entry(key, entry)?;
                // entries without the field carry inline content
                if let Some(path) = object.get(field) {
                    out.push(Reference::plain(key, string_entry(key, path)?));
                }
            }
            ExtractionRule::GeneratorList => {
                let generator = mapping_entry(key, entry)?;
                if let Some(files) = generator.get("files") {
                    for file in entries(key, files)? {
                        out.push(Reference::keyed(key, string_entry(key, file)?));
                    }
                }
                if let Some(envs) = generator.get("envs") {
                    for env in entries(key, envs)? {
                        out.push(Reference::plain(key, string_entry(key, env)?));
                    }
                }
                if let Some(env) = generator.get("env") {
                    out.push(Reference::plain(key, string_entry(key, env)?));
                }
            }
            ExtractionRule::HelmChartList => {
                let chart = mapping_entry(key, entry)?;
                if let Some(values) = chart.get("valuesFile") {
                    out.push(Reference::plain(key, string_entry(key, values)?));
                }
                if let Some(extra) = chart.get("additionalValuesFiles") {
                    for values in entries(key, extra)? {
                        out.push(Reference::plain(key, string_entry(key, values)?));
                    }
                }
            }
            ExtractionRule::Field(_) => {}
        }
    }
    Ok(())
}

fn entries<'v>(key: &str, value: &'v Value) -> std::result::Result<&'v [Value], String> {
    match value {
        Value::Sequence(items) => Ok(items.as_slice()),
        Value::Null => Ok(&[][..]),
        _ => Err(format!("'{}' must be a list", key)),
    }
}

fn string_entry<'v>(key: &str, value: &'v Value) -> std::result::Result<&'v str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("'{}' entries must be strings", key))
}

fn mapping_entry<'v>(key: &str, value: &'v Value) -> std::result::Result<&'v Mapping, String> {
    value
        .as_mapping()
        .ok_or_else(|| format!("'{}' entries must be objects", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fs::MemoryFs;

    fn used(yaml: &str) -> Vec<String> {
        ComponentDescriptor::parse("components/kustomization.yaml", yaml)
            .unwrap()
            .used_files()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_generator_file_path() {
        assert_eq!(generator_file_path("secret2=secret2.yaml"), "secret2.yaml");
        assert_eq!(generator_file_path("secret1.yaml"), "secret1.yaml");
        assert_eq!(generator_file_path("a=b=c.yaml"), "b=c.yaml");
    }

    #[test]
    fn test_normalize_reference() {
        assert_eq!(normalize_reference("./deployment.yaml"), "deployment.yaml");
        assert_eq!(normalize_reference(" ./nested//./file.yaml "), "nested/file.yaml");
        assert_eq!(normalize_reference("../base"), "../base");
    }

    #[test]
    fn test_all_reference_kinds() {
        let files = used(
            r#"
kind: Kustomization
apiVersion: kustomize.config.k8s.io/v1beta1
resources:
  - deployment.yaml
  - ../base
patchesStrategicMerge:
  - ./patch-replicas.yaml
patches:
  - path: patch.yaml
  - patch: |-
      - op: replace
        path: /spec/replicas
        value: 3
    target:
      kind: Deployment
patchesJson6902:
  - target:
      kind: Service
    path: json-patch.yaml
transformers:
  - namespace.yaml
components:
  - ../components/monitoring
crds:
  - crd.yaml
configMapGenerator:
  - name: settings
    files:
      - cm=configmap.yaml
    envs:
      - settings.env
secretGenerator:
  - name: credentials
    files:
      - secret1.yaml
      - secret2=secret2.yaml
    env: legacy.env
"#,
        );

        assert_eq!(
            files,
            vec![
                "../base",
                "../components/monitoring",
                "configmap.yaml",
                "crd.yaml",
                "deployment.yaml",
                "json-patch.yaml",
                "legacy.env",
                "namespace.yaml",
                "patch-replicas.yaml",
                "patch.yaml",
                "secret1.yaml",
                "secret2.yaml",
                "settings.env",
            ]
        );
    }

    #[test]
    fn test_replacements_openapi_and_helm_values() {
        let files = used(
            r#"
replacements:
  - path: replacement.yaml
  - source:
      kind: ConfigMap
      fieldPath: data.host
    targets: []
openapi:
  path: schema.json
helmCharts:
  - name: nginx
    repo: https://charts.example.com
    valuesFile: values.yaml
    additionalValuesFiles:
      - values-prod.yaml
  - name: redis
"#,
        );

        assert_eq!(
            files,
            vec!["replacement.yaml", "schema.json", "values-prod.yaml", "values.yaml"]
        );
        assert!(used("openapi:
").is_empty());
    }

    #[test]
    fn test_references_keep_kind_and_raw_value() {
        let descriptor = ComponentDescriptor::parse(
            "kustomization.yaml",
            "secretGenerator:\n  - name: s\n    files:\n      - key=value.yaml\n",
        )
        .unwrap();

        let references = descriptor.references().unwrap();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].kind, "secretGenerator");
        assert_eq!(references[0].raw, "key=value.yaml");
        assert_eq!(references[0].path(), "value.yaml");
    }

    #[test]
    fn test_empty_descriptor_has_no_references() {
        assert!(used("").is_empty());
        assert!(used("kind: Kustomization\napiVersion: kustomize.config.k8s.io/v1beta1").is_empty());
        assert!(used("resources:\n").is_empty());
    }

    #[test]
    fn test_malformed_descriptor() {
        let not_a_list = ComponentDescriptor::parse("k.yaml", "resources: deployment.yaml")
            .unwrap()
            .used_files()
            .unwrap_err();
        assert_eq!(not_a_list.kind(), ErrorKind::InvalidDescriptor);
        assert!(not_a_list.to_string().contains("'resources' must be a list"));

        let not_a_string = ComponentDescriptor::parse("k.yaml", "resources:\n  - a: b\n")
            .unwrap()
            .used_files()
            .unwrap_err();
        assert!(not_a_string
            .to_string()
            .contains("'resources' entries must be strings"));

        let scalar = ComponentDescriptor::parse("k.yaml", "just text").unwrap_err();
        assert_eq!(scalar.kind(), ErrorKind::InvalidDescriptor);

        let broken = ComponentDescriptor::parse("k.yaml", "resources: [unclosed").unwrap_err();
        assert_eq!(broken.kind(), ErrorKind::InvalidDescriptor);
    }

    #[test]
    fn test_lookup_descriptor() {
        let fs = MemoryFs::new()
            .with_file("/repo/components/app/kustomization.yaml", "resources: []")
            .with_dir("/repo/components/plain");

        assert_eq!(
            lookup_descriptor(&fs, Path::new("/repo/components/app")).unwrap(),
            Some(PathBuf::from("/repo/components/app/kustomization.yaml"))
        );
        assert_eq!(
            lookup_descriptor(&fs, Path::new("/repo/components/plain")).unwrap(),
            None
        );
    }

    #[test]
    fn test_load_reads_through_filesystem() {
        let fs = MemoryFs::new().with_file(
            "/repo/components/kustomization.yaml",
            "resources:\n  - configmap1.yaml\n",
        );

        let descriptor =
            ComponentDescriptor::load(&fs, Path::new("/repo/components/kustomization.yaml"))
                .unwrap();
        assert_eq!(
            descriptor.used_files().unwrap().into_iter().collect::<Vec<_>>(),
            vec!["configmap1.yaml".to_string()]
        );

        let missing = ComponentDescriptor::load(&fs, Path::new("/repo/other/kustomization.yaml"))
            .unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::WalkFailure);
    }
}
