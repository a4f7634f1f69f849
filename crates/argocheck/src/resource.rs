//! Argo CD resource shapes recognised in a GitOps repository.
//!
//! Only the fields the checks need are modelled; everything else in a document
//! is ignored. Every field is optional so that arbitrary YAML mappings parse,
//! and classification happens on the destination server afterwards.

use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::PathBuf;

/// The kind of deployment spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecKind {
    Application,
    ApplicationSet,
}

impl std::fmt::Display for SpecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecKind::Application => write!(f, "Application"),
            SpecKind::ApplicationSet => write!(f, "ApplicationSet"),
        }
    }
}

/// Metadata for a resource, following K8s conventions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObjectMeta {
    #[serde(default, deserialize_with = "scalar_string")]
    pub name: String,

    #[serde(default, deserialize_with = "scalar_string")]
    pub namespace: String,
}

/// Where an application is deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationDestination {
    #[serde(default, deserialize_with = "scalar_string")]
    pub server: String,

    #[serde(default, deserialize_with = "scalar_string")]
    pub namespace: String,
}

/// Where an application's manifests come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSource {
    #[serde(default, rename = "repoURL", deserialize_with = "scalar_string")]
    pub repo_url: String,

    /// Directory of the manifests, relative to the repository root.
    #[serde(default, deserialize_with = "scalar_string")]
    pub path: String,

    #[serde(default, deserialize_with = "scalar_string")]
    pub target_revision: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationSpec {
    #[serde(default)]
    pub destination: ApplicationDestination,

    #[serde(default)]
    pub source: Option<ApplicationSource>,

    /// Multi-source applications list their sources here instead of `source`.
    #[serde(default)]
    pub sources: Vec<ApplicationSource>,
}

impl ApplicationSpec {
    /// Returns the source paths to check, single source first.
    ///
    /// A declared `source` always yields its path, even an empty one. Entries
    /// of `sources` without a path (chart or ref sources) are left out.
    pub fn source_paths(&self) -> Vec<&str> {
        self.source
            .iter()
            .map(|s| s.path.as_str())
            .chain(
                self.sources
                    .iter()
                    .map(|s| s.path.as_str())
                    .filter(|p| !p.is_empty()),
            )
            .collect()
    }
}

/// Reads any YAML scalar into a string, so `targetRevision: 2` reads as `"2"`.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s),
        Value::Sequence(_) => Err(D::Error::custom("expected a scalar, found a sequence")),
        Value::Mapping(_) => Err(D::Error::custom("expected a scalar, found a mapping")),
        Value::Tagged(_) => Err(D::Error::custom("expected a scalar, found a tagged value")),
    }
}

/// An Argo CD `Application`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Application {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ApplicationSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationSetTemplate {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ApplicationSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationSetSpec {
    #[serde(default)]
    pub template: ApplicationSetTemplate,
}

/// An Argo CD `ApplicationSet`; the application fields sit under `spec.template`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApplicationSet {
    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ApplicationSetSpec,
}

/// A document that declares a deployment: either shape, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentSpec {
    Application(Application),
    ApplicationSet(ApplicationSet),
}

impl DeploymentSpec {
    /// Classifies a parsed YAML document.
    ///
    /// The plain shape is tried first, then the templated one. A document is
    /// a deployment spec only if the destination server at the matching level
    /// is non-empty.
    pub fn from_value(value: &serde_yaml::Value) -> Option<Self> {
        if let Ok(app) = serde_yaml::from_value::<Application>(value.clone()) {
            if !app.spec.destination.server.is_empty() {
                return Some(DeploymentSpec::Application(app));
            }
        }
        if let Ok(appset) = serde_yaml::from_value::<ApplicationSet>(value.clone()) {
            if !appset.spec.template.spec.destination.server.is_empty() {
                return Some(DeploymentSpec::ApplicationSet(appset));
            }
        }
        None
    }

    pub fn kind(&self) -> SpecKind {
        match self {
            DeploymentSpec::Application(_) => SpecKind::Application,
            DeploymentSpec::ApplicationSet(_) => SpecKind::ApplicationSet,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DeploymentSpec::Application(app) => &app.metadata.name,
            DeploymentSpec::ApplicationSet(appset) => &appset.metadata.name,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            DeploymentSpec::Application(app) => &app.metadata.namespace,
            DeploymentSpec::ApplicationSet(appset) => &appset.metadata.namespace,
        }
    }

    /// Returns the application spec, looking through the template of an ApplicationSet.
    pub fn application_spec(&self) -> &ApplicationSpec {
        match self {
            DeploymentSpec::Application(app) => &app.spec,
            DeploymentSpec::ApplicationSet(appset) => &appset.spec.template.spec,
        }
    }

    pub fn destination_server(&self) -> &str {
        &self.application_spec().destination.server
    }

    pub fn source_paths(&self) -> Vec<&str> {
        self.application_spec().source_paths()
    }
}

/// A resource along with the file it was read from.
#[derive(Debug, Clone)]
pub struct ResourceWithPath<T> {
    pub resource: T,
    pub path: PathBuf,
}

impl<T> ResourceWithPath<T> {
    pub fn new(resource: T, path: PathBuf) -> Self {
        Self { resource, path }
    }
}
