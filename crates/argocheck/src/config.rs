//! Options for a configuration check.

use std::path::PathBuf;

use crate::build::{BuildEngine, KustomizeCli, SkipBuild};

/// Everything a `check-config` run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    /// Repository root; every other path is relative to it.
    pub base_dir: PathBuf,
    /// Directories holding Applications and ApplicationSets.
    pub apps: Vec<String>,
    /// Directories holding Kustomize components.
    pub components: Vec<String>,
    /// Program used to build components.
    pub kustomize: String,
    /// Skip build verification entirely.
    pub skip_build: bool,
}

impl CheckOptions {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            apps: Vec::new(),
            components: Vec::new(),
            kustomize: "kustomize".to_string(),
            skip_build: false,
        }
    }

    /// Sets the application roots. Blank entries (e.g. from `a,,b`) are dropped.
    pub fn with_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apps = clean_roots(apps);
        self
    }

    /// Sets the component roots. Blank entries are dropped.
    pub fn with_components<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.components = clean_roots(components);
        self
    }

    pub fn with_kustomize(mut self, program: impl Into<String>) -> Self {
        self.kustomize = program.into();
        self
    }

    pub fn with_skip_build(mut self, skip_build: bool) -> Self {
        self.skip_build = skip_build;
        self
    }

    /// Returns the build engine these options select.
    pub fn build_engine(&self) -> Box<dyn BuildEngine> {
        if self.skip_build {
            Box::new(SkipBuild)
        } else {
            Box::new(KustomizeCli::new(self.kustomize.clone()))
        }
    }
}

fn clean_roots<I, S>(roots: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    roots
        .into_iter()
        .map(Into::into)
        .map(|root| root.trim().to_string())
        .filter(|root| !root.is_empty())
        .collect()
}
