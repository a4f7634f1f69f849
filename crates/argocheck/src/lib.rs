pub mod build;
pub mod config;
pub mod error;
pub mod fs;
pub mod kustomization;
pub mod logging;
pub mod resource;
pub mod validation;
pub mod walker;

pub use build::{BuildEngine, KustomizeCli, SkipBuild};
pub use config::CheckOptions;
pub use error::{ErrorKind, Result, ValidationError};
pub use fs::{FileSystem, MemoryFs, OsFs};
pub use kustomization::{ComponentDescriptor, DESCRIPTOR_FILE};
pub use resource::{Application, ApplicationSet, DeploymentSpec, SpecKind};
pub use validation::Validator;
pub use walker::{DiscoveredSpecs, RepositoryWalker};
