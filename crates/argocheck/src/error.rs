//! Validation error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// The kind of a [`ValidationError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    WalkFailure,
    InvalidSourcePath,
    MissingDescriptor,
    InvalidDescriptor,
    UnreferencedFile,
    BuildFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::WalkFailure => write!(f, "WalkFailure"),
            ErrorKind::InvalidSourcePath => write!(f, "InvalidSourcePath"),
            ErrorKind::MissingDescriptor => write!(f, "MissingDescriptor"),
            ErrorKind::InvalidDescriptor => write!(f, "InvalidDescriptor"),
            ErrorKind::UnreferencedFile => write!(f, "UnreferencedFile"),
            ErrorKind::BuildFailure => write!(f, "BuildFailure"),
        }
    }
}

/// Errors reported while checking a GitOps repository.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Failed to read '{path}': {source}")]
    WalkFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid")]
    InvalidSourcePath { path: String },

    #[error("{path} does not contain a 'kustomization.yaml' file")]
    MissingDescriptor { path: String },

    #[error("Invalid kustomization in '{path}': {message}")]
    InvalidDescriptor { path: PathBuf, message: String },

    /// Every file in `files` exists next to `descriptor` but is not referenced by it.
    #[error("{}", unreferenced_message(.descriptor, .files))]
    UnreferencedFile {
        descriptor: String,
        files: Vec<String>,
    },

    #[error("Failed to build '{path}': {message}")]
    BuildFailure { path: PathBuf, message: String },
}

impl ValidationError {
    pub(crate) fn walk(path: &Path, source: std::io::Error) -> Self {
        ValidationError::WalkFailure {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::WalkFailure { .. } => ErrorKind::WalkFailure,
            ValidationError::InvalidSourcePath { .. } => ErrorKind::InvalidSourcePath,
            ValidationError::MissingDescriptor { .. } => ErrorKind::MissingDescriptor,
            ValidationError::InvalidDescriptor { .. } => ErrorKind::InvalidDescriptor,
            ValidationError::UnreferencedFile { .. } => ErrorKind::UnreferencedFile,
            ValidationError::BuildFailure { .. } => ErrorKind::BuildFailure,
        }
    }

    /// Returns the path the error is about.
    pub fn path(&self) -> &Path {
        match self {
            ValidationError::WalkFailure { path, .. }
            | ValidationError::InvalidDescriptor { path, .. }
            | ValidationError::BuildFailure { path, .. } => path,
            ValidationError::InvalidSourcePath { path }
            | ValidationError::MissingDescriptor { path } => Path::new(path),
            ValidationError::UnreferencedFile { descriptor, .. } => Path::new(descriptor),
        }
    }

    /// Renders the error for a terminal, breaking every `label: detail` pair onto two lines.
    pub fn operator_message(&self) -> String {
        self.to_string().replace(": ", ":\n")
    }
}

fn unreferenced_message(descriptor: &str, files: &[String]) -> String {
    files
        .iter()
        .map(|file| format!("resource is not referenced in {}: {}", descriptor, file))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type for validation operations.
pub type Result<T> = std::result::Result<T, ValidationError>;
