//! Manifest build verification.

use std::path::Path;
use std::process::{Command, Output};

/// An external engine that builds the manifests of a component directory.
pub trait BuildEngine {
    /// Builds `dir`, returning the engine's diagnostic on failure.
    fn build(&self, dir: &Path) -> Result<(), String>;
}

/// Runs `kustomize build <dir>`.
#[derive(Debug, Clone)]
pub struct KustomizeCli {
    program: String,
}

impl KustomizeCli {
    /// Creates a build engine that invokes `program` (e.g. `kustomize` or a full path).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, dir: &Path) -> std::io::Result<Output> {
        Command::new(&self.program).arg("build").arg(dir).output()
    }
}

impl Default for KustomizeCli {
    fn default() -> Self {
        Self::new("kustomize")
    }
}

impl BuildEngine for KustomizeCli {
    fn build(&self, dir: &Path) -> Result<(), String> {
        let output = self
            .run(dir)
            .map_err(|e| format!("Failed to run '{}': {}", self.program, e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(format_build_error(&output))
        }
    }
}

/// Accepts every directory without building it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipBuild;

impl BuildEngine for SkipBuild {
    fn build(&self, dir: &Path) -> Result<(), String> {
        log::debug!("Build verification disabled, skipping {}", dir.display());
        Ok(())
    }
}

/// Formats a failed build from its stderr, falling back to stdout and then the exit code.
pub fn format_build_error(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

    match (stderr.is_empty(), stdout.is_empty()) {
        (true, true) => format!(
            "build exited with code {}",
            output.status.code().unwrap_or(-1)
        ),
        (true, false) => stdout,
        (false, _) => stderr,
    }
}
