//! Distribution artifact metadata.

use crate::digest::Sha256Digest;
use crate::types::{ProjectName, Version};
use std::path::PathBuf;
use thiserror::Error;

/// Whether an artifact is the source archive or an output of the
/// configured build command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The source archive runway builds itself (`.tar.gz`).
    Sdist,
    /// A file produced by the external build command.
    Built,
}

impl ArtifactKind {
    /// Wire name of the kind, sent as the `filetype` upload field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sdist => "sdist",
            Self::Built => "built",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur when validating an [`Artifact`].
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// A required field (name or version) is empty.
    #[error("empty field: {0}")]
    EmptyField(&'static str),

    /// The artifact path has no file name component.
    #[error("artifact path has no file name: {0}")]
    NoFileName(PathBuf),

    /// The artifact file does not exist on disk.
    #[error("artifact file not found: {0}")]
    Missing(PathBuf),
}

/// A distribution artifact ready for upload.
///
/// Produced by the build stage, consumed by the upload stage.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Project the artifact belongs to.
    pub name: ProjectName,
    /// Release version embedded in the artifact.
    pub version: Version,
    /// Source archive or built output.
    pub kind: ArtifactKind,
    /// Location on disk.
    pub path: PathBuf,
    /// SHA-256 digest of the file contents.
    pub sha256: Sha256Digest,
}

impl Artifact {
    /// File name of the artifact (final path component).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Validates the artifact's integrity by checking all required fields.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.name.is_empty() {
            return Err(ArtifactError::EmptyField("name"));
        }
        if self.version.is_empty() {
            return Err(ArtifactError::EmptyField("version"));
        }
        if self.path.file_name().is_none() {
            return Err(ArtifactError::NoFileName(self.path.clone()));
        }
        if !self.path.is_file() {
            return Err(ArtifactError::Missing(self.path.clone()));
        }
        Ok(())
    }
}
