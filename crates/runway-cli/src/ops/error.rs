//! Domain-specific errors for release operations

use runway_core::archive::ArchiveError;
use runway_core::builder::BuildError;
use runway_core::credentials::ResolveError;
use runway_core::git::GitError;
use runway_core::index::IndexError;
use runway_core::version_file::VersionFileError;
use runway_schema::{ArtifactError, ManifestError, VersionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("version file error: {0}")]
    VersionFile(#[from] VersionFileError),

    #[error("source archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("credentials error: {0}")]
    Credentials(#[from] ResolveError),

    #[error("upload error: {0}")]
    Index(#[from] IndexError),

    #[error("artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("worktree has uncommitted changes: {0}")]
    DirtyWorktree(String),

    #[error("tag '{0}' already exists; this version was already released")]
    TagExists(String),

    #[error("{context}: {message}")]
    Context {
        context: &'static str,
        message: String,
    },
}

impl ReleaseError {
    /// Create an error with context for better debugging.
    pub fn context(ctx: &'static str, msg: impl std::fmt::Display) -> Self {
        Self::Context {
            context: ctx,
            message: msg.to_string(),
        }
    }
}
