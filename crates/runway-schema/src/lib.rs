//! Shared vocabulary types for runway.
//!
//! Everything the other crates agree on lives here: the project name and
//! version newtypes, digest and artifact types, and the serde models for
//! the two configuration files (`runway.toml` and `credentials.toml`).

pub mod artifact;
pub mod credentials;
pub mod digest;
pub mod manifest;
pub mod types;

// Re-exports
pub use artifact::{Artifact, ArtifactError, ArtifactKind};
pub use credentials::{CredentialsError, CredentialsFile, IndexServer};
pub use digest::Sha256Digest;
pub use manifest::{Manifest, ManifestError};
pub use types::{BumpLevel, ProjectName, Version, VersionError};
