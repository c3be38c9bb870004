//! Shared release context.
//!
//! This module defines the `Context` struct, which groups common state
//! references used throughout a release run to reduce argument fatigue.

use crate::ops::ReleaseError;
use crate::ui::Reporter;
use runway_core::credentials;
use runway_core::index::{IndexClient, IndexError};
use runway_core::git::GitRepo;
use runway_schema::Manifest;
use runway_schema::manifest::MANIFEST_FILE;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// HTTP timeout for index requests.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Groups common state used during release operations.
#[derive(Clone)]
pub struct Context {
    pub manifest: Manifest,
    pub repo: GitRepo,
    pub client: reqwest::Client,
    pub reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Discover the repository from the current directory and load its
    /// manifest.
    pub fn load(reporter: Arc<dyn Reporter>) -> Result<Self, ReleaseError> {
        Self::load_from(Path::new("."), reporter)
    }

    /// Discover the repository containing `start` and load its manifest.
    pub fn load_from(start: &Path, reporter: Arc<dyn Reporter>) -> Result<Self, ReleaseError> {
        let repo = GitRepo::discover(start)?;
        let manifest = Manifest::load(&repo.root().join(MANIFEST_FILE))?;
        tracing::debug!(
            package = %manifest.package.name,
            root = %repo.root().display(),
            "loaded release context"
        );
        let client = reqwest::Client::builder()
            .user_agent(runway_core::USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(IndexError::Http)?;

        Ok(Self {
            manifest,
            repo,
            client,
            reporter,
        })
    }

    /// Build an authenticated client for the named index, or for the
    /// manifest's default upload target when `name` is `None`.
    pub fn index_client(&self, name: Option<&str>) -> Result<IndexClient, ReleaseError> {
        let name = name.unwrap_or(&self.manifest.release.index);
        let creds = credentials::load()?;
        let auth = credentials::resolve(&creds, name)?;
        Ok(IndexClient::new(self.client.clone(), auth))
    }
}
