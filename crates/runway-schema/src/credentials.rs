//! The operator credentials file (`credentials.toml`).
//!
//! Same logical layout as the classic upload-tool configuration: a list of
//! configured index names plus one table per index carrying the upload
//! endpoint and username. Created once by `runway init`, read-only
//! afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading or validating a [`CredentialsFile`].
#[derive(Error, Debug)]
pub enum CredentialsError {
    /// The credentials file could not be read.
    #[error("failed to read credentials file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The credentials file is not valid TOML.
    #[error("failed to parse credentials file {path}: {source}")]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// An index listed in `index-servers` has no `[index.<name>]` table.
    #[error("index '{0}' is listed in index-servers but has no [index.{0}] table")]
    MissingTable(String),

    /// An `[index.<name>]` table exists but the name is not listed.
    #[error("index '{0}' has a table but is not listed in index-servers")]
    Unlisted(String),

    /// A repository URL is not http(s).
    #[error("index '{name}' has an invalid repository URL: {url}")]
    InvalidRepository {
        /// Index the URL belongs to.
        name: String,
        /// The rejected URL.
        url: String,
    },

    /// The requested index is not configured at all.
    #[error("no index named '{0}' in the credentials file")]
    UnknownIndex(String),
}

/// One configured index: the upload endpoint and who uploads to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexServer {
    /// Upload endpoint URL.
    pub repository: String,
    /// Account name at the index.
    pub username: String,
    /// Upload token. Optional here; `RUNWAY_TOKEN_<NAME>` in the
    /// environment takes precedence when both are present.
    pub token: Option<String>,
}

/// Parsed `credentials.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsFile {
    /// Names of the configured indexes, in operator-preferred order.
    #[serde(rename = "index-servers")]
    pub index_servers: Vec<String>,
    /// One table per configured index.
    #[serde(default)]
    pub index: BTreeMap<String, IndexServer>,
}

impl CredentialsFile {
    /// Load and validate the credentials file at `path`.
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        let content = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let file: CredentialsFile =
            toml::from_str(&content).map_err(|source| CredentialsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        file.validate()?;
        Ok(file)
    }

    /// Cross-check the server list against the index tables.
    pub fn validate(&self) -> Result<(), CredentialsError> {
        for name in &self.index_servers {
            let entry = self
                .index
                .get(name)
                .ok_or_else(|| CredentialsError::MissingTable(name.clone()))?;

            if !entry.repository.starts_with("http://")
                && !entry.repository.starts_with("https://")
            {
                return Err(CredentialsError::InvalidRepository {
                    name: name.clone(),
                    url: entry.repository.clone(),
                });
            }
        }
        for name in self.index.keys() {
            if !self.index_servers.contains(name) {
                return Err(CredentialsError::Unlisted(name.clone()));
            }
        }
        Ok(())
    }

    /// Look up a configured index by name.
    pub fn find(&self, name: &str) -> Result<&IndexServer, CredentialsError> {
        self.index
            .get(name)
            .ok_or_else(|| CredentialsError::UnknownIndex(name.to_string()))
    }
}
