//! Locating the credentials file and resolving index authentication.
//!
//! The file is created once during setup and never modified by runway
//! afterwards. Tokens resolve environment-first so CI can inject them
//! without writing secrets to disk.

use runway_schema::{CredentialsError, CredentialsFile};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable overriding the credentials file location.
pub const CREDENTIALS_ENV: &str = "RUNWAY_CREDENTIALS";

/// Errors from locating credentials or resolving an index's auth.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The credentials file itself is broken.
    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// No user configuration directory exists on this system.
    #[error("could not determine the user configuration directory")]
    NoConfigDir,

    /// No token for the index, neither in the environment nor the file.
    #[error("no token for index '{index}': set {env} or add token to the credentials file")]
    MissingToken {
        /// The index lacking a token.
        index: String,
        /// The environment variable that was consulted.
        env: String,
    },
}

/// Resolved authentication for one index.
#[derive(Clone)]
pub struct IndexAuth {
    /// Name of the index in the credentials file.
    pub name: String,
    /// Upload endpoint URL.
    pub repository: String,
    /// Account name at the index.
    pub username: String,
    /// Upload token.
    pub token: String,
}

// Manual Debug: the token must never end up in logs.
impl std::fmt::Debug for IndexAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexAuth")
            .field("name", &self.name)
            .field("repository", &self.repository)
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Location of the credentials file: `$RUNWAY_CREDENTIALS` if set,
/// otherwise `<config dir>/runway/credentials.toml`.
pub fn credentials_path() -> Result<PathBuf, ResolveError> {
    if let Ok(path) = std::env::var(CREDENTIALS_ENV) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("runway").join("credentials.toml"))
        .ok_or(ResolveError::NoConfigDir)
}

/// Load and validate the credentials file from its default location.
pub fn load() -> Result<CredentialsFile, ResolveError> {
    Ok(CredentialsFile::load(&credentials_path()?)?)
}

/// Environment variable carrying the token for `index`.
pub fn token_env_var(index: &str) -> String {
    let suffix: String = index
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("RUNWAY_TOKEN_{suffix}")
}

/// Resolve the auth for a named index, consulting the process
/// environment for the token.
pub fn resolve(creds: &CredentialsFile, index: &str) -> Result<IndexAuth, ResolveError> {
    resolve_with(creds, index, |var| std::env::var(var).ok())
}

/// Resolve the auth for a named index with an explicit environment
/// lookup, so the precedence rules are testable without touching the
/// process environment.
pub fn resolve_with(
    creds: &CredentialsFile,
    index: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<IndexAuth, ResolveError> {
    let entry = creds.find(index)?;
    let env_var = token_env_var(index);

    let token = env(&env_var)
        .or_else(|| entry.token.clone())
        .ok_or_else(|| ResolveError::MissingToken {
            index: index.to_string(),
            env: env_var,
        })?;

    Ok(IndexAuth {
        name: index.to_string(),
        repository: entry.repository.clone(),
        username: entry.username.clone(),
        token,
    })
}
