//! The package index client: upload and verification.
//!
//! Both operations are single-attempt by design — a failed upload is
//! reported and the operator re-runs, there is no retry or resume layer.

use crate::credentials::IndexAuth;
use runway_schema::{Artifact, ProjectName, Version};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from talking to a package index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// An artifact file could not be read before upload.
    #[error("failed to read artifact {path}: {source}")]
    Io {
        /// The unreadable artifact.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Transport-level HTTP failure.
    #[error("index request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The index rejected the configured credentials.
    #[error("index '{index}' rejected the credentials (check username and token)")]
    Auth {
        /// The index that refused.
        index: String,
    },

    /// The index already has a file with this name.
    ///
    /// Release artifacts are immutable on the index side; this usually
    /// means the version was already published.
    #[error("index already has {file}; bump the version instead of re-uploading")]
    AlreadyExists {
        /// The conflicting file name.
        file: String,
    },

    /// The index refused the upload for another reason.
    #[error("index returned HTTP {status}: {body}")]
    Rejected {
        /// The HTTP status code.
        status: u16,
        /// Response body, trimmed.
        body: String,
    },
}

/// Client for one configured index.
#[derive(Debug, Clone)]
pub struct IndexClient {
    http: reqwest::Client,
    auth: IndexAuth,
}

impl IndexClient {
    /// Create a client for the index described by `auth`.
    pub fn new(http: reqwest::Client, auth: IndexAuth) -> Self {
        Self { http, auth }
    }

    /// Name of the index this client talks to.
    pub fn index_name(&self) -> &str {
        &self.auth.name
    }

    /// Upload one artifact as a `multipart/form-data` POST.
    pub async fn upload(&self, artifact: &Artifact) -> Result<(), IndexError> {
        let file_name = artifact.file_name();
        let bytes = tokio::fs::read(&artifact.path)
            .await
            .map_err(|source| IndexError::Io {
                path: artifact.path.clone(),
                source,
            })?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("application/octet-stream")?;
        let form = reqwest::multipart::Form::new()
            .text("name", artifact.name.as_str().to_string())
            .text("version", artifact.version.as_str().to_string())
            .text("filetype", artifact.kind.as_str())
            .text("sha256_digest", artifact.sha256.as_str().to_string())
            .part("content", part);

        tracing::debug!(
            index = %self.auth.name,
            file = %file_name,
            "uploading artifact"
        );

        let response = self
            .http
            .post(&self.auth.repository)
            .basic_auth(&self.auth.username, Some(&self.auth.token))
            .multipart(form)
            .send()
            .await?;

        self.check_status(response, Some(file_name)).await
    }

    /// Check whether a release is visible on the index.
    ///
    /// Returns `Ok(true)` when the release page answers 2xx, `Ok(false)`
    /// on 404 (published artifacts can take a moment to appear).
    pub async fn verify(
        &self,
        name: &ProjectName,
        version: &Version,
    ) -> Result<bool, IndexError> {
        let url = self.release_url(name, version);
        tracing::debug!(index = %self.auth.name, %url, "verifying release");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.auth.username, Some(&self.auth.token))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        self.check_status(response, None).await?;
        Ok(true)
    }

    /// URL of the release page for `name`/`version`.
    fn release_url(&self, name: &ProjectName, version: &Version) -> String {
        let base = self.auth.repository.trim_end_matches('/');
        format!("{base}/{name}/{version}/")
    }

    /// Map an index response to success or a typed error.
    async fn check_status(
        &self,
        response: reqwest::Response,
        file: Option<String>,
    ) -> Result<(), IndexError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(IndexError::Auth {
                index: self.auth.name.clone(),
            });
        }
        if status == reqwest::StatusCode::CONFLICT {
            if let Some(file) = file {
                return Err(IndexError::AlreadyExists { file });
            }
        }
        let body = response.text().await.unwrap_or_default();
        Err(IndexError::Rejected {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runway_schema::{ArtifactKind, Sha256Digest};

    fn auth_for(server_url: &str) -> IndexAuth {
        IndexAuth {
            name: "test".to_string(),
            repository: format!("{server_url}/upload/"),
            username: "alice".to_string(),
            token: "s3cret".to_string(),
        }
    }

    fn artifact(dir: &tempfile::TempDir) -> Artifact {
        let path = dir.path().join("demo-1.0.0.tar.gz");
        std::fs::write(&path, b"archive-bytes").unwrap();
        Artifact {
            name: ProjectName::new("demo"),
            version: Version::new("1.0.0"),
            kind: ArtifactKind::Sdist,
            path,
            sha256: Sha256Digest::from_bytes(&[1u8; 32]),
        }
    }

    #[tokio::test]
    async fn test_upload_sends_basic_auth() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();

        // base64("alice:s3cret")
        let mock = server
            .mock("POST", "/upload/")
            .match_header("authorization", "Basic YWxpY2U6czNjcmV0")
            .with_status(200)
            .create_async()
            .await;

        let client = IndexClient::new(reqwest::Client::new(), auth_for(&server.url()));
        client.upload(&artifact(&dir)).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_maps_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();

        let _mock = server
            .mock("POST", "/upload/")
            .with_status(401)
            .create_async()
            .await;

        let client = IndexClient::new(reqwest::Client::new(), auth_for(&server.url()));
        let err = client.upload(&artifact(&dir)).await.unwrap_err();
        assert!(matches!(err, IndexError::Auth { .. }));
    }

    #[tokio::test]
    async fn test_upload_maps_conflict() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();

        let _mock = server
            .mock("POST", "/upload/")
            .with_status(409)
            .create_async()
            .await;

        let client = IndexClient::new(reqwest::Client::new(), auth_for(&server.url()));
        let err = client.upload(&artifact(&dir)).await.unwrap_err();
        match err {
            IndexError::AlreadyExists { file } => assert_eq!(file, "demo-1.0.0.tar.gz"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_upload_surfaces_rejection_body() {
        let mut server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();

        let _mock = server
            .mock("POST", "/upload/")
            .with_status(400)
            .with_body("bad metadata")
            .create_async()
            .await;

        let client = IndexClient::new(reqwest::Client::new(), auth_for(&server.url()));
        let err = client.upload(&artifact(&dir)).await.unwrap_err();
        match err {
            IndexError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad metadata");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_verify_visible_and_missing() {
        let mut server = mockito::Server::new_async().await;

        let _found = server
            .mock("GET", "/upload/demo/1.0.0/")
            .with_status(200)
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/upload/demo/9.9.9/")
            .with_status(404)
            .create_async()
            .await;

        let client = IndexClient::new(reqwest::Client::new(), auth_for(&server.url()));
        let name = ProjectName::new("demo");

        assert!(client.verify(&name, &Version::new("1.0.0")).await.unwrap());
        assert!(!client.verify(&name, &Version::new("9.9.9")).await.unwrap());
    }
}
