//! Source archive construction.
//!
//! The source archive is the one artifact runway builds itself: a gzip'd
//! tar of every tracked file, under a `<name>-<version>/` prefix, written
//! to `dist/`. Entries are added in sorted order so two builds of the
//! same tree produce the same entry sequence.

use crate::digest::sha256_file;
use crate::git::{GitError, GitRepo};
use crate::paths;
use flate2::Compression;
use flate2::write::GzEncoder;
use runway_schema::{Artifact, ArtifactKind, ProjectName, Version};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from building the source archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Listing tracked files failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// A file could not be read or the archive could not be written.
    #[error("failed to archive {path}: {source}")]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },
}

/// Build `dist/<name>-<version>.tar.gz` from the tracked tree.
pub fn build_sdist(
    repo: &GitRepo,
    name: &ProjectName,
    version: &Version,
) -> Result<Artifact, ArchiveError> {
    let dist = paths::dist_dir(repo.root());
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ArchiveError::Io { path, source }
    };

    std::fs::create_dir_all(&dist).map_err(io_err(&dist))?;

    let prefix = format!("{name}-{version}");
    let out_path = dist.join(format!("{prefix}.tar.gz"));

    let mut files = repo.tracked_files()?;
    files.sort();

    let out_file = std::fs::File::create(&out_path).map_err(io_err(&out_path))?;
    let encoder = GzEncoder::new(out_file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for rel in &files {
        let full = repo.root().join(rel);
        // Submodule entries and files deleted from the index show up in
        // ls-files but are not regular files here.
        if !full.is_file() {
            tracing::debug!(path = %rel.display(), "skipping non-file tree entry");
            continue;
        }
        let entry_name = Path::new(&prefix).join(rel);
        builder
            .append_path_with_name(&full, &entry_name)
            .map_err(io_err(&full))?;
    }

    let encoder = builder.into_inner().map_err(io_err(&out_path))?;
    encoder.finish().map_err(io_err(&out_path))?;

    let sha256 = sha256_file(&out_path).map_err(io_err(&out_path))?;
    tracing::debug!(archive = %out_path.display(), %sha256, "built source archive");

    Ok(Artifact {
        name: name.clone(),
        version: version.clone(),
        kind: ArtifactKind::Sdist,
        path: out_path,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::process::{Command, Stdio};

    fn scratch_repo() -> (tempfile::TempDir, GitRepo) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        let git = |args: &[&str]| {
            let status = Command::new("git")
                .args(args)
                .current_dir(root)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .unwrap();
            assert!(status.success(), "git {args:?} failed");
        };

        git(&["init", "--initial-branch=main"]);
        git(&["config", "user.email", "test@example.org"]);
        git(&["config", "user.name", "Test"]);
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("README"), "demo\n").unwrap();
        std::fs::write(root.join("src/lib.py"), "x = 1\n").unwrap();
        git(&["add", "."]);
        git(&["commit", "-m", "initial"]);

        let repo = GitRepo::open(root);
        (dir, repo)
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let file = std::fs::File::open(path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive
            .entries()
            .unwrap()
            .map(|e| {
                e.unwrap()
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn test_sdist_contains_tracked_files_under_prefix() {
        let (_dir, repo) = scratch_repo();
        // An untracked file must not end up in the archive.
        std::fs::write(repo.root().join("scratch.txt"), "junk\n").unwrap();

        let artifact = build_sdist(
            &repo,
            &ProjectName::new("demo"),
            &Version::new("1.0.0"),
        )
        .unwrap();

        assert_eq!(artifact.kind, ArtifactKind::Sdist);
        assert_eq!(artifact.file_name(), "demo-1.0.0.tar.gz");
        artifact.validate().unwrap();

        let names = entry_names(&artifact.path);
        assert_eq!(names, vec!["demo-1.0.0/README", "demo-1.0.0/src/lib.py"]);
    }

    #[test]
    fn test_sdist_digest_matches_file() {
        let (_dir, repo) = scratch_repo();
        let artifact = build_sdist(
            &repo,
            &ProjectName::new("demo"),
            &Version::new("1.0.0"),
        )
        .unwrap();

        let recomputed = sha256_file(&artifact.path).unwrap();
        assert_eq!(artifact.sha256, recomputed);
    }
}
