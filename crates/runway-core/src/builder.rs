//! The external build command and its artifacts.
//!
//! Runway is not a build system: the "built package" artifacts come from
//! whatever command the manifest configures, run once in the repository
//! root. Runway only invokes it, collects the declared outputs, and
//! digests them.

use crate::digest::sha256_file;
use runway_schema::manifest::BuildSection;
use runway_schema::{Artifact, ArtifactKind, ProjectName, Version};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use thiserror::Error;
use wait_timeout::ChildExt;

/// Hard timeout for the external build command.
const BUILD_TIMEOUT: Duration = Duration::from_secs(1800);

/// Errors from running the build command or collecting its outputs.
#[derive(Error, Debug)]
pub enum BuildError {
    /// The shell could not be spawned.
    #[error("failed to run build command '{command}': {source}")]
    Spawn {
        /// The configured command.
        command: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The build command exited non-zero.
    #[error("build command '{command}' failed with {status}: {stderr}")]
    CommandFailed {
        /// The configured command.
        command: String,
        /// The exit status.
        status: std::process::ExitStatus,
        /// Trimmed stderr from the command.
        stderr: String,
    },

    /// The build command did not finish within the timeout.
    #[error("build command '{command}' timed out after {seconds} seconds")]
    TimedOut {
        /// The configured command.
        command: String,
        /// The timeout that expired.
        seconds: u64,
    },

    /// An artifact glob does not parse.
    #[error("invalid artifact pattern '{pattern}': {source}")]
    BadPattern {
        /// The offending pattern.
        pattern: String,
        /// The underlying glob error.
        source: glob::PatternError,
    },

    /// An artifact glob matched no files.
    #[error("artifact pattern '{pattern}' matched nothing")]
    NoMatches {
        /// The pattern that found no files.
        pattern: String,
    },

    /// A matched artifact could not be read or a sidecar written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },
}

/// Run the configured build command via `sh -c` in the repository root,
/// with a hard timeout so a wedged build cannot hang the release.
pub fn run_build_command(root: &Path, command: &str) -> Result<(), BuildError> {
    tracing::debug!(%command, root = %root.display(), "running build command");
    let spawn_err = |source| BuildError::Spawn {
        command: command.to_string(),
        source,
    };

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_err)?;

    let Some(status) = child.wait_timeout(BUILD_TIMEOUT).map_err(spawn_err)? else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(BuildError::TimedOut {
            command: command.to_string(),
            seconds: BUILD_TIMEOUT.as_secs(),
        });
    };

    let stdout = child
        .stdout
        .take()
        .map(std::io::read_to_string)
        .transpose()
        .map_err(spawn_err)?
        .unwrap_or_default();
    let stderr = child
        .stderr
        .take()
        .map(std::io::read_to_string)
        .transpose()
        .map_err(spawn_err)?
        .unwrap_or_default();

    if !status.success() {
        return Err(BuildError::CommandFailed {
            command: command.to_string(),
            status,
            stderr: stderr.trim().to_string(),
        });
    }
    if !stdout.trim().is_empty() {
        tracing::debug!(stdout = %stdout.trim(), "build command output");
    }
    Ok(())
}

/// Collect the build command's outputs via the manifest's glob patterns.
///
/// Every pattern must match at least one file; a pattern that matches
/// nothing means the build did not produce what the manifest promised.
pub fn collect_built_artifacts(
    root: &Path,
    build: &BuildSection,
    name: &ProjectName,
    version: &Version,
) -> Result<Vec<Artifact>, BuildError> {
    let mut matched = BTreeSet::new();

    for pattern in &build.artifacts {
        let full_pattern = root.join(pattern).to_string_lossy().into_owned();
        let paths = glob::glob(&full_pattern).map_err(|source| BuildError::BadPattern {
            pattern: pattern.clone(),
            source,
        })?;

        let mut any = false;
        for entry in paths {
            let path = entry.map_err(|e| BuildError::Io {
                path: PathBuf::from(&full_pattern),
                source: e.into_error(),
            })?;
            // Checksum sidecars are never artifacts themselves, even
            // when a broad glob like `dist/*` sweeps them up.
            if path.extension().is_some_and(|ext| ext == "sha256") {
                continue;
            }
            if path.is_file() {
                any = true;
                matched.insert(path);
            }
        }
        if !any {
            return Err(BuildError::NoMatches {
                pattern: pattern.clone(),
            });
        }
    }

    let mut artifacts = Vec::with_capacity(matched.len());
    for path in matched {
        let sha256 = sha256_file(&path).map_err(|source| BuildError::Io {
            path: path.clone(),
            source,
        })?;

        let artifact = Artifact {
            name: name.clone(),
            version: version.clone(),
            kind: ArtifactKind::Built,
            path,
            sha256,
        };
        if !artifact.file_name().contains(version.as_str()) {
            tracing::warn!(
                file = %artifact.file_name(),
                %version,
                "built artifact file name does not embed the release version"
            );
        }
        artifacts.push(artifact);
    }

    Ok(artifacts)
}

/// Write a `.sha256` sidecar next to every artifact.
///
/// Format is the conventional `<hex>  <filename>` line accepted by
/// `sha256sum -c`.
pub fn write_checksums(artifacts: &[Artifact]) -> Result<Vec<PathBuf>, BuildError> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let mut os = artifact.path.as_os_str().to_owned();
        os.push(".sha256");
        let sidecar = PathBuf::from(os);

        let line = format!("{}  {}\n", artifact.sha256, artifact.file_name());
        std::fs::write(&sidecar, line).map_err(|source| BuildError::Io {
            path: sidecar.clone(),
            source,
        })?;
        written.push(sidecar);
    }
    Ok(written)
}
