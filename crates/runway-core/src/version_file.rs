//! Reading and rewriting the version file and version markers.
//!
//! The canonical version file holds the version and nothing else. Markers
//! are additional places in the tree that embed the version (docs,
//! manifests) and must be rewritten in the same release commit so they
//! cannot drift. A marker that matches nothing is an error, not a no-op:
//! a silently stale marker is exactly the failure the runbook polices.

use regex::Regex;
use runway_schema::manifest::{Marker, VersionSection};
use runway_schema::{Version, VersionError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading or rewriting version markers.
#[derive(Error, Debug)]
pub enum VersionFileError {
    /// A marker or version file could not be read or written.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The canonical version file does not hold a semantic version.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A marker regex does not compile.
    #[error("invalid marker pattern for {file}: {source}")]
    BadPattern {
        /// Marker file the pattern belongs to.
        file: PathBuf,
        /// The underlying regex error.
        source: regex::Error,
    },

    /// A marker regex has no capture group to rewrite.
    #[error("marker pattern for {file} has no capture group: {pattern}")]
    NoCaptureGroup {
        /// Marker file the pattern belongs to.
        file: PathBuf,
        /// The offending pattern.
        pattern: String,
    },

    /// A marker matched nothing in its file.
    #[error("marker pattern matched nothing in {file}: {pattern}")]
    NoMatch {
        /// File that was searched.
        file: PathBuf,
        /// The pattern that found no match.
        pattern: String,
    },

    /// A TOML marker file does not parse.
    #[error("failed to parse TOML marker file {file}: {source}")]
    Toml {
        /// The offending file.
        file: PathBuf,
        /// The underlying TOML error.
        source: toml_edit::TomlError,
    },

    /// A TOML marker key is absent from its file.
    #[error("key '{key}' not found in {file}")]
    NoKey {
        /// File that was searched.
        file: PathBuf,
        /// The dotted key that is missing.
        key: String,
    },

    /// A marker sets neither `pattern` nor `key` (manifest validation
    /// normally catches this earlier).
    #[error("marker for {0} has neither pattern nor key")]
    EmptyMarker(PathBuf),
}

/// Read and parse the canonical version file.
pub fn read_version(root: &Path, section: &VersionSection) -> Result<Version, VersionFileError> {
    let path = root.join(&section.file);
    let content = std::fs::read_to_string(&path).map_err(|source| VersionFileError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(Version::parse(&content)?)
}

/// Write `new` to the canonical version file and every marker.
///
/// Returns the repository-relative paths that were rewritten, in the
/// order they were touched (canonical file first). Markers are rewritten
/// one by one; on failure, files already rewritten stay rewritten and the
/// error names the marker that failed, so the operator sees exactly where
/// the checklist stopped.
pub fn write_version(
    root: &Path,
    section: &VersionSection,
    new: &Version,
) -> Result<Vec<PathBuf>, VersionFileError> {
    let mut touched = Vec::with_capacity(1 + section.markers.len());

    let canonical = root.join(&section.file);
    atomic_write(&canonical, &format!("{new}\n"))?;
    touched.push(section.file.clone());

    for marker in &section.markers {
        rewrite_marker(root, marker, new)?;
        touched.push(marker.file.clone());
    }

    Ok(touched)
}

/// Rewrite one marker file.
fn rewrite_marker(root: &Path, marker: &Marker, new: &Version) -> Result<(), VersionFileError> {
    let path = root.join(&marker.file);
    let content = std::fs::read_to_string(&path).map_err(|source| VersionFileError::Io {
        path: path.clone(),
        source,
    })?;

    let rewritten = match (&marker.pattern, &marker.key) {
        (Some(pattern), _) => rewrite_pattern(&marker.file, &content, pattern, new)?,
        (None, Some(key)) => rewrite_toml_key(&marker.file, &content, key, new)?,
        (None, None) => return Err(VersionFileError::EmptyMarker(marker.file.clone())),
    };

    atomic_write(&path, &rewritten)
}

/// Replace the first capture group of every match with the new version.
fn rewrite_pattern(
    file: &Path,
    content: &str,
    pattern: &str,
    new: &Version,
) -> Result<String, VersionFileError> {
    let re = Regex::new(pattern).map_err(|source| VersionFileError::BadPattern {
        file: file.to_path_buf(),
        source,
    })?;
    if re.captures_len() < 2 {
        return Err(VersionFileError::NoCaptureGroup {
            file: file.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }

    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    let mut matched = false;
    for caps in re.captures_iter(content) {
        let Some(group) = caps.get(1) else { continue };
        matched = true;
        out.push_str(&content[last..group.start()]);
        out.push_str(new.as_str());
        last = group.end();
    }
    out.push_str(&content[last..]);

    if !matched {
        return Err(VersionFileError::NoMatch {
            file: file.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }
    Ok(out)
}

/// Set a dotted key in a TOML file, preserving formatting and comments.
fn rewrite_toml_key(
    file: &Path,
    content: &str,
    key: &str,
    new: &Version,
) -> Result<String, VersionFileError> {
    let mut doc: toml_edit::DocumentMut =
        content.parse().map_err(|source| VersionFileError::Toml {
            file: file.to_path_buf(),
            source,
        })?;

    let no_key = || VersionFileError::NoKey {
        file: file.to_path_buf(),
        key: key.to_string(),
    };

    let parts: Vec<&str> = key.split('.').collect();
    let mut table = doc.as_table_mut();
    for part in &parts[..parts.len() - 1] {
        table = table
            .get_mut(part)
            .and_then(toml_edit::Item::as_table_mut)
            .ok_or_else(no_key)?;
    }
    let last = parts[parts.len() - 1];
    if !table.contains_key(last) {
        return Err(no_key());
    }
    table[last] = toml_edit::value(new.as_str());

    Ok(doc.to_string())
}

/// Write a file atomically: temp file in the same directory, then rename.
fn atomic_write(path: &Path, content: &str) -> Result<(), VersionFileError> {
    let io_err = |source| VersionFileError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    std::fs::write(tmp.path(), content).map_err(io_err)?;
    tmp.persist(path)
        .map_err(|e| io_err(e.error))?;
    Ok(())
}
