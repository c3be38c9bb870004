//! The per-repository project manifest (`runway.toml`).

use crate::types::{ProjectName, Version};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default manifest file name, looked up in the repository root.
pub const MANIFEST_FILE: &str = "runway.toml";

/// Errors from loading, validating or saving a [`Manifest`].
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read or written.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was being accessed.
        path: PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The manifest file is not valid TOML or does not match the schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path of the offending file.
        path: PathBuf,
        /// The underlying TOML error.
        source: toml::de::Error,
    },

    /// The manifest parsed but its contents are unusable.
    #[error("invalid manifest: {0}")]
    Invalid(String),
}

/// The `[package]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Name under which artifacts are published.
    pub name: ProjectName,
}

/// A `[[version.marker]]` entry: an extra file embedding the version.
///
/// Exactly one of `pattern` and `key` must be set. `pattern` rewrites the
/// first capture group of a regex; `key` rewrites a dotted key in a TOML
/// file, preserving the file's formatting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    /// File containing the marker, relative to the repository root.
    pub file: PathBuf,
    /// Regex with exactly one capture group around the version.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Dotted key path into a TOML file (e.g. `package.version`).
    #[serde(default)]
    pub key: Option<String>,
}

/// The `[version]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSection {
    /// Canonical version file, relative to the repository root.
    #[serde(default = "default_version_file")]
    pub file: PathBuf,
    /// Additional version markers rewritten on bump.
    #[serde(default, rename = "marker")]
    pub markers: Vec<Marker>,
}

impl Default for VersionSection {
    fn default() -> Self {
        Self {
            file: default_version_file(),
            markers: Vec::new(),
        }
    }
}

fn default_version_file() -> PathBuf {
    PathBuf::from("VERSION")
}

/// The `[build]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    /// External command run in the repository root to produce built
    /// artifacts. Runs via `sh -c`.
    pub command: Option<String>,
    /// Glob patterns (relative to the repository root) matching the files
    /// the command produced.
    #[serde(default)]
    pub artifacts: Vec<String>,
}

/// The `[release]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseSection {
    /// Tag name template; `{version}` is substituted.
    #[serde(default = "default_tag_format")]
    pub tag_format: String,
    /// Git remote that receives the release commit and tag.
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Default upload target (an index name from the credentials file).
    #[serde(default = "default_index")]
    pub index: String,
    /// The production index name, targeted explicitly.
    #[serde(default = "default_production_index")]
    pub production_index: String,
}

impl Default for ReleaseSection {
    fn default() -> Self {
        Self {
            tag_format: default_tag_format(),
            remote: default_remote(),
            index: default_index(),
            production_index: default_production_index(),
        }
    }
}

fn default_tag_format() -> String {
    "v{version}".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_index() -> String {
    "test".to_string()
}

fn default_production_index() -> String {
    "production".to_string()
}

/// Parsed `runway.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// The `[package]` table.
    pub package: PackageSection,
    /// The `[version]` table.
    #[serde(default)]
    pub version: VersionSection,
    /// The `[build]` table.
    #[serde(default)]
    pub build: BuildSection,
    /// The `[release]` table.
    #[serde(default)]
    pub release: ReleaseSection,
}

impl Manifest {
    /// Load and validate a manifest from `path`.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let manifest: Manifest =
            toml::from_str(&content).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        manifest.validate()?;
        Ok(manifest)
    }

    /// Save the manifest atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ManifestError::Invalid(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let io_err = |source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        };
        std::fs::write(&temp_path, &content).map_err(io_err)?;
        std::fs::rename(&temp_path, path).map_err(io_err)?;

        Ok(())
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.package.name.is_empty() {
            return Err(ManifestError::Invalid("package.name is empty".to_string()));
        }
        if !self.release.tag_format.contains("{version}") {
            return Err(ManifestError::Invalid(format!(
                "release.tag_format '{}' does not contain {{version}}",
                self.release.tag_format
            )));
        }
        if self.release.index == self.release.production_index {
            return Err(ManifestError::Invalid(format!(
                "release.index and release.production_index are both '{}'",
                self.release.index
            )));
        }
        if self.build.command.is_none() && !self.build.artifacts.is_empty() {
            return Err(ManifestError::Invalid(
                "build.artifacts configured without build.command".to_string(),
            ));
        }
        for marker in &self.version.markers {
            match (&marker.pattern, &marker.key) {
                (Some(p), None) if !p.is_empty() => {}
                (None, Some(k)) if !k.is_empty() => {}
                _ => {
                    return Err(ManifestError::Invalid(format!(
                        "marker for {} must set exactly one of pattern or key",
                        marker.file.display()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Tag name for a release of `version`.
    pub fn tag_name(&self, version: &Version) -> String {
        self.release.tag_format.replace("{version}", version.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[package]
name = "demo"
"#;

    const FULL: &str = r#"
[package]
name = "Demo"

[version]
file = "demo/VERSION"

[[version.marker]]
file = "docs/site.toml"
pattern = 'version = "([^"]+)"'

[build]
command = "make dist"
artifacts = ["dist/*.whl"]

[release]
tag_format = "release-{version}"
remote = "upstream"
index = "staging"
production_index = "live"
"#;

    #[test]
    fn test_minimal_manifest_defaults() {
        let m: Manifest = toml::from_str(MINIMAL).unwrap();
        m.validate().unwrap();
        assert_eq!(m.package.name, "demo");
        assert_eq!(m.version.file, PathBuf::from("VERSION"));
        assert!(m.version.markers.is_empty());
        assert!(m.build.command.is_none());
        assert_eq!(m.release.tag_format, "v{version}");
        assert_eq!(m.release.remote, "origin");
        assert_eq!(m.release.index, "test");
        assert_eq!(m.release.production_index, "production");
    }

    #[test]
    fn test_full_manifest() {
        let m: Manifest = toml::from_str(FULL).unwrap();
        m.validate().unwrap();
        assert_eq!(m.package.name, "demo"); // normalized
        assert_eq!(m.version.markers.len(), 1);
        assert_eq!(m.build.command.as_deref(), Some("make dist"));
        assert_eq!(m.release.index, "staging");
    }

    #[test]
    fn test_tag_name() {
        let m: Manifest = toml::from_str(FULL).unwrap();
        let v = Version::new("2.1.0");
        assert_eq!(m.tag_name(&v), "release-2.1.0");
    }

    #[test]
    fn test_rejects_tag_format_without_version() {
        let mut m: Manifest = toml::from_str(MINIMAL).unwrap();
        m.release.tag_format = "latest".to_string();
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_rejects_same_test_and_production_index() {
        let mut m: Manifest = toml::from_str(MINIMAL).unwrap();
        m.release.production_index = m.release.index.clone();
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_rejects_marker_with_both_pattern_and_key() {
        let mut m: Manifest = toml::from_str(MINIMAL).unwrap();
        m.version.markers.push(Marker {
            file: PathBuf::from("site.toml"),
            pattern: Some("v([0-9.]+)".to_string()),
            key: Some("package.version".to_string()),
        });
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_rejects_marker_with_neither() {
        let mut m: Manifest = toml::from_str(MINIMAL).unwrap();
        m.version.markers.push(Marker {
            file: PathBuf::from("site.toml"),
            pattern: None,
            key: None,
        });
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_rejects_artifacts_without_command() {
        let mut m: Manifest = toml::from_str(MINIMAL).unwrap();
        m.build.artifacts = vec!["dist/*".to_string()];
        assert!(m.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let m: Manifest = toml::from_str(FULL).unwrap();
        m.save(&path).unwrap();

        let reloaded = Manifest::load(&path).unwrap();
        assert_eq!(reloaded.package.name, m.package.name);
        assert_eq!(reloaded.release.tag_format, m.release.tag_format);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Manifest::load(Path::new("/nonexistent/runway.toml")).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
