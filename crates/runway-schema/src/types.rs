//! Project name and version newtypes.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::str::FromStr;
use thiserror::Error;

/// A normalized project name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectName(String);

impl ProjectName {
    /// Create a new project name, normalizing the input to lowercase.
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for ProjectName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProjectName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl PartialEq<str> for ProjectName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl PartialEq<&str> for ProjectName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

/// Errors from parsing or bumping a [`Version`].
#[derive(Error, Debug)]
pub enum VersionError {
    /// The input string is not a valid semantic version.
    #[error("invalid semantic version '{input}': {source}")]
    Invalid {
        /// The rejected input.
        input: String,
        /// The underlying semver parse error.
        source: semver::Error,
    },
}

/// Which component of a semantic version to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpLevel {
    /// Increment the major component, resetting minor and patch.
    Major,
    /// Increment the minor component, resetting patch.
    Minor,
    /// Increment the patch component.
    Patch,
}

impl FromStr for BumpLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(format!(
                "unknown bump level '{other}' (expected major, minor or patch)"
            )),
        }
    }
}

impl std::fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

/// A semantic version string.
///
/// Stored as the literal string so that display round-trips exactly what
/// the version file contains; ordering and bumping go through `semver`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(String);

impl Version {
    /// Create a new version from the given string (stored as-is).
    pub fn new(v: &str) -> Self {
        Self(v.to_string())
    }

    /// Parse and validate a semantic version.
    pub fn parse(v: &str) -> Result<Self, VersionError> {
        let trimmed = v.trim();
        semver::Version::parse(trimmed).map_err(|source| VersionError::Invalid {
            input: trimmed.to_string(),
            source,
        })?;
        Ok(Self(trimmed.to_string()))
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the version carries a pre-release component.
    pub fn is_prerelease(&self) -> bool {
        semver::Version::parse(&self.0).is_ok_and(|v| !v.pre.is_empty())
    }

    /// Produce the next version at the given bump level.
    ///
    /// Lower components reset to zero and any pre-release or build
    /// metadata is cleared: `1.2.3-rc.1` bumped at patch level becomes
    /// `1.2.4`.
    pub fn bump(&self, level: BumpLevel) -> Result<Self, VersionError> {
        let mut v = semver::Version::parse(&self.0).map_err(|source| VersionError::Invalid {
            input: self.0.clone(),
            source,
        })?;

        match level {
            BumpLevel::Major => {
                v.major += 1;
                v.minor = 0;
                v.patch = 0;
            }
            BumpLevel::Minor => {
                v.minor += 1;
                v.patch = 0;
            }
            BumpLevel::Patch => {
                v.patch += 1;
            }
        }
        v.pre = semver::Prerelease::EMPTY;
        v.build = semver::BuildMetadata::EMPTY;

        Ok(Self(v.to_string()))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (
            semver::Version::parse(&self.0),
            semver::Version::parse(&other.0),
        ) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for Version {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl PartialEq<str> for Version {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name_normalizes() {
        let name = ProjectName::new("MyProject");
        assert_eq!(name.as_str(), "myproject");
        assert_eq!(name, "MyProject");
    }

    #[test]
    fn test_parse_valid() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.as_str(), "1.2.3");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let v = Version::parse("1.2.3\n").unwrap();
        assert_eq!(v.as_str(), "1.2.3");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("not-a-version").is_err());
        assert!(Version::parse("").is_err());
    }

    #[test]
    fn test_bump_patch() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.bump(BumpLevel::Patch).unwrap(), "1.2.4");
    }

    #[test]
    fn test_bump_minor_resets_patch() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.bump(BumpLevel::Minor).unwrap(), "1.3.0");
    }

    #[test]
    fn test_bump_major_resets_lower() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!(v.bump(BumpLevel::Major).unwrap(), "2.0.0");
    }

    #[test]
    fn test_bump_clears_prerelease() {
        let v = Version::parse("1.2.3-rc.1").unwrap();
        assert!(v.is_prerelease());
        let bumped = v.bump(BumpLevel::Patch).unwrap();
        assert_eq!(bumped, "1.2.4");
        assert!(!bumped.is_prerelease());
    }

    #[test]
    fn test_ordering_is_semver() {
        let a = Version::parse("0.10.0").unwrap();
        let b = Version::parse("0.9.1").unwrap();
        assert!(a > b);

        let pre = Version::parse("1.0.0-rc.1").unwrap();
        let rel = Version::parse("1.0.0").unwrap();
        assert!(pre < rel);
    }

    #[test]
    fn test_bump_level_from_str() {
        assert_eq!("major".parse::<BumpLevel>().unwrap(), BumpLevel::Major);
        assert_eq!("patch".parse::<BumpLevel>().unwrap(), BumpLevel::Patch);
        assert!("huge".parse::<BumpLevel>().is_err());
    }
}
