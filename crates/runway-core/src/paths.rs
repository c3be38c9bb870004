//! Well-known paths.

use std::path::{Path, PathBuf};

/// Directory artifacts are written to, under the repository root.
pub const DIST_DIR: &str = "dist";

/// The artifact output directory for a repository.
pub fn dist_dir(root: &Path) -> PathBuf {
    root.join(DIST_DIR)
}
