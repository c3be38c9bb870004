//! One-time setup: write the manifest and credentials skeletons

use crate::ui::{Output, Reporter};
use anyhow::{Context as _, Result};
use runway_core::credentials;
use runway_core::git::GitRepo;
use runway_schema::manifest::MANIFEST_FILE;
use std::path::Path;

/// Create `runway.toml` in the repository root and, if absent, a
/// credentials file skeleton in the user config directory.
pub fn init(force: bool, quiet: bool) -> Result<()> {
    let output = Output::new(quiet);

    let repo = GitRepo::discover(Path::new("."))
        .context("runway must be initialized inside a git repository")?;
    let manifest_path = repo.root().join(MANIFEST_FILE);

    if manifest_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            manifest_path.display()
        );
    }

    let name = repo
        .root()
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_else(|| "my-project".to_string());

    let template = format!(
        r#"[package]
name = "{name}"

[version]
file = "VERSION"

# Extra places the version appears; rewritten on every bump.
# [[version.marker]]
# file = "docs/site.toml"
# key = "site.version"
#
# [[version.marker]]
# file = "README.md"
# pattern = '{name}-([0-9]+\.[0-9]+\.[0-9]+)'

[build]
# External command producing the built package(s), run in the repo root.
# command = "make dist"
# artifacts = ["dist/*.whl"]

[release]
tag_format = "v{{version}}"
remote = "origin"
index = "test"
production_index = "production"
"#
    );

    std::fs::write(&manifest_path, template)
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;
    output.success(&format!("Created {}", manifest_path.display()));

    let version_path = repo.root().join("VERSION");
    if !version_path.exists() {
        std::fs::write(&version_path, "0.1.0\n")
            .with_context(|| format!("failed to write {}", version_path.display()))?;
        output.success(&format!("Created {} (0.1.0)", version_path.display()));
    }

    let creds_path = credentials::credentials_path()?;
    if creds_path.exists() {
        output.info(&format!(
            "Credentials file already present: {}",
            creds_path.display()
        ));
    } else {
        write_credentials_skeleton(&creds_path)?;
        output.success(&format!("Created {}", creds_path.display()));
        output.info("Fill in repository URLs, usernames and tokens before publishing.");
    }

    output.info("Run 'runway status' to check the setup.");
    Ok(())
}

/// Write the credentials skeleton with owner-only permissions.
fn write_credentials_skeleton(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let template = r#"index-servers = ["test", "production"]

[index.test]
repository = "https://test.index.example.org/upload/"
username = "CHANGE-ME"
# token = "..."   # or set RUNWAY_TOKEN_TEST

[index.production]
repository = "https://index.example.org/upload/"
username = "CHANGE-ME"
# token = "..."   # or set RUNWAY_TOKEN_PRODUCTION
"#;

    std::fs::write(path, template)
        .with_context(|| format!("failed to write {}", path.display()))?;

    // The file may hold tokens; keep it owner-only.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }

    Ok(())
}
