//! Preflight checks: everything the runbook has an operator eyeball,
//! checked mechanically before a release is attempted.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, Table};
use runway_core::git::GitRepo;
use runway_core::{credentials, version_file};
use runway_schema::manifest::MANIFEST_FILE;
use runway_schema::{Manifest, Version};
use std::path::Path;

/// One preflight check: what was checked, and either a detail line or a
/// failure reason.
type Check = (&'static str, Result<String, String>);

/// Run all preflight checks and render them as a table. Fails (exit 1)
/// when any check fails.
pub fn status(_quiet: bool) -> Result<()> {
    let mut checks: Vec<Check> = Vec::new();

    // Tooling
    match which::which("git") {
        Ok(path) => checks.push(("git binary", Ok(path.display().to_string()))),
        Err(e) => checks.push(("git binary", Err(e.to_string()))),
    }

    // Repository
    let repo = match GitRepo::discover(Path::new(".")) {
        Ok(repo) => {
            checks.push(("repository", Ok(repo.root().display().to_string())));
            Some(repo)
        }
        Err(e) => {
            checks.push(("repository", Err(e.to_string())));
            None
        }
    };

    if let Some(repo) = &repo {
        match repo.dirty_paths() {
            Ok(dirty) if dirty.is_empty() => {
                checks.push(("worktree", Ok("clean".to_string())));
            }
            Ok(dirty) => {
                checks.push(("worktree", Err(format!("{} uncommitted path(s)", dirty.len()))));
            }
            Err(e) => checks.push(("worktree", Err(e.to_string()))),
        }
    }

    // Manifest and version
    let manifest = repo.as_ref().and_then(|repo| {
        match Manifest::load(&repo.root().join(MANIFEST_FILE)) {
            Ok(manifest) => {
                checks.push(("manifest", Ok(MANIFEST_FILE.to_string())));
                Some(manifest)
            }
            Err(e) => {
                checks.push(("manifest", Err(e.to_string())));
                None
            }
        }
    });

    let version: Option<Version> = match (&repo, &manifest) {
        (Some(repo), Some(manifest)) => {
            match version_file::read_version(repo.root(), &manifest.version) {
                Ok(version) => {
                    checks.push(("version file", Ok(version.to_string())));
                    Some(version)
                }
                Err(e) => {
                    checks.push(("version file", Err(e.to_string())));
                    None
                }
            }
        }
        _ => None,
    };

    if let (Some(repo), Some(manifest), Some(version)) = (&repo, &manifest, &version) {
        let tag = manifest.tag_name(version);
        match repo.tag_exists(&tag) {
            Ok(false) => checks.push(("release tag", Ok(format!("{tag} available")))),
            Ok(true) => checks.push(("release tag", Err(format!("{tag} already exists")))),
            Err(e) => checks.push(("release tag", Err(e.to_string()))),
        }
    }

    // Build command
    if let Some(manifest) = &manifest {
        match &manifest.build.command {
            Some(command) => match which::which("sh") {
                Ok(_) => checks.push(("build command", Ok(command.clone()))),
                Err(e) => checks.push(("build command", Err(format!("sh not found: {e}")))),
            },
            None => checks.push((
                "build command",
                Ok("none configured (source archive only)".to_string()),
            )),
        }
    }

    // Credentials and indexes
    check_credentials(&mut checks, manifest.as_ref());

    render(&checks);

    let failed = checks.iter().filter(|(_, outcome)| outcome.is_err()).count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} preflight checks failed", checks.len());
    }
    Ok(())
}

/// Check the credentials file and both configured upload targets.
fn check_credentials(checks: &mut Vec<Check>, manifest: Option<&Manifest>) {
    let path = match credentials::credentials_path() {
        Ok(path) => path,
        Err(e) => {
            checks.push(("credentials", Err(e.to_string())));
            return;
        }
    };

    let creds = match runway_schema::CredentialsFile::load(&path) {
        Ok(creds) => {
            let modified = std::fs::metadata(&path)
                .ok()
                .and_then(|m| m.modified().ok())
                .map_or_else(
                    || "unknown".to_string(),
                    |t| {
                        chrono::DateTime::<chrono::Local>::from(t)
                            .format("%Y-%m-%d")
                            .to_string()
                    },
                );
            checks.push((
                "credentials",
                Ok(format!("{} (modified {modified})", path.display())),
            ));
            creds
        }
        Err(e) => {
            checks.push(("credentials", Err(e.to_string())));
            return;
        }
    };

    let Some(manifest) = manifest else { return };
    for (label, index) in [
        ("test index", &manifest.release.index),
        ("production index", &manifest.release.production_index),
    ] {
        match credentials::resolve(&creds, index) {
            Ok(auth) => checks.push((label, Ok(format!("'{index}' -> {}", auth.repository)))),
            Err(e) => checks.push((label, Err(e.to_string()))),
        }
    }
}

/// Render the check list; always printed, even with --quiet, because the
/// table is the command's output.
fn render(checks: &[Check]) {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);

    for (label, outcome) in checks {
        let (icon, detail) = match outcome {
            Ok(detail) => (Cell::new("ok").fg(Color::Green), detail.clone()),
            Err(reason) => (Cell::new("FAIL").fg(Color::Red), reason.clone()),
        };
        table.add_row(vec![icon, Cell::new(label), Cell::new(detail)]);
    }

    println!("{table}");
}
