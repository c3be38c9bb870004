//! Inspect or change the recorded version

use crate::ops::Context;
use crate::ui::{Output, Reporter};
use anyhow::Result;
use runway_core::version_file;
use runway_schema::{BumpLevel, Version};
use std::sync::Arc;

/// Print the version currently recorded in the version file.
pub fn show(quiet: bool) -> Result<()> {
    let ctx = Context::load(Arc::new(Output::new(quiet)))?;
    let version = version_file::read_version(ctx.repo.root(), &ctx.manifest.version)?;
    // The version is the command's output, so it prints even with --quiet.
    println!("{version}");
    Ok(())
}

/// Bump the recorded version at the given level.
pub fn bump(level: &str, dry_run: bool, quiet: bool) -> Result<()> {
    let level: BumpLevel = level.parse().map_err(anyhow::Error::msg)?;
    let output = Arc::new(Output::new(quiet));
    let ctx = Context::load(output.clone())?;

    let current = version_file::read_version(ctx.repo.root(), &ctx.manifest.version)?;
    let target = current.bump(level)?;
    apply(&ctx, &output, &current, &target, dry_run)
}

/// Set an explicit version.
pub fn set(version: &str, dry_run: bool, quiet: bool) -> Result<()> {
    let target = Version::parse(version)?;
    let output = Arc::new(Output::new(quiet));
    let ctx = Context::load(output.clone())?;

    let current = version_file::read_version(ctx.repo.root(), &ctx.manifest.version)?;
    apply(&ctx, &output, &current, &target, dry_run)
}

/// Rewrite the version file and markers, or report what would change.
fn apply(
    ctx: &Context,
    output: &Arc<Output>,
    current: &Version,
    target: &Version,
    dry_run: bool,
) -> Result<()> {
    if current == target {
        output.info(&format!("version is already {target}"));
        return Ok(());
    }

    if dry_run {
        output.info(&format!("would update version {current} -> {target} in:"));
        output.detail(&ctx.manifest.version.file.display().to_string());
        for marker in &ctx.manifest.version.markers {
            output.detail(&marker.file.display().to_string());
        }
        return Ok(());
    }

    let touched = version_file::write_version(ctx.repo.root(), &ctx.manifest.version, target)?;
    output.success(&format!("version {current} -> {target}"));
    for path in &touched {
        output.detail(&path.display().to_string());
    }
    output.info("Commit and tag with 'runway prepare'.");
    Ok(())
}
