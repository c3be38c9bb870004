//! Build the distribution artifacts

use crate::ops::{flow, Context};
use crate::ui::output::format_size;
use crate::ui::{Output, Reporter};
use anyhow::Result;
use runway_core::version_file;
use std::sync::Arc;

/// Build the source archive and run the configured build command.
pub fn build(dry_run: bool, quiet: bool) -> Result<()> {
    let output = Arc::new(Output::new(quiet));
    let ctx = Context::load(output.clone())?;

    let version = version_file::read_version(ctx.repo.root(), &ctx.manifest.version)?;

    if dry_run {
        output.info(&format!(
            "would build artifacts for {} {version} into dist/",
            ctx.manifest.package.name
        ));
        if let Some(command) = &ctx.manifest.build.command {
            output.detail(&format!("build command: {command}"));
        }
        return Ok(());
    }

    let artifacts = flow::build_artifacts(&ctx, &version)?;

    for artifact in &artifacts {
        let size = std::fs::metadata(&artifact.path).map(|m| m.len()).unwrap_or(0);
        output.info(&format!(
            "{}  {}  {}",
            artifact.file_name(),
            format_size(size),
            artifact.kind
        ));
    }
    output.success(&format!("{} artifact(s) in dist/", artifacts.len()));
    output.info("Upload with 'runway publish'.");
    Ok(())
}
