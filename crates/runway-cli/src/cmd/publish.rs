//! Upload previously built artifacts to an index

use crate::ops::flow::{self, BuiltRelease};
use crate::ops::Context;
use crate::ui::Output;
use anyhow::Result;
use runway_core::version_file;
use std::sync::Arc;

/// Upload the artifacts for the current version, then verify visibility.
pub async fn publish(
    index: Option<&str>,
    skip_verify: bool,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let output = Arc::new(Output::new(quiet));
    let ctx = Context::load(output)?;

    let version = version_file::read_version(ctx.repo.root(), &ctx.manifest.version)?;
    let artifacts = flow::gather_existing_artifacts(&ctx, &version)?;

    let built = BuiltRelease {
        tag: ctx.manifest.tag_name(&version),
        version,
        artifacts,
    };
    built.publish(&ctx, index, skip_verify, dry_run).await?;
    Ok(())
}
