//! Check that a release is visible on an index

use crate::ops::Context;
use crate::ui::{Output, Reporter};
use anyhow::Result;
use runway_core::version_file;
use std::sync::Arc;

/// Check whether the current version is visible on the given index.
pub async fn verify(index: Option<&str>, quiet: bool) -> Result<()> {
    let output = Arc::new(Output::new(quiet));
    let ctx = Context::load(output.clone())?;

    let version = version_file::read_version(ctx.repo.root(), &ctx.manifest.version)?;
    let name = &ctx.manifest.package.name;

    let client = ctx.index_client(index)?;
    if client.verify(name, &version).await? {
        output.success(&format!(
            "{name} {version} is visible on '{}'",
            client.index_name()
        ));
        Ok(())
    } else {
        anyhow::bail!(
            "{name} {version} is not visible on '{}'",
            client.index_name()
        )
    }
}
