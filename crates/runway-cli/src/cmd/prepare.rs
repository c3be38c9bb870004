//! Commit the version change, tag it, and push

use crate::ops::flow::{PendingRelease, VersionSpec};
use crate::ops::Context;
use crate::ui::{Output, Reporter};
use anyhow::Result;
use std::sync::Arc;

/// Turn the working tree into a pushed, tagged release commit.
pub fn prepare(
    bump: Option<&str>,
    set: Option<&str>,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let output = Arc::new(Output::new(quiet));
    let ctx = Context::load(output.clone())?;

    let spec = VersionSpec::from_args(bump, set)?;
    let pending = PendingRelease::plan(&ctx, &spec)?;
    let tagged = pending.prepare(&ctx, dry_run)?;

    if dry_run {
        output.info("dry run; nothing was changed");
    } else {
        output.success(&format!(
            "prepared release {} (tag {})",
            tagged.version, tagged.tag
        ));
        output.info("Build artifacts with 'runway build'.");
    }
    Ok(())
}
