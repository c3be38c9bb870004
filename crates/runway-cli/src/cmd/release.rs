//! The whole checklist in one command

use crate::ops::flow::{PendingRelease, VersionSpec};
use crate::ops::Context;
use crate::ui::output::confirm;
use crate::ui::{Output, Reporter};
use anyhow::Result;
use std::sync::Arc;

/// Run the full pipeline: prepare, build, publish to the test index,
/// verify, and optionally publish to the production index.
pub async fn release(
    bump: Option<&str>,
    set: Option<&str>,
    production: bool,
    yes: bool,
    dry_run: bool,
    quiet: bool,
) -> Result<()> {
    let output = Arc::new(Output::new(quiet));
    let ctx = Context::load(output.clone())?;
    let name = ctx.manifest.package.name.clone();

    let spec = VersionSpec::from_args(bump, set)?;
    let pending = PendingRelease::plan(&ctx, &spec)?;

    output.info(&format!(
        "Releasing {name} {} (current {}, tag {}, branch {})",
        pending.target, pending.current, pending.tag, pending.branch
    ));

    if !dry_run && !yes {
        let index = &ctx.manifest.release.index;
        let prompt = if production {
            format!(
                "Release {name} {} to '{index}' and '{}'?",
                pending.target, ctx.manifest.release.production_index
            )
        } else {
            format!("Release {name} {} to '{index}'?", pending.target)
        };
        if !confirm(&prompt)? {
            output.info("aborted");
            return Ok(());
        }
    }

    let tagged = pending.prepare(&ctx, dry_run)?;
    let built = tagged.build(&ctx, dry_run)?;

    let published = built.publish(&ctx, None, false, dry_run).await?;

    if production {
        if published.visible == Some(false) {
            output.warning(&format!(
                "continuing to the production index although '{}' does not show the release yet",
                published.index
            ));
        }
        let prod = ctx.manifest.release.production_index.clone();
        built.publish(&ctx, Some(&prod), false, dry_run).await?;
    }

    if dry_run {
        output.info("dry run complete; nothing was changed");
    } else {
        output.success(&format!("released {name} {}", built.version));
        if !production {
            output.info(&format!(
                "When the release looks good, run 'runway publish --index {}'.",
                ctx.manifest.release.production_index
            ));
        }
    }
    Ok(())
}
