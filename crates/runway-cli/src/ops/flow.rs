//! Release Flow Typestate Pattern
//!
//! Models the release pipeline as a series of explicit state transitions:
//!
//! ```text
//! PendingRelease --[prepare()]--> TaggedRelease --[build()]--> BuiltRelease
//!                                                                  |
//!                                              [publish(index)]    v
//!                                                         PublishedRelease
//! ```
//!
//! This enforces at compile-time that you cannot upload artifacts that
//! have not been built, or build before the tree is committed and tagged,
//! preventing the classic runbook accident of publishing a tree that does
//! not match its tag.

use crate::ops::{Context, ReleaseError};
use runway_core::{archive, builder, version_file};
use runway_schema::{Artifact, ArtifactKind, BumpLevel, Version};

/// How the release determines its target version.
#[derive(Debug, Clone)]
pub enum VersionSpec {
    /// Use the version already recorded in the version file.
    Keep,
    /// Bump the recorded version first.
    Bump(BumpLevel),
    /// Use this explicit version.
    Set(Version),
}

impl VersionSpec {
    /// Build a spec from the CLI's `--bump` / `--set` flags.
    pub fn from_args(bump: Option<&str>, set: Option<&str>) -> Result<Self, ReleaseError> {
        match (bump, set) {
            (Some(level), None) => {
                let level = level
                    .parse::<BumpLevel>()
                    .map_err(|e| ReleaseError::context("invalid --bump", e))?;
                Ok(Self::Bump(level))
            }
            (None, Some(version)) => Ok(Self::Set(Version::parse(version)?)),
            (None, None) => Ok(Self::Keep),
            // clap's conflicts_with rules this out
            (Some(_), Some(_)) => Err(ReleaseError::context(
                "invalid arguments",
                "--bump and --set are mutually exclusive",
            )),
        }
    }
}

/// State 1: a release that has been planned but not yet made.
///
/// Planning reads the current version, computes the target version, and
/// runs the hard preconditions: the worktree must be clean and the
/// release tag must not exist yet.
#[derive(Debug)]
pub struct PendingRelease {
    /// Version currently recorded in the version file.
    pub current: Version,
    /// Version this release will publish.
    pub target: Version,
    /// Tag that will be created.
    pub tag: String,
    /// Branch that will be pushed.
    pub branch: String,
}

/// State 2: the tree is committed, tagged and pushed.
#[derive(Debug)]
pub struct TaggedRelease {
    /// The released version.
    pub version: Version,
    /// The tag that now exists.
    pub tag: String,
}

/// State 3: distribution artifacts exist on disk.
#[derive(Debug)]
pub struct BuiltRelease {
    /// The released version.
    pub version: Version,
    /// The tag the artifacts were built from.
    pub tag: String,
    /// Artifacts in upload order (sorted by file name). Empty on dry
    /// runs.
    pub artifacts: Vec<Artifact>,
}

/// State 4: artifacts are on the index.
#[derive(Debug)]
pub struct PublishedRelease {
    /// The released version.
    pub version: Version,
    /// Index the artifacts were uploaded to.
    pub index: String,
    /// Number of files uploaded.
    pub uploaded: usize,
    /// Whether the release was visible on the index afterwards
    /// (`None` when verification was skipped).
    pub visible: Option<bool>,
}

impl PendingRelease {
    /// Plan a release: resolve the target version and check the
    /// preconditions.
    pub fn plan(ctx: &Context, spec: &VersionSpec) -> Result<Self, ReleaseError> {
        let dirty = ctx.repo.dirty_paths()?;
        if !dirty.is_empty() {
            let listed = dirty
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ReleaseError::DirtyWorktree(listed));
        }

        let current = version_file::read_version(ctx.repo.root(), &ctx.manifest.version)?;
        let target = match spec {
            VersionSpec::Keep => current.clone(),
            VersionSpec::Bump(level) => current.bump(*level)?,
            VersionSpec::Set(version) => version.clone(),
        };

        let tag = ctx.manifest.tag_name(&target);
        if ctx.repo.tag_exists(&tag)? {
            return Err(ReleaseError::TagExists(tag));
        }
        let branch = ctx.repo.current_branch()?;

        Ok(Self {
            current,
            target,
            tag,
            branch,
        })
    }

    /// True when this release changes the recorded version (and so needs
    /// a release commit before tagging).
    pub fn changes_version(&self) -> bool {
        self.current != self.target
    }

    /// Write the version everywhere, commit, tag, and push.
    ///
    /// With `dry_run` nothing is written; the planned actions are
    /// reported and the pipeline continues with the would-be state.
    pub fn prepare(self, ctx: &Context, dry_run: bool) -> Result<TaggedRelease, ReleaseError> {
        let reporter = &ctx.reporter;
        let name = &ctx.manifest.package.name;
        let remote = &ctx.manifest.release.remote;

        if dry_run {
            if self.changes_version() {
                reporter.info(&format!(
                    "would update version {} -> {} and commit",
                    self.current, self.target
                ));
            }
            reporter.info(&format!(
                "would tag {} and push to {remote}/{}",
                self.tag, self.branch
            ));
            return Ok(TaggedRelease {
                version: self.target,
                tag: self.tag,
            });
        }

        if self.changes_version() {
            reporter.step(&format!(
                "Updating version {} -> {}",
                self.current, self.target
            ));
            let touched =
                version_file::write_version(ctx.repo.root(), &ctx.manifest.version, &self.target)?;
            for path in &touched {
                reporter.detail(&path.display().to_string());
            }
            ctx.repo.add(&touched)?;
            ctx.repo
                .commit(&format!("release {name} {}", self.target))?;
        }

        reporter.step(&format!("Tagging {}", self.tag));
        ctx.repo
            .tag(&self.tag, &format!("release {name} {}", self.target))?;

        reporter.step(&format!("Pushing {} and tags to {remote}", self.branch));
        ctx.repo.push(remote, &self.branch)?;
        ctx.repo.push_tags(remote)?;

        Ok(TaggedRelease {
            version: self.target,
            tag: self.tag,
        })
    }
}

impl TaggedRelease {
    /// Build the source archive, run the configured build command, and
    /// collect everything into upload order.
    pub fn build(self, ctx: &Context, dry_run: bool) -> Result<BuiltRelease, ReleaseError> {
        if dry_run {
            ctx.reporter.info(&format!(
                "would build artifacts for {} into dist/",
                self.version
            ));
            return Ok(BuiltRelease {
                version: self.version,
                tag: self.tag,
                artifacts: Vec::new(),
            });
        }

        let artifacts = build_artifacts(ctx, &self.version)?;
        Ok(BuiltRelease {
            version: self.version,
            tag: self.tag,
            artifacts,
        })
    }
}

impl BuiltRelease {
    /// Upload every artifact to the named index, then check visibility.
    ///
    /// Takes `&self` so a release can publish to the test index and then
    /// to the production index from the same built state.
    pub async fn publish(
        &self,
        ctx: &Context,
        index: Option<&str>,
        skip_verify: bool,
        dry_run: bool,
    ) -> Result<PublishedRelease, ReleaseError> {
        let reporter = &ctx.reporter;

        if dry_run {
            let index = index.unwrap_or(&ctx.manifest.release.index).to_string();
            reporter.info(&format!(
                "would upload {} artifact(s) to index '{index}'",
                self.artifacts.len()
            ));
            return Ok(PublishedRelease {
                version: self.version.clone(),
                index,
                uploaded: 0,
                visible: None,
            });
        }

        let client = ctx.index_client(index)?;
        let index = client.index_name().to_string();

        for artifact in &self.artifacts {
            artifact.validate()?;
            reporter.step(&format!(
                "Uploading {} to '{index}'",
                artifact.file_name()
            ));
            client.upload(artifact).await?;
        }
        reporter.success(&format!(
            "uploaded {} artifact(s) to '{index}'",
            self.artifacts.len()
        ));

        let visible = if skip_verify {
            None
        } else {
            let name = &ctx.manifest.package.name;
            reporter.step(&format!("Verifying {name} {} on '{index}'", self.version));
            let visible = client.verify(name, &self.version).await?;
            if visible {
                reporter.success(&format!("{name} {} is visible on '{index}'", self.version));
            } else {
                reporter.warning(&format!(
                    "{name} {} is not visible on '{index}' yet",
                    self.version
                ));
            }
            Some(visible)
        };

        Ok(PublishedRelease {
            version: self.version.clone(),
            index,
            uploaded: self.artifacts.len(),
            visible,
        })
    }
}

/// Build all artifacts for `version`: the source archive, then the
/// external build command's outputs. Returns them sorted by file name.
pub fn build_artifacts(ctx: &Context, version: &Version) -> Result<Vec<Artifact>, ReleaseError> {
    let reporter = &ctx.reporter;
    let name = &ctx.manifest.package.name;
    let root = ctx.repo.root();

    reporter.step(&format!("Building source archive for {name} {version}"));
    let sdist = archive::build_sdist(&ctx.repo, name, version)?;
    reporter.detail(&sdist.file_name());

    let mut artifacts = vec![sdist];

    if let Some(command) = &ctx.manifest.build.command {
        reporter.step(&format!("Running build command: {command}"));
        builder::run_build_command(root, command)?;

        let built = builder::collect_built_artifacts(root, &ctx.manifest.build, name, version)?;
        for artifact in &built {
            reporter.detail(&artifact.file_name());
        }
        // The globs may legitimately cover dist/, where the sdist
        // already lives.
        let sdist_path = artifacts[0].path.clone();
        artifacts.extend(built.into_iter().filter(|a| a.path != sdist_path));
    }

    builder::write_checksums(&artifacts)?;
    artifacts.sort_by_key(Artifact::file_name);

    Ok(artifacts)
}

/// Re-discover artifacts built by an earlier `runway build`, for a
/// standalone `publish` run.
pub fn gather_existing_artifacts(
    ctx: &Context,
    version: &Version,
) -> Result<Vec<Artifact>, ReleaseError> {
    let name = &ctx.manifest.package.name;
    let root = ctx.repo.root();

    let sdist_path = runway_core::paths::dist_dir(root).join(format!("{name}-{version}.tar.gz"));
    if !sdist_path.is_file() {
        return Err(ReleaseError::context(
            "no artifacts to publish",
            format!(
                "{} not found; run 'runway build' first",
                sdist_path.display()
            ),
        ));
    }

    let sha256 = runway_core::digest::sha256_file(&sdist_path)
        .map_err(|e| ReleaseError::context("failed to digest artifact", e))?;
    let mut artifacts = vec![Artifact {
        name: name.clone(),
        version: version.clone(),
        kind: ArtifactKind::Sdist,
        path: sdist_path.clone(),
        sha256,
    }];

    if ctx.manifest.build.command.is_some() {
        let built = builder::collect_built_artifacts(root, &ctx.manifest.build, name, version)?;
        artifacts.extend(built.into_iter().filter(|a| a.path != sdist_path));
    }

    artifacts.sort_by_key(Artifact::file_name);
    Ok(artifacts)
}
