//! runway - release runbook automation
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Runway turns a manual release checklist into commands: bump the
//! version everywhere it is recorded, commit and tag, build the
//! distribution artifacts, upload them to a test index, verify, then
//! upload to the production index.
//!
//! # Architecture
//!
//! - **Typestate pipeline**: a release moves through `PendingRelease` →
//!   `TaggedRelease` → `BuiltRelease` → `PublishedRelease`, so a stage
//!   cannot run before the one it depends on.
//! - **Newtypes**: `ProjectName`, `Version` and `Sha256Digest` keep the
//!   vocabulary type-safe end to end.
//! - **Two config files**: `runway.toml` in the repository describes the
//!   project; `credentials.toml` in the user config directory describes
//!   the indexes and who uploads to them.

pub mod cmd;
pub mod ops;
pub mod ui;

pub use ops::ReleaseError;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "runway")]
#[command(author, version, about = "runway - release runbook automation")]
pub struct Cli {
    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create runway.toml and a credentials file skeleton
    Init {
        /// Overwrite an existing runway.toml
        #[arg(long)]
        force: bool,
    },
    /// Run the preflight checks without releasing anything
    Status,
    /// Inspect or change the recorded version
    Version {
        #[command(subcommand)]
        command: VersionCommands,
    },
    /// Commit the version change, tag it, and push
    Prepare {
        /// Bump the version first: major, minor or patch
        #[arg(long, conflicts_with = "set")]
        bump: Option<String>,
        /// Set an explicit version first
        #[arg(long, conflicts_with = "bump")]
        set: Option<String>,
    },
    /// Build the source archive and run the configured build command
    Build,
    /// Upload the built artifacts to an index, then verify
    Publish {
        /// Index name from the credentials file (default: release.index)
        #[arg(long)]
        index: Option<String>,
        /// Skip the post-upload visibility check
        #[arg(long)]
        skip_verify: bool,
    },
    /// Check whether the current version is visible on an index
    Verify {
        /// Index name from the credentials file (default: release.index)
        #[arg(long)]
        index: Option<String>,
    },
    /// Run the whole checklist: prepare, build, publish, verify
    Release {
        /// Bump the version first: major, minor or patch
        #[arg(long, conflicts_with = "set")]
        bump: Option<String>,
        /// Set an explicit version first
        #[arg(long, conflicts_with = "bump")]
        set: Option<String>,
        /// Also publish to the production index after the test index
        #[arg(long)]
        production: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum VersionCommands {
    /// Print the version currently recorded in the version file
    Show,
    /// Bump the version: major, minor or patch
    Bump {
        /// Which component to bump
        level: String,
    },
    /// Set an explicit version
    Set {
        /// The new version
        version: String,
    },
}
