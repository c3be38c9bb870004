//! runway - release runbook automation CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use runway_cli::cmd;
use runway_cli::{Cli, Commands, VersionCommands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let dry_run = cli.dry_run;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Init { force } => cmd::init::init(force, quiet),
        Commands::Status => cmd::status::status(quiet),
        Commands::Version { command } => match command {
            VersionCommands::Show => cmd::version::show(quiet),
            VersionCommands::Bump { level } => cmd::version::bump(&level, dry_run, quiet),
            VersionCommands::Set { version } => cmd::version::set(&version, dry_run, quiet),
        },
        Commands::Prepare { bump, set } => {
            cmd::prepare::prepare(bump.as_deref(), set.as_deref(), dry_run, quiet)
        }
        Commands::Build => cmd::build::build(dry_run, quiet),
        Commands::Publish { index, skip_verify } => {
            cmd::publish::publish(index.as_deref(), skip_verify, dry_run, quiet).await
        }
        Commands::Verify { index } => cmd::verify::verify(index.as_deref(), quiet).await,
        Commands::Release {
            bump,
            set,
            production,
            yes,
        } => {
            cmd::release::release(
                bump.as_deref(),
                set.as_deref(),
                production,
                yes,
                dry_run,
                quiet,
            )
            .await
        }
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
