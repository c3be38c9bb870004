//! Shell completion generation

use clap::CommandFactory;

/// Generate shell completions on stdout
pub fn completions(shell: clap_complete::Shell) {
    let mut cmd = crate::Cli::command();
    clap_complete::generate(shell, &mut cmd, "runway", &mut std::io::stdout());
}
