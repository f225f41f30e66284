//! Completions command - generate shell completion scripts.

use clap::Command;
use clap_complete::{generate, Shell};
use std::io;

/// Arguments for the completions command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    tekton-mcp-server completions bash > ~/.local/share/bash-completion/completions/tekton-mcp-server\n    \
    tekton-mcp-server completions zsh > ~/.zfunc/_tekton-mcp-server\n    \
    tekton-mcp-server completions fish > ~/.config/fish/completions/tekton-mcp-server.fish")]
pub struct Args {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Writes the completion script for `cmd` to stdout.
///
/// Called from main.rs, which owns the `Cli` definition.
pub fn generate_completions(cmd: &mut Command, shell: Shell) {
    generate(shell, cmd, "tekton-mcp-server", &mut io::stdout());
}
