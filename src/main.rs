use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "tekton-mcp-server")]
#[command(version)]
#[command(about = "MCP server exposing Tekton pipelines, tasks and runs to AI agents")]
#[command(long_about = "Serves the Tekton objects of a Kubernetes cluster over the Model\n\
    Context Protocol. AI agents can inspect, create, start and clean up\n\
    Pipelines, Tasks and their runs, read run logs, and install community\n\
    tasks and pipelines from Artifact Hub.")]
#[command(after_help = "EXAMPLES:\n    \
    tekton-mcp-server serve                       Serve on stdio\n    \
    tekton-mcp-server serve --transport http --address 127.0.0.1:3000\n    \
    tekton-mcp-server completions zsh             Print zsh completions\n\n\
    For more information about a command, run 'tekton-mcp-server <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server
    #[command(long_about = "Starts the MCP server on stdio (the default) or streamable HTTP.\n\
        On stdio, JSON-RPC requests are read from stdin and responses written\n\
        to stdout; logs always go to stderr. On HTTP the endpoint is /mcp.")]
    Serve(commands::serve::Args),

    /// Generate shell completion scripts
    Completions(commands::completions::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so buffered file logs are flushed.
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args),
        Commands::Completions(args) => {
            commands::completions::generate_completions(&mut Cli::command(), args.shell);
            Ok(())
        }
    }
}

/// Sets up stderr logging plus an optional log file.
///
/// stdout is reserved for the stdio transport.
fn init_logging(
    verbose: bool,
    log_file: Option<&std::path::Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = if verbose {
        "tekton_mcp=debug,tekton_mcp_server=debug"
    } else {
        "tekton_mcp=info,tekton_mcp_server=info"
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}
