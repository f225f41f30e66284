//! CLI commands for the Tekton MCP server.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// Shell completion scripts.
pub mod completions;

/// Run the MCP server.
pub mod serve;
