//! Command-line interface for the Tekton MCP server.

/// Individual CLI command implementations.
pub mod commands;
