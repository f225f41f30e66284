//! Tekton MCP - Tekton pipelines for AI agents
//!
//! Serves the Tekton objects of a Kubernetes cluster over the Model Context
//! Protocol, and installs community tasks and pipelines from Artifact Hub.

pub mod artifacthub;
pub mod cluster;
pub mod config;
pub mod mcp;
pub mod output;
pub mod params;
pub mod tekton;
