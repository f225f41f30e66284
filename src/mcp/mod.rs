//! MCP (Model Context Protocol) server for Tekton.
//!
//! Exposes the Tekton objects of a Kubernetes cluster to AI agents. The
//! server runs on stdio or streamable HTTP and implements these tools:
//! - `get_*`: fetch one Pipeline, Task, StepAction, PipelineRun or TaskRun
//! - `list_*`: list objects of a kind with label and name-prefix filters
//! - `create_*`, `update_*`, `patch_*`: manage Pipelines and Tasks
//! - `delete_*`, `delete_all_pipelineruns`: remove objects
//! - `start_*`, `restart_*`: create runs
//! - `get_taskrun_logs`, `get_pipelinerun_logs`: read step container logs
//! - `*_artifacthub_*`: search, install and trigger Artifact Hub packages
//!
//! Every kind is also readable as a `tekton://{kind}/{namespace}/{name}`
//! resource.

pub mod resources;
mod server;
pub mod tools;

pub use server::{run_server, TektonServer};
pub use tools::Services;
