//! Artifact Hub integration.
//!
//! Searches the Artifact Hub catalogue for community Tekton tasks and
//! pipelines and downloads their definitions for installation.
//!
//! # Submodules
//!
//! - `client` - async HTTP client for the Artifact Hub REST API

pub mod client;

pub use client::{ArtifactHubClient, Package, Repository, SearchOptions, SearchResponse, Version};

/// Default Artifact Hub API endpoint.
pub const DEFAULT_API_URL: &str = "https://artifacthub.io/api/v1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Artifact Hub repository kind for Tekton tasks.
pub const KIND_TEKTON_TASK: &str = "7";

/// Artifact Hub repository kind for Tekton pipelines.
pub const KIND_TEKTON_PIPELINE: &str = "11";

/// Errors returned by the Artifact Hub client.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactHubError {
    /// Transport failure or undecodable response body.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-200 status.
    #[error("API request failed with status {status}")]
    Status { status: u16 },

    /// A package carried no content URL.
    #[error("content URL is empty")]
    EmptyContentUrl,
}
