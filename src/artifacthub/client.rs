//! HTTP client for the Artifact Hub API.
//!
//! Provides the `ArtifactHubClient` used by the install and search tools.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{
    ArtifactHubError, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, KIND_TEKTON_PIPELINE, KIND_TEKTON_TASK,
};

/// Artifact Hub API client.
#[derive(Debug, Clone)]
pub struct ArtifactHubClient {
    /// HTTP client instance.
    client: Client,
    /// Base URL of the API, without a trailing slash.
    base_url: String,
}

impl ArtifactHubClient {
    /// Creates a client for the public Artifact Hub.
    pub fn new() -> Result<Self, ArtifactHubError> {
        Self::with_url(DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client for a custom API URL.
    pub fn with_url(base_url: &str, timeout_secs: u64) -> Result<Self, ArtifactHubError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Searches packages.
    ///
    /// Only options that are set are sent as query parameters.
    pub async fn search_packages(
        &self,
        opts: &SearchOptions,
    ) -> Result<SearchResponse, ArtifactHubError> {
        let url = format!("{}/packages/search", self.base_url);
        tracing::debug!(url = %url, text = %opts.text, "Searching Artifact Hub");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&opts.query_pairs())
            .send()
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    /// Searches Tekton tasks by relevance.
    pub async fn search_tekton_tasks(
        &self,
        text: &str,
        limit: u32,
    ) -> Result<SearchResponse, ArtifactHubError> {
        self.search_packages(&SearchOptions::tekton(KIND_TEKTON_TASK, text, limit))
            .await
    }

    /// Searches Tekton pipelines by relevance.
    pub async fn search_tekton_pipelines(
        &self,
        text: &str,
        limit: u32,
    ) -> Result<SearchResponse, ArtifactHubError> {
        self.search_packages(&SearchOptions::tekton(KIND_TEKTON_PIPELINE, text, limit))
            .await
    }

    /// Fetches a package by id, optionally pinned to a version.
    pub async fn get_package(
        &self,
        package_id: &str,
        version: Option<&str>,
    ) -> Result<Package, ArtifactHubError> {
        let url = match version.filter(|v| !v.is_empty()) {
            Some(version) => format!("{}/packages/{package_id}/{version}", self.base_url),
            None => format!("{}/packages/{package_id}", self.base_url),
        };

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        Ok(check_status(response)?.json().await?)
    }

    /// Downloads the raw definition a package points at.
    pub async fn get_package_content(&self, content_url: &str) -> Result<String, ArtifactHubError> {
        if content_url.is_empty() {
            return Err(ArtifactHubError::EmptyContentUrl);
        }

        let response = self.client.get(content_url).send().await?;
        Ok(check_status(response)?.text().await?)
    }
}

fn check_status(response: Response) -> Result<Response, ArtifactHubError> {
    if response.status() != StatusCode::OK {
        return Err(ArtifactHubError::Status {
            status: response.status().as_u16(),
        });
    }
    Ok(response)
}

// ==================== Search ====================

/// Package search parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub text: String,
    pub kinds: Vec<String>,
    pub categories: Vec<String>,
    pub repositories: Vec<String>,
    pub deprecated: Option<bool>,
    pub operators: Option<bool>,
    pub verified_publisher: Option<bool>,
    pub official: Option<bool>,
    pub cncf: Option<bool>,
    pub sort: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl SearchOptions {
    fn tekton(kind: &str, text: &str, limit: u32) -> Self {
        Self {
            text: text.to_string(),
            kinds: vec![kind.to_string()],
            sort: Some("relevance".to_string()),
            limit,
            ..Default::default()
        }
    }

    /// Encodes the options as query pairs. Repeated filters repeat the key.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.text.is_empty() {
            pairs.push(("ts_query_web", self.text.clone()));
        }
        pairs.extend(self.kinds.iter().map(|k| ("kind", k.clone())));
        pairs.extend(self.categories.iter().map(|c| ("category", c.clone())));
        pairs.extend(self.repositories.iter().map(|r| ("repo", r.clone())));
        if let Some(deprecated) = self.deprecated {
            pairs.push(("deprecated", deprecated.to_string()));
        }
        // Negative flags are the API default and are never sent.
        for (key, flag) in [
            ("operators", self.operators),
            ("verified_publisher", self.verified_publisher),
            ("official", self.official),
            ("cncf", self.cncf),
        ] {
            if flag == Some(true) {
                pairs.push((key, "true".to_string()));
            }
        }
        if let Some(sort) = self.sort.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("sort", sort.clone()));
        }
        if self.limit > 0 {
            pairs.push(("limit", self.limit.to_string()));
        }
        if self.offset > 0 {
            pairs.push(("offset", self.offset.to_string()));
        }
        pairs
    }
}

// ==================== API Types ====================

/// Response of `/packages/search`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub packages: Vec<Package>,
}

/// A package as returned by the search and package endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Package {
    pub package_id: String,
    pub name: String,
    pub normalized_name: String,
    pub display_name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub home_url: Option<String>,
    pub version: String,
    pub available_versions: Vec<Version>,
    pub deprecated: bool,
    pub license: Option<String>,
    pub signed: bool,
    /// Where the raw definition can be downloaded.
    pub content_url: Option<String>,
    pub repository: Repository,
}

impl Package {
    /// The human-facing name, falling back to the package name.
    pub fn title(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// A published version of a package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Version {
    pub version: String,
    /// Publication time as a Unix timestamp.
    pub ts: Option<i64>,
    pub prerelease: bool,
}

/// The repository a package belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
    pub repository_id: String,
    pub name: String,
    pub display_name: Option<String>,
    pub url: String,
    pub kind: i64,
    pub organization_name: Option<String>,
    pub organization_display_name: Option<String>,
}
