//! Access to Tekton objects and pod logs in a Kubernetes cluster.
//!
//! Tool handlers receive an `Arc<dyn Cluster>` when the server is built, so
//! the production [`KubeCluster`] can be swapped for an in-memory cluster in
//! tests.
//!
//! # Submodules
//!
//! - `kubernetes` - kube-rs backed implementation used by the server binary

pub mod kubernetes;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use kube::core::DynamicObject;
use serde_json::Value;

use crate::tekton::TektonKind;

pub use kubernetes::KubeCluster;

/// The log output of one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerLog {
    pub container: String,
    pub text: String,
}

/// Errors returned by [`Cluster`] implementations.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// The requested object does not exist.
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    /// The Kubernetes API rejected the request or could not be reached.
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// The request was rejected before it reached the API server.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClusterError {
    pub(crate) fn not_found(kind: impl Into<String>, namespace: &str, name: &str) -> Self {
        ClusterError::NotFound {
            kind: kind.into(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

/// Read and write access to Tekton resources.
///
/// `namespace: None` in [`Cluster::list`] means every namespace. Label and
/// field selectors use standard Kubernetes syntax and are evaluated by the
/// implementation.
#[async_trait]
pub trait Cluster: Send + Sync {
    /// Fetches a single object.
    async fn get(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
    ) -> Result<DynamicObject, ClusterError>;

    /// Lists objects matching an optional label selector.
    async fn list(
        &self,
        kind: TektonKind,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<DynamicObject>, ClusterError>;

    /// Creates an object and returns it as stored (with its generated name).
    async fn create(
        &self,
        kind: TektonKind,
        namespace: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, ClusterError>;

    /// Replaces an existing object.
    async fn replace(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, ClusterError>;

    /// Applies an RFC 6902 JSON patch.
    async fn json_patch(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> Result<DynamicObject, ClusterError>;

    /// Deletes a single object.
    async fn delete(&self, kind: TektonKind, namespace: &str, name: &str)
        -> Result<(), ClusterError>;

    /// Deletes every object in `namespace` matching the selectors.
    async fn delete_collection(
        &self,
        kind: TektonKind,
        namespace: &str,
        label_selector: Option<&str>,
        field_selector: Option<&str>,
    ) -> Result<(), ClusterError>;

    /// Reads the logs of every container declared in a pod's spec, in order.
    async fn pod_logs(&self, namespace: &str, pod: &str) -> Result<Vec<ContainerLog>, ClusterError>;
}
