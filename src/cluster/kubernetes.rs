//! kube-rs backed [`Cluster`] implementation.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, DeleteParams, ListParams, LogParams, Patch, PatchParams, PostParams};
use kube::core::DynamicObject;
use kube::Client;
use serde_json::Value;

use super::{Cluster, ClusterError, ContainerLog};
use crate::tekton::TektonKind;

/// Cluster access through the Kubernetes API server.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
}

impl KubeCluster {
    /// Wraps an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connects using the local kubeconfig, or the in-cluster service account.
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default().await?;
        Ok(Self::new(client))
    }

    fn namespaced(&self, kind: TektonKind, namespace: &str) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, &kind.api_resource())
    }
}

/// Turns a 404 from the API server into [`ClusterError::NotFound`].
fn classify(err: kube::Error, kind: &str, namespace: &str, name: &str) -> ClusterError {
    match err {
        kube::Error::Api(ref response) if response.code == 404 => {
            ClusterError::not_found(kind, namespace, name)
        }
        other => ClusterError::Api(other),
    }
}

fn patch_operations(patch: &Value) -> Result<json_patch::Patch, ClusterError> {
    serde_json::from_value(patch.clone())
        .map_err(|e| ClusterError::InvalidRequest(format!("malformed JSON patch: {e}")))
}

#[async_trait]
impl Cluster for KubeCluster {
    async fn get(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
    ) -> Result<DynamicObject, ClusterError> {
        self.namespaced(kind, namespace)
            .get(name)
            .await
            .map_err(|e| classify(e, kind.kind(), namespace, name))
    }

    async fn list(
        &self,
        kind: TektonKind,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<DynamicObject>, ClusterError> {
        let api = match namespace {
            Some(ns) => self.namespaced(kind, ns),
            None => Api::all_with(self.client.clone(), &kind.api_resource()),
        };

        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }

        let list = api.list(&params).await?;
        Ok(list.items)
    }

    async fn create(
        &self,
        kind: TektonKind,
        namespace: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, ClusterError> {
        let created = self
            .namespaced(kind, namespace)
            .create(&PostParams::default(), obj)
            .await?;
        Ok(created)
    }

    async fn replace(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, ClusterError> {
        self.namespaced(kind, namespace)
            .replace(name, &PostParams::default(), obj)
            .await
            .map_err(|e| classify(e, kind.kind(), namespace, name))
    }

    async fn json_patch(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> Result<DynamicObject, ClusterError> {
        let patch = patch_operations(patch)?;
        self.namespaced(kind, namespace)
            .patch(name, &PatchParams::default(), &Patch::Json::<()>(patch))
            .await
            .map_err(|e| classify(e, kind.kind(), namespace, name))
    }

    async fn delete(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError> {
        self.namespaced(kind, namespace)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(|e| classify(e, kind.kind(), namespace, name))?;
        Ok(())
    }

    async fn delete_collection(
        &self,
        kind: TektonKind,
        namespace: &str,
        label_selector: Option<&str>,
        field_selector: Option<&str>,
    ) -> Result<(), ClusterError> {
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }
        if let Some(selector) = field_selector {
            params = params.fields(selector);
        }

        self.namespaced(kind, namespace)
            .delete_collection(&DeleteParams::default(), &params)
            .await?;
        Ok(())
    }

    async fn pod_logs(&self, namespace: &str, pod: &str) -> Result<Vec<ContainerLog>, ClusterError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let spec = pods
            .get(pod)
            .await
            .map_err(|e| classify(e, "Pod", namespace, pod))?
            .spec
            .unwrap_or_default();

        let mut logs = Vec::with_capacity(spec.containers.len());
        for container in spec.containers {
            let params = LogParams {
                container: Some(container.name.clone()),
                follow: false,
                ..Default::default()
            };
            let text = pods
                .logs(pod, &params)
                .await
                .map_err(|e| classify(e, "Pod", namespace, pod))?;
            logs.push(ContainerLog {
                container: container.name,
                text,
            });
        }
        Ok(logs)
    }
}
