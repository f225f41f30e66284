//! In-memory [`Cluster`] used by unit tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use kube::core::{DynamicObject, ObjectMeta};
use serde_json::Value;

use super::{Cluster, ClusterError, ContainerLog};
use crate::tekton::TektonKind;

/// Builds a stored Tekton object.
pub(crate) fn tekton_object(kind: TektonKind, namespace: &str, name: &str, data: Value) -> DynamicObject {
    DynamicObject {
        types: Some(kind.type_meta()),
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data,
    }
}

#[derive(Default)]
struct State {
    objects: Vec<(TektonKind, DynamicObject)>,
    logs: HashMap<(String, String), Vec<ContainerLog>>,
    patches: Vec<(TektonKind, String, String, Value)>,
    generated: u32,
    /// Error message returned by every write.
    write_failure: Option<String>,
}

#[derive(Default)]
pub(crate) struct MemoryCluster {
    state: Mutex<State>,
}

impl MemoryCluster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(self, kind: TektonKind, obj: DynamicObject) -> Self {
        self.state.lock().unwrap().objects.push((kind, obj));
        self
    }

    pub(crate) fn with_logs(self, namespace: &str, pod: &str, logs: &[(&str, &str)]) -> Self {
        let logs = logs
            .iter()
            .map(|(container, text)| ContainerLog {
                container: container.to_string(),
                text: text.to_string(),
            })
            .collect();
        self.state
            .lock()
            .unwrap()
            .logs
            .insert((namespace.to_string(), pod.to_string()), logs);
        self
    }

    /// Makes every write fail with a non-NotFound error.
    pub(crate) fn failing_writes(self, message: &str) -> Self {
        self.state.lock().unwrap().write_failure = Some(message.to_string());
        self
    }

    fn check_write(&self) -> Result<(), ClusterError> {
        match &self.state.lock().unwrap().write_failure {
            Some(message) => Err(ClusterError::InvalidRequest(message.clone())),
            None => Ok(()),
        }
    }

    pub(crate) fn objects(&self, kind: TektonKind) -> Vec<DynamicObject> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, o)| o.clone())
            .collect()
    }

    pub(crate) fn patches(&self) -> Vec<(TektonKind, String, String, Value)> {
        self.state.lock().unwrap().patches.clone()
    }
}

fn matches(obj: &DynamicObject, kind: TektonKind, k: TektonKind, namespace: Option<&str>) -> bool {
    k == kind && namespace.is_none_or(|ns| obj.metadata.namespace.as_deref() == Some(ns))
}

fn matches_labels(obj: &DynamicObject, selector: Option<&str>) -> bool {
    let Some(selector) = selector.filter(|s| !s.is_empty()) else {
        return true;
    };
    let empty = BTreeMap::new();
    let labels = obj.metadata.labels.as_ref().unwrap_or(&empty);
    selector.split(',').all(|term| match term.split_once('=') {
        Some((k, v)) => labels.get(k.trim()).map(String::as_str) == Some(v.trim()),
        None => labels.contains_key(term.trim()),
    })
}

#[async_trait]
impl Cluster for MemoryCluster {
    async fn get(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
    ) -> Result<DynamicObject, ClusterError> {
        self.state
            .lock()
            .unwrap()
            .objects
            .iter()
            .find(|(k, o)| matches(o, kind, *k, Some(namespace)) && o.metadata.name.as_deref() == Some(name))
            .map(|(_, o)| o.clone())
            .ok_or_else(|| ClusterError::not_found(kind.kind(), namespace, name))
    }

    async fn list(
        &self,
        kind: TektonKind,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<DynamicObject>, ClusterError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|(k, o)| matches(o, kind, *k, namespace) && matches_labels(o, label_selector))
            .map(|(_, o)| o.clone())
            .collect())
    }

    async fn create(
        &self,
        kind: TektonKind,
        namespace: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, ClusterError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let mut created = obj.clone();
        if created.metadata.name.is_none() {
            state.generated += 1;
            let prefix = created.metadata.generate_name.clone().unwrap_or_default();
            created.metadata.name = Some(format!("{prefix}{:05}", state.generated));
        }
        created.metadata.namespace = Some(namespace.to_string());
        created.metadata.resource_version = Some("1".to_string());

        let exists = state.objects.iter().any(|(k, o)| {
            matches(o, kind, *k, Some(namespace)) && o.metadata.name == created.metadata.name
        });
        if exists {
            return Err(ClusterError::InvalidRequest(format!(
                "{kind} {namespace}/{} already exists",
                created.metadata.name.as_deref().unwrap_or_default()
            )));
        }

        state.objects.push((kind, created.clone()));
        Ok(created)
    }

    async fn replace(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
        obj: &DynamicObject,
    ) -> Result<DynamicObject, ClusterError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let slot = state
            .objects
            .iter_mut()
            .find(|(k, o)| matches(o, kind, *k, Some(namespace)) && o.metadata.name.as_deref() == Some(name))
            .ok_or_else(|| ClusterError::not_found(kind.kind(), namespace, name))?;
        slot.1 = obj.clone();
        Ok(obj.clone())
    }

    async fn json_patch(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
        patch: &Value,
    ) -> Result<DynamicObject, ClusterError> {
        self.check_write()?;
        let current = self.get(kind, namespace, name).await?;
        self.state.lock().unwrap().patches.push((
            kind,
            namespace.to_string(),
            name.to_string(),
            patch.clone(),
        ));
        Ok(current)
    }

    async fn delete(
        &self,
        kind: TektonKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), ClusterError> {
        self.check_write()?;
        let mut state = self.state.lock().unwrap();
        let before = state.objects.len();
        state.objects.retain(|(k, o)| {
            !(matches(o, kind, *k, Some(namespace)) && o.metadata.name.as_deref() == Some(name))
        });
        if state.objects.len() == before {
            return Err(ClusterError::not_found(kind.kind(), namespace, name));
        }
        Ok(())
    }

    async fn delete_collection(
        &self,
        kind: TektonKind,
        namespace: &str,
        label_selector: Option<&str>,
        _field_selector: Option<&str>,
    ) -> Result<(), ClusterError> {
        self.check_write()?;
        self.state.lock().unwrap().objects.retain(|(k, o)| {
            !(matches(o, kind, *k, Some(namespace)) && matches_labels(o, label_selector))
        });
        Ok(())
    }

    async fn pod_logs(&self, namespace: &str, pod: &str) -> Result<Vec<ContainerLog>, ClusterError> {
        self.state
            .lock()
            .unwrap()
            .logs
            .get(&(namespace.to_string(), pod.to_string()))
            .cloned()
            .ok_or_else(|| ClusterError::not_found("Pod", namespace, pod))
    }
}
