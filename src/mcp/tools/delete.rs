//! `delete_*` tools.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::Deserialize;

use super::{require_name, Services};
use crate::tekton::TektonKind;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteParams {
    #[schemars(description = "Name of the resource to delete")]
    pub name: String,

    #[schemars(description = "Namespace of the resource (default: the server's default namespace)")]
    pub namespace: Option<String>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAllParams {
    #[schemars(description = "Namespace to delete PipelineRuns from (default: the server's default namespace)")]
    pub namespace: Option<String>,

    #[schemars(description = "Label selector to filter PipelineRuns to delete")]
    pub label_selector: Option<String>,

    #[schemars(description = "Field selector to filter PipelineRuns to delete")]
    pub field_selector: Option<String>,
}

/// Implementation of the single-object delete tools.
pub async fn delete(svc: &Services, kind: TektonKind, p: DeleteParams) -> Result<String> {
    require_name(kind, &p.name)?;
    let namespace = svc.namespace(p.namespace.as_deref());

    svc.cluster
        .delete(kind, &namespace, &p.name)
        .await
        .with_context(|| format!("Error deleting {kind} {namespace}/{}", p.name))?;

    Ok(format!(
        "{kind} '{}' deleted successfully from namespace '{namespace}'",
        p.name
    ))
}

/// Implementation of delete_all_pipelineruns.
pub async fn delete_all_pipeline_runs(svc: &Services, p: DeleteAllParams) -> Result<String> {
    let namespace = svc.namespace(p.namespace.as_deref());
    let labels = p.label_selector.as_deref().filter(|s| !s.is_empty());
    let fields = p.field_selector.as_deref().filter(|s| !s.is_empty());

    tracing::info!(namespace = %namespace, labels, fields, "Deleting PipelineRuns");
    svc.cluster
        .delete_collection(TektonKind::PipelineRun, &namespace, labels, fields)
        .await
        .with_context(|| format!("Error deleting PipelineRuns in namespace {namespace}"))?;

    Ok(format!(
        "PipelineRuns deleted successfully from namespace '{namespace}' with selectors"
    ))
}
