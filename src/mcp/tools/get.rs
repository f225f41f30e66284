//! `get_*` tools and the shared single-object projection.

use anyhow::{Context, Result};
use kube::core::DynamicObject;
use schemars::JsonSchema;
use serde::Deserialize;

use super::{require_name, Services};
use crate::cluster::ClusterError;
use crate::output::OutputFormat;
use crate::params::{self, Param};
use crate::tekton::{self, TektonKind};

/// Parameters for get_pipeline, get_task and get_stepaction.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetParams {
    #[schemars(description = "Name of the resource to get")]
    pub name: String,

    #[schemars(description = "Namespace of the resource (default: the server's default namespace)")]
    pub namespace: Option<String>,

    #[schemars(description = "Output format, json or yaml (default: yaml)")]
    pub output: Option<String>,
}

/// Parameters for get_pipelinerun and get_taskrun.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetRunParams {
    #[schemars(description = "Name of the run to get")]
    pub name: String,

    #[schemars(description = "Namespace of the run (default: the server's default namespace)")]
    pub namespace: Option<String>,

    #[schemars(description = "Output format, json or yaml (default: yaml)")]
    pub output: Option<String>,

    /// Overlay merged into `spec.params` of the returned copy.
    #[schemars(
        description = "Params to overlay on the returned run, e.g. key=value,list=array:a:b,map=object:k1=v1:k2=v2"
    )]
    pub params: Option<String>,
}

impl From<GetParams> for GetRunParams {
    fn from(p: GetParams) -> Self {
        Self {
            name: p.name,
            namespace: p.namespace,
            output: p.output,
            params: None,
        }
    }
}

/// Fetches one object and applies a param overlay when it is a run.
///
/// The overlay is merged into a copy; the object held by the cluster is
/// never modified.
pub async fn fetch(
    svc: &Services,
    kind: TektonKind,
    namespace: &str,
    name: &str,
    overlay: Vec<Param>,
) -> Result<DynamicObject, ClusterError> {
    let obj = svc.cluster.get(kind, namespace, name).await?;
    if overlay.is_empty() {
        return Ok(obj);
    }
    if !kind.is_run() {
        tracing::debug!(%kind, name, "Ignoring params overlay on a non-run resource");
        return Ok(obj);
    }
    Ok(tekton::with_param_overlay(&obj, overlay))
}

/// Implementation of the get_* tools.
pub async fn get(svc: &Services, kind: TektonKind, p: GetRunParams) -> Result<String> {
    require_name(kind, &p.name)?;
    let format = OutputFormat::from_arg(p.output.as_deref()).map_err(anyhow::Error::msg)?;
    let namespace = svc.namespace(p.namespace.as_deref());
    let overlay = params::decode(p.params.as_deref().unwrap_or_default())?;

    let obj = fetch(svc, kind, &namespace, &p.name, overlay)
        .await
        .with_context(|| format!("Error getting {kind} {namespace}/{}", p.name))?;

    format.render(&obj)
}
