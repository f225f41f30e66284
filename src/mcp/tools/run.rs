//! `start_*` and `restart_*` tools.

use anyhow::{Context, Result};
use schemars::JsonSchema;
use serde::Deserialize;

use super::{require_name, Services};
use crate::params;
use crate::tekton::{self, TektonKind};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StartParams {
    #[schemars(description = "Name or reference of the Pipeline or Task to start")]
    pub name: String,

    #[schemars(description = "Namespace of the Pipeline or Task (default: the server's default namespace)")]
    pub namespace: Option<String>,

    #[schemars(
        description = "Params for the run, comma separated: key=value, key=array:a:b:c, key=object:k1=v1:k2=v2"
    )]
    pub params: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RestartParams {
    #[schemars(description = "Name of the run to restart")]
    pub name: String,

    #[schemars(description = "Namespace of the run (default: the server's default namespace)")]
    pub namespace: Option<String>,
}

/// Implementation of start_pipeline and start_task.
///
/// `kind` is the Pipeline or Task being started.
pub async fn start(svc: &Services, kind: TektonKind, p: StartParams) -> Result<String> {
    require_name(kind, &p.name)?;
    let namespace = svc.namespace(p.namespace.as_deref());
    let params = params::decode(p.params.as_deref().unwrap_or_default())?;

    svc.cluster
        .get(kind, &namespace, &p.name)
        .await
        .with_context(|| format!("failed to get {kind} {namespace}/{}", p.name))?;

    let run = tekton::new_run(kind, &p.name, &namespace, format!("{}-", p.name), &params)
        .map_err(anyhow::Error::msg)?;
    let run_kind = run_kind_of(kind);
    let created = svc
        .cluster
        .create(run_kind, &namespace, &run)
        .await
        .with_context(|| format!("failed to create {run_kind} {namespace}/{}", p.name))?;

    tracing::info!(%kind, name = %p.name, run = tekton::name_of(&created), "Started run");
    Ok(format!(
        "Starting {} {} in namespace {namespace} as {run_kind} {}",
        kind.selector(),
        p.name,
        tekton::name_of(&created)
    ))
}

/// Implementation of restart_pipelinerun and restart_taskrun.
pub async fn restart(svc: &Services, kind: TektonKind, p: RestartParams) -> Result<String> {
    require_name(kind, &p.name)?;
    let namespace = svc.namespace(p.namespace.as_deref());

    let original = svc
        .cluster
        .get(kind, &namespace, &p.name)
        .await
        .with_context(|| format!("failed to get {kind} {namespace}/{}", p.name))?;

    let run = tekton::restart_run(kind, &original, &namespace);
    let created = svc
        .cluster
        .create(kind, &namespace, &run)
        .await
        .with_context(|| format!("failed to create {kind} in namespace {namespace}"))?;

    Ok(format!(
        "Restarting {} {} as {} in namespace {namespace}",
        kind.selector(),
        p.name,
        tekton::name_of(&created)
    ))
}

fn run_kind_of(kind: TektonKind) -> TektonKind {
    match kind {
        TektonKind::Task => TektonKind::TaskRun,
        _ => TektonKind::PipelineRun,
    }
}
