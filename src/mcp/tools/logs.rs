//! Log retrieval for TaskRuns and PipelineRuns.

use std::fmt::Write;

use anyhow::{bail, Context, Result};
use kube::core::DynamicObject;
use schemars::JsonSchema;
use serde::Deserialize;

use super::{require_name, Services};
use crate::tekton::{self, TektonKind, PIPELINE_RUN_LABEL};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LogsParams {
    #[schemars(description = "Name of the run")]
    pub name: String,

    #[schemars(description = "Namespace of the run (default: the server's default namespace)")]
    pub namespace: Option<String>,
}

fn pod_name(task_run: &DynamicObject) -> Option<&str> {
    task_run
        .data
        .get("status")
        .and_then(|s| s.get("podName"))
        .and_then(|p| p.as_str())
        .filter(|p| !p.is_empty())
}

async fn pod_logs(svc: &Services, namespace: &str, pod: &str, out: &mut String) -> Result<()> {
    let logs = svc
        .cluster
        .pod_logs(namespace, pod)
        .await
        .with_context(|| format!("failed to get logs for Pod {pod}"))?;

    for log in logs {
        let _ = write!(out, "\n>>> Pod {pod} Container {}\n", log.container);
        out.push_str(&log.text);
    }
    Ok(())
}

/// Implementation of get_taskrun_logs.
pub async fn taskrun_logs(svc: &Services, p: LogsParams) -> Result<String> {
    require_name(TektonKind::TaskRun, &p.name)?;
    let namespace = svc.namespace(p.namespace.as_deref());

    let task_run = svc
        .cluster
        .get(TektonKind::TaskRun, &namespace, &p.name)
        .await
        .with_context(|| format!("failed to get TaskRun {namespace}/{}", p.name))?;

    let Some(pod) = pod_name(&task_run) else {
        bail!("podName not set for TaskRun {namespace}/{}", p.name);
    };

    let mut out = String::new();
    pod_logs(svc, &namespace, pod, &mut out)
        .await
        .with_context(|| format!("failed to get logs for TaskRun {namespace}/{}", p.name))?;
    Ok(out)
}

/// Implementation of get_pipelinerun_logs.
///
/// Collects the logs of every TaskRun Tekton created for the PipelineRun.
/// TaskRuns that have no pod yet are skipped.
pub async fn pipelinerun_logs(svc: &Services, p: LogsParams) -> Result<String> {
    require_name(TektonKind::PipelineRun, &p.name)?;
    let namespace = svc.namespace(p.namespace.as_deref());

    svc.cluster
        .get(TektonKind::PipelineRun, &namespace, &p.name)
        .await
        .with_context(|| format!("failed to get PipelineRun {namespace}/{}", p.name))?;

    let selector = format!("{PIPELINE_RUN_LABEL}={}", p.name);
    let task_runs = svc
        .cluster
        .list(TektonKind::TaskRun, Some(&namespace), Some(&selector))
        .await
        .with_context(|| format!("failed to list TaskRuns for PipelineRun {namespace}/{}", p.name))?;

    let mut out = String::new();
    for task_run in &task_runs {
        let Some(pod) = pod_name(task_run) else {
            tracing::debug!(task_run = tekton::name_of(task_run), "TaskRun has no pod yet");
            continue;
        };
        pod_logs(svc, &namespace, pod, &mut out).await.with_context(|| {
            format!("failed to get logs for TaskRun {namespace}/{}", tekton::name_of(task_run))
        })?;
    }

    if out.is_empty() {
        return Ok(format!("No logs available yet for PipelineRun {namespace}/{}", p.name));
    }
    Ok(out)
}
