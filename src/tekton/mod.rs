//! Tekton resource kinds and the objects this server builds from them.
//!
//! Objects travel as [`DynamicObject`]s so that every field the cluster
//! returns survives projection untouched. The only parts interpreted here are
//! run references, `spec.params` and `spec.status`.

use std::fmt;
use std::str::FromStr;

use kube::core::{ApiResource, DynamicObject, GroupVersionKind, ObjectMeta, TypeMeta};
use serde::Serialize;
use serde_json::{json, Value};

use crate::params::{self, Param};

/// API group of every Tekton resource.
pub const TEKTON_GROUP: &str = "tekton.dev";

/// Label Tekton puts on TaskRuns created for a PipelineRun.
pub const PIPELINE_RUN_LABEL: &str = "tekton.dev/pipelineRun";

/// The Tekton resource kinds exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TektonKind {
    Pipeline,
    PipelineRun,
    Task,
    TaskRun,
    StepAction,
}

impl TektonKind {
    /// All kinds, in the order tools and resource templates are listed.
    pub const ALL: [TektonKind; 5] = [
        TektonKind::Pipeline,
        TektonKind::PipelineRun,
        TektonKind::Task,
        TektonKind::TaskRun,
        TektonKind::StepAction,
    ];

    /// The Kubernetes `kind` field value.
    pub fn kind(self) -> &'static str {
        match self {
            TektonKind::Pipeline => "Pipeline",
            TektonKind::PipelineRun => "PipelineRun",
            TektonKind::Task => "Task",
            TektonKind::TaskRun => "TaskRun",
            TektonKind::StepAction => "StepAction",
        }
    }

    /// The lowercase selector used in tool names and resource URIs.
    pub fn selector(self) -> &'static str {
        match self {
            TektonKind::Pipeline => "pipeline",
            TektonKind::PipelineRun => "pipelinerun",
            TektonKind::Task => "task",
            TektonKind::TaskRun => "taskrun",
            TektonKind::StepAction => "stepaction",
        }
    }

    /// The served API version.
    pub fn version(self) -> &'static str {
        match self {
            TektonKind::StepAction => "v1beta1",
            _ => "v1",
        }
    }

    /// The REST plural.
    pub fn plural(self) -> &'static str {
        match self {
            TektonKind::Pipeline => "pipelines",
            TektonKind::PipelineRun => "pipelineruns",
            TektonKind::Task => "tasks",
            TektonKind::TaskRun => "taskruns",
            TektonKind::StepAction => "stepactions",
        }
    }

    /// `group/version` as written in `apiVersion`.
    pub fn api_version(self) -> String {
        format!("{TEKTON_GROUP}/{}", self.version())
    }

    /// Whether objects of this kind carry a `spec.params` list of values.
    pub fn is_run(self) -> bool {
        matches!(self, TektonKind::PipelineRun | TektonKind::TaskRun)
    }

    /// The kube-rs resource descriptor for this kind.
    pub fn api_resource(self) -> ApiResource {
        let gvk = GroupVersionKind::gvk(TEKTON_GROUP, self.version(), self.kind());
        ApiResource::from_gvk_with_plural(&gvk, self.plural())
    }

    /// `apiVersion` and `kind` for objects of this kind.
    pub fn type_meta(self) -> TypeMeta {
        TypeMeta {
            api_version: self.api_version(),
            kind: self.kind().to_string(),
        }
    }
}

impl fmt::Display for TektonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

impl FromStr for TektonKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pipeline" => Ok(TektonKind::Pipeline),
            "pipelinerun" => Ok(TektonKind::PipelineRun),
            "task" => Ok(TektonKind::Task),
            "taskrun" => Ok(TektonKind::TaskRun),
            "stepaction" => Ok(TektonKind::StepAction),
            other => Err(format!(
                "Unknown resource kind: '{other}'. Expected one of: pipeline, pipelinerun, task, taskrun, stepaction"
            )),
        }
    }
}

/// Returns the object's name, or an empty string for unnamed objects.
pub fn name_of(obj: &DynamicObject) -> &str {
    obj.metadata.name.as_deref().unwrap_or_default()
}

/// Reads `spec.params` from a run.
///
/// Missing or unreadable params yield an empty list.
pub fn run_params(obj: &DynamicObject) -> Vec<Param> {
    obj.data
        .get("spec")
        .and_then(|spec| spec.get("params"))
        .and_then(|p| serde_json::from_value(p.clone()).ok())
        .unwrap_or_default()
}

/// Returns a copy of `obj` whose `spec.params` are merged with `overlay`.
///
/// The source object is left untouched.
pub fn with_param_overlay(obj: &DynamicObject, overlay: Vec<Param>) -> DynamicObject {
    let mut copy = obj.clone();
    if overlay.is_empty() {
        return copy;
    }

    let merged = params::merge(run_params(obj), overlay);
    set_spec_field(&mut copy.data, "params", json!(merged));
    copy
}

fn set_spec_field(data: &mut Value, field: &str, value: Value) {
    if !data.is_object() {
        *data = json!({});
    }
    let Some(root) = data.as_object_mut() else {
        return;
    };
    let spec = root.entry("spec").or_insert_with(|| json!({}));
    if !spec.is_object() {
        *spec = json!({});
    }
    if let Some(spec) = spec.as_object_mut() {
        spec.insert(field.to_string(), value);
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NameRef<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PipelineRunSpec<'a> {
    pipeline_ref: NameRef<'a>,
    #[serde(skip_serializing_if = "<[Param]>::is_empty")]
    params: &'a [Param],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskRunSpec<'a> {
    task_ref: NameRef<'a>,
    #[serde(skip_serializing_if = "<[Param]>::is_empty")]
    params: &'a [Param],
}

/// Builds a run object referencing the Pipeline or Task called `target`.
///
/// `kind` must be [`TektonKind::Pipeline`] or [`TektonKind::Task`]; the
/// returned object is a PipelineRun or TaskRun respectively.
pub fn new_run(
    kind: TektonKind,
    target: &str,
    namespace: &str,
    generate_name: String,
    params: &[Param],
) -> Result<DynamicObject, String> {
    let (run_kind, spec) = match kind {
        TektonKind::Pipeline => (
            TektonKind::PipelineRun,
            serde_json::to_value(PipelineRunSpec {
                pipeline_ref: NameRef { name: target },
                params,
            }),
        ),
        TektonKind::Task => (
            TektonKind::TaskRun,
            serde_json::to_value(TaskRunSpec {
                task_ref: NameRef { name: target },
                params,
            }),
        ),
        other => return Err(format!("{other} cannot be started")),
    };
    let spec = spec.map_err(|e| format!("Failed to encode {run_kind} spec: {e}"))?;

    Ok(DynamicObject {
        types: Some(run_kind.type_meta()),
        metadata: ObjectMeta {
            namespace: Some(namespace.to_string()),
            generate_name: Some(generate_name),
            ..Default::default()
        },
        data: json!({ "spec": spec }),
    })
}

/// Builds a fresh run from an existing PipelineRun or TaskRun.
///
/// The spec is copied with `spec.status` cleared (so a cancelled run starts
/// again). The original `generateName` is reused when present, otherwise
/// the new run is named after the original.
pub fn restart_run(kind: TektonKind, original: &DynamicObject, namespace: &str) -> DynamicObject {
    let mut spec = original.data.get("spec").cloned().unwrap_or_else(|| json!({}));
    if let Some(spec) = spec.as_object_mut() {
        spec.remove("status");
    }

    let generate_name = original
        .metadata
        .generate_name
        .clone()
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| format!("{}-", name_of(original)));

    DynamicObject {
        types: Some(kind.type_meta()),
        metadata: ObjectMeta {
            namespace: Some(namespace.to_string()),
            generate_name: Some(generate_name),
            ..Default::default()
        },
        data: json!({ "spec": spec }),
    }
}

/// Checks that a parsed definition is a `tekton.dev/v1` object of `kind`.
pub fn ensure_kind(obj: &DynamicObject, kind: TektonKind) -> Result<(), String> {
    let (api_version, found_kind) = obj
        .types
        .as_ref()
        .map(|t| (t.api_version.as_str(), t.kind.as_str()))
        .unwrap_or_default();

    if found_kind != kind.kind() || api_version != kind.api_version() {
        return Err(format!(
            "Content is not a valid Tekton {kind} (found apiVersion '{api_version}', kind '{found_kind}', expected '{}' '{}')",
            kind.api_version(),
            kind.kind()
        ));
    }
    Ok(())
}
