//! `create_*`, `update_*` and `patch_*` tools for Pipelines and Tasks.

use anyhow::{bail, Context, Result};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{parse_definition, require_name, Services};
use crate::tekton::{self, TektonKind};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateParams {
    #[schemars(description = "YAML or JSON definition of the resource")]
    pub yaml: String,

    #[schemars(
        description = "Namespace to create the resource in (default: the definition's namespace, else the server's default)"
    )]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateParams {
    #[schemars(description = "Name of the resource to update")]
    pub name: String,

    #[schemars(description = "Updated YAML or JSON definition of the resource")]
    pub yaml: String,

    #[schemars(description = "Namespace of the resource (default: the server's default namespace)")]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PatchParams {
    #[schemars(description = "Name of the resource to patch")]
    pub name: String,

    #[schemars(
        description = "RFC 6902 JSON patch to apply, e.g. [{\"op\": \"replace\", \"path\": \"/spec/description\", \"value\": \"new\"}]"
    )]
    pub patch: String,

    #[schemars(description = "Namespace of the resource (default: the server's default namespace)")]
    pub namespace: Option<String>,
}

/// Implementation of create_pipeline and create_task.
pub async fn create(svc: &Services, kind: TektonKind, p: CreateParams) -> Result<String> {
    if p.yaml.trim().is_empty() {
        bail!("YAML definition is required");
    }

    let mut obj = parse_definition(&p.yaml, kind)?;

    let namespace = match p.namespace.as_deref().filter(|ns| !ns.trim().is_empty()) {
        Some(ns) => ns.trim().to_string(),
        None => svc.namespace(obj.metadata.namespace.as_deref()),
    };
    obj.metadata.namespace = Some(namespace.clone());
    obj.metadata.resource_version = None;

    let created = svc
        .cluster
        .create(kind, &namespace, &obj)
        .await
        .with_context(|| {
            let name = obj
                .metadata
                .name
                .as_deref()
                .or(obj.metadata.generate_name.as_deref())
                .unwrap_or_default();
            format!("Error creating {kind} {namespace}/{name}")
        })?;

    Ok(format!(
        "{kind} '{}' created successfully in namespace '{namespace}'",
        tekton::name_of(&created)
    ))
}

/// Implementation of update_pipeline and update_task.
///
/// The replacement carries the live object's resourceVersion, so a
/// concurrent modification makes the update fail instead of being lost.
pub async fn update(svc: &Services, kind: TektonKind, p: UpdateParams) -> Result<String> {
    require_name(kind, &p.name)?;
    if p.yaml.trim().is_empty() {
        bail!("YAML definition is required");
    }
    let namespace = svc.namespace(p.namespace.as_deref());

    let mut obj = parse_definition(&p.yaml, kind)?;

    let existing = svc
        .cluster
        .get(kind, &namespace, &p.name)
        .await
        .with_context(|| format!("Error getting existing {kind} {namespace}/{}", p.name))?;

    obj.metadata.name = Some(p.name.clone());
    obj.metadata.namespace = Some(namespace.clone());
    obj.metadata.resource_version = existing.metadata.resource_version;

    let updated = svc
        .cluster
        .replace(kind, &namespace, &p.name, &obj)
        .await
        .with_context(|| format!("Error updating {kind} {namespace}/{}", p.name))?;

    Ok(format!(
        "{kind} '{}' updated successfully in namespace '{namespace}'",
        tekton::name_of(&updated)
    ))
}

/// Implementation of patch_pipeline and patch_task.
pub async fn patch(svc: &Services, kind: TektonKind, p: PatchParams) -> Result<String> {
    require_name(kind, &p.name)?;
    let namespace = svc.namespace(p.namespace.as_deref());

    let patch: Value = serde_json::from_str(&p.patch).context("Error parsing JSON patch")?;
    if !patch.is_array() {
        bail!("JSON patch must be an array of operations");
    }

    let patched = svc
        .cluster
        .json_patch(kind, &namespace, &p.name, &patch)
        .await
        .with_context(|| format!("Error patching {kind} {namespace}/{}", p.name))?;

    Ok(format!(
        "{kind} '{}' patched successfully in namespace '{namespace}'",
        tekton::name_of(&patched)
    ))
}
